// netpulse-api: Async client for the netpulse monitoring server (REST + push channel)

pub mod client;
pub mod devices;
pub mod error;
pub mod frames;
pub mod models;
pub mod push;
pub mod transport;

pub use client::DashboardClient;
pub use error::Error;
pub use frames::{ClientSignal, ServerFrame};
pub use push::{ChannelEvent, PushChannel, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig};
