//! Clap derive structures for the `netpulse` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netpulse -- live network device monitoring from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "netpulse",
    version,
    about = "Monitor network devices from the command line",
    long_about = "Keeps a live view of a monitored device fleet in sync with a\n\
        netpulse server: push updates over WebSocket, on-demand refreshes\n\
        over HTTP, and device management commands.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 's', env = "NETPULSE_SERVER", global = true)]
    pub server: Option<String>,

    /// Server base URL (overrides the profile URL)
    #[arg(long, short = 'u', env = "NETPULSE_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETPULSE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NETPULSE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides the profile)
    #[arg(long, env = "NETPULSE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage monitored devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show fleet status counts
    Stats,

    /// Follow live device, stats, and alert updates
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Show full details for one device
    Get {
        /// Device ID or IP address
        device: String,
    },

    /// Register a new device
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Management IP address
        #[arg(long)]
        ip: String,

        /// Device type (router, switch, access_point, ...)
        #[arg(long = "type", default_value = "router")]
        device_type: String,

        /// SNMP community string
        #[arg(long)]
        community: Option<String>,

        /// SNMP version
        #[arg(long)]
        snmp_version: Option<String>,
    },

    /// Change fields of an existing device
    Update {
        /// Device ID or IP address
        device: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        ip: Option<String>,

        #[arg(long = "type")]
        device_type: Option<String>,

        #[arg(long)]
        community: Option<String>,

        #[arg(long)]
        snmp_version: Option<String>,
    },

    /// Delete a device
    #[command(alias = "rm")]
    Delete {
        /// Device ID or IP address
        device: String,
    },

    /// Ask the server to probe a device over SNMP
    Test {
        /// Device ID or IP address
        device: String,
    },

    /// Show stored metric history for a device
    Metrics {
        /// Device ID or IP address
        device: String,

        /// Look-back window in hours (server default: 24)
        #[arg(long)]
        hours: Option<u32>,

        /// Only this metric type (e.g. cpu_usage)
        #[arg(long = "type")]
        metric_type: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Connect without joining live monitoring
    #[arg(long)]
    pub no_auto_refresh: bool,

    /// Also pull the full device list every N seconds
    #[arg(long)]
    pub interval: Option<u64>,

    /// Stop after this long (e.g. "90s", "5m")
    #[arg(long = "for", value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active server profile
    Set {
        /// Profile key (url, api_path, push_path, ca_cert, insecure, timeout,
        /// auto_refresh, refresh_interval)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured servers
    Servers,

    /// Set the default server
    Use {
        /// Server profile name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
