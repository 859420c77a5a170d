// Monitoring server HTTP client
//
// Wraps `reqwest::Client` with URL construction against the API root and
// status-aware response decoding. Endpoint methods live in `devices.rs`
// as inherent methods so this module stays focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, WireId, WriteAck};
use crate::transport::TransportConfig;

/// Raw HTTP client for the monitoring server's REST API.
///
/// `base_url` is the API root, e.g. `http://127.0.0.1:5000/api`; every
/// endpoint path is appended to it. Non-2xx responses surface as
/// [`Error::Api`] carrying the server's `error` message when present.
#[derive(Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DashboardClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Parse `base_url` and wrap a pre-built client. Mostly for tests.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self::with_client(http, Url::parse(base_url)?))
    }

    /// The API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    /// Build `{base}/devices/{id}[/{action}]`. The id is one
    /// percent-encoded path segment, so `/`, `?` and `#` in text ids stay
    /// inside it.
    pub(crate) fn device_url(&self, id: &WireId, action: Option<&str>) -> Result<Url, Error> {
        let segment = id.to_string();
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(Error::InvalidId { id: segment });
        }

        let mut url = self.api_url("devices")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().push(&segment);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        Self::parse_response(resp).await
    }

    /// POST a write; any 2xx body is an acknowledgement.
    pub(crate) async fn post_ack(&self, url: Url, body: &impl Serialize) -> Result<WriteAck, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        Ok(WriteAck::from_body(&Self::success_body(resp).await?))
    }

    /// POST with no request body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await?;
        Self::parse_response(resp).await
    }

    pub(crate) async fn put_ack(&self, url: Url, body: &impl Serialize) -> Result<WriteAck, Error> {
        debug!("PUT {}", url);
        let resp = self.http.put(url).json(body).send().await?;
        Ok(WriteAck::from_body(&Self::success_body(resp).await?))
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await?;
        Self::parse_response(resp).await
    }

    /// Decode a 2xx body as `T`.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = Self::success_body(resp).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Read the body of a 2xx response, or turn a failure status into
    /// [`Error::Api`] with the body's `error` field.
    async fn success_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty());
            debug!(status = status.as_u16(), ?message, "request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}
