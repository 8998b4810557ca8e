//! HTTP transport — the low-level request mechanism beneath the gateway.
//!
//! A thin blocking reqwest client. Returns a [`TransportReply`] for any
//! response that arrived, whatever the status; `GatewayError::Network` is
//! reserved for failures where no response arrived at all (DNS, refused
//! connection, timeout). All policy lives above, in the gateway.

use std::time::Duration;

use tillpoint_core::config::ApiConfig;
use tillpoint_core::errors::{GatewayError, TillpointError, TillpointResult};
use tillpoint_core::models::{HttpMethod, RequestRecord, TransportReply};
use tillpoint_core::traits::ITransport;

/// Blocking HTTP client bound to one API base URL.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from config. The per-request timeout is applied to
    /// every call, so a hung request cannot block its caller indefinitely.
    pub fn new(config: &ApiConfig) -> TillpointResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TillpointError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl ITransport for HttpTransport {
    fn send(&self, request: &RequestRecord) -> TillpointResult<TransportReply> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url_for(&request.path));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| GatewayError::Network {
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let text = response.text().map_err(|e| GatewayError::Network {
            reason: format!("failed to read response body: {e}"),
        })?;

        // A non-JSON or empty body is not an error; the gateway decides what
        // an absent payload means for the call at hand.
        let body = serde_json::from_str(&text).ok();

        Ok(TransportReply { status, body })
    }
}
