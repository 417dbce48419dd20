//! JSON-over-HTTP transport to the relying party
//!
//! The orchestrator only needs "post this JSON, give me the JSON reply"; the
//! [`CeremonyTransport`] trait is that seam. [`HttpTransport`] implements it
//! with a shared `reqwest` client whose cookie store carries the relying
//! party's session from `start` to `finish`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use super::errors::CeremonyError;
use super::types::Endpoint;
use crate::settings::ServerSettings;
use crate::utils::logging::LoggingHelper;

/// Posts ceremony payloads and returns the parsed reply body
#[async_trait]
pub trait CeremonyTransport: Send + Sync {
    /// POST `body` as JSON to `endpoint`
    ///
    /// The reply is parsed as JSON whatever its HTTP status.
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::TransportFailure`] if the request cannot be
    /// sent or the reply is not JSON.
    async fn post_json(&self, endpoint: Endpoint, body: &Value) -> Result<Value, CeremonyError>;
}

/// `reqwest` based transport
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    urls: HashMap<Endpoint, Url>,
}

impl HttpTransport {
    /// Build a transport for the configured server
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::TransportFailure`] if the base URL or an
    /// endpoint path is invalid, or the HTTP client cannot be built.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, CeremonyError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(seconds) = settings.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build()?;
        Self::with_client(client, settings)
    }

    /// Build a transport around an existing client (shared connection pool)
    ///
    /// The relying party keeps the ceremony state in a session cookie set by
    /// `start` and read back by `finish`, so `client` must be built with
    /// `cookie_store(true)` or a cookie provider of its own.
    ///
    /// # Errors
    ///
    /// Returns [`CeremonyError::TransportFailure`] if an endpoint URL is invalid.
    pub fn with_client(
        client: reqwest::Client,
        settings: &ServerSettings,
    ) -> Result<Self, CeremonyError> {
        let base = settings
            .base_url()
            .map_err(|e| CeremonyError::TransportFailure(format!("Invalid server URL: {e}")))?;

        let mut urls = HashMap::with_capacity(Endpoint::ALL.len());
        for endpoint in Endpoint::ALL {
            let path = settings.path_for(endpoint);
            let url = base.join(path.trim_start_matches('/')).map_err(|e| {
                CeremonyError::TransportFailure(format!("Invalid path {path} for {endpoint}: {e}"))
            })?;
            urls.insert(endpoint, url);
        }

        Ok(Self { client, urls })
    }

    /// Resolved URL of an endpoint
    #[must_use]
    pub fn url_for(&self, endpoint: Endpoint) -> Option<&Url> {
        self.urls.get(&endpoint)
    }
}

#[async_trait]
impl CeremonyTransport for HttpTransport {
    async fn post_json(&self, endpoint: Endpoint, body: &Value) -> Result<Value, CeremonyError> {
        let url = self.urls.get(&endpoint).ok_or_else(|| {
            CeremonyError::TransportFailure(format!("No URL configured for {endpoint}"))
        })?;

        LoggingHelper::log_request(endpoint, url);

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        LoggingHelper::log_response(endpoint, status.as_u16(), bytes.len());

        Ok(serde_json::from_slice(&bytes)?)
    }
}
