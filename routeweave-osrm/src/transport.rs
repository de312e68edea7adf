//! Pluggable transport used to reach the OSRM server.
//!
//! The client never talks HTTP directly: it hands request paths to a
//! [`Transport`], which lets tests substitute an in-process double and lets
//! hosts wrap the default [`HttpTransport`] with their own middleware.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{ClientConfig, ProviderBuildError, TransportError};

/// Issues GET requests against the routing server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `path` (relative to the server root) and return the body.
    ///
    /// Non-success HTTP statuses must be reported as
    /// [`TransportError::Http`] carrying the status and body, so callers can
    /// tell rejected input (400) from service failures.
    async fn get(&self, path: &str) -> Result<Arc<[u8]>, TransportError>;
}

/// `reqwest`-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from the connection settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ProviderBuildError> {
        Url::parse(&config.base_url).map_err(|source| ProviderBuildError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout: config.timeout,
        })
    }

    /// Join `path` onto the base URL without re-escaping it.
    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Convert a reqwest error to a `TransportError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            };
        }

        TransportError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Arc<[u8]>, TransportError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        Ok(Arc::from(body.as_ref()))
    }
}
