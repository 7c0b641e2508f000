//! HTTP transport for the GeoNames search service.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::GeonamesConfig;
use crate::error::AppError;

/// Maximum number of candidates requested per search.
pub const MAX_ROWS: &str = "1";

/// A search service that returns raw response bodies.
///
/// The resolver caches bodies verbatim, so implementations must not
/// interpret them.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search for `query` and return the response body.
    async fn search(&self, query: &str) -> Result<String, AppError>;
}

/// reqwest-based client for `GET {api_url}/searchJSON`.
#[derive(Debug, Clone)]
pub struct GeonamesClient {
    http: Client,
    search_url: String,
    account: String,
}

impl GeonamesClient {
    /// Build a client with the configured endpoint, account and timeout.
    pub fn new(config: &GeonamesConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("alto-geonames/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            http,
            search_url: config.search_url(),
            account: config.account.clone(),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl SearchBackend for GeonamesClient {
    async fn search(&self, query: &str) -> Result<String, AppError> {
        let transport = |source: reqwest::Error| AppError::LookupTransportFailure {
            label: query.to_string(),
            source,
        };

        tracing::debug!(query = %query, url = %self.search_url, "GeoNames search");

        let response = self
            .http
            .get(&self.search_url)
            .query(&[
                ("q", query),
                ("maxRows", MAX_ROWS),
                ("username", self.account.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;

        let bytes = response.bytes().await.map_err(transport)?;
        let body = String::from_utf8(bytes.to_vec()).map_err(|e| {
            AppError::LookupResponseMalformed {
                label: query.to_string(),
                message: format!("not UTF-8: {}", e),
            }
        })?;
        tracing::trace!(query = %query, bytes = body.len(), "GeoNames response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_endpoint() {
        let config = GeonamesConfig {
            account: "demo".to_string(),
            api_url: "http://localhost:9999/".to_string(),
            timeout_secs: 5,
        };
        let client = GeonamesClient::new(&config).unwrap();
        assert_eq!(client.search_url(), "http://localhost:9999/searchJSON");
    }
}
