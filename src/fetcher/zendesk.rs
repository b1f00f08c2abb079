//! Zendesk HTTP client
//!
//! Issues authenticated GET requests against the incremental export and
//! ticket comment endpoints:
//! - `GET {base_url}/exports/tickets.json?start_time={cursor}`
//! - `GET {base_url}/tickets/{id}/comments.json`

use async_trait::async_trait;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ZendeskConfig;
use crate::fetcher::{ApiResponse, ExportSource, FetcherError, FetcherResult};
use crate::metrics::HttpRequestMetrics;
use crate::Cursor;

/// Incremental ticket export endpoint
pub const EXPORT_ENDPOINT: &str = "/exports/tickets.json";

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Overall request timeout (seconds); export pages can hold 1000 tickets
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Authenticated Zendesk API client
pub struct ZendeskClient {
    client: Arc<Client>,
    config: ZendeskConfig,
}

impl ZendeskClient {
    /// Create a client with its own connection pool and default timeouts
    pub fn new(config: ZendeskConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("zendesk-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetcherError::ClientError(e.to_string()))?;

        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Create a client on top of an existing `reqwest::Client`
    pub fn with_client(client: Arc<Client>, config: ZendeskConfig) -> Self {
        Self { client, config }
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Fetch one page of the incremental ticket export.
    ///
    /// Returns the raw response whatever its status.
    pub async fn fetch_page(&self, cursor: Cursor) -> FetcherResult<ApiResponse> {
        let url = format!("{}{}", self.config.base_url(), EXPORT_ENDPOINT);
        self.get(&url, EXPORT_ENDPOINT, &[("start_time", cursor.to_string())])
            .await
    }

    /// Fetch the comments of one ticket. Not used by the export loop.
    pub async fn fetch_comments(&self, ticket_id: u64) -> FetcherResult<ApiResponse> {
        let url = format!(
            "{}/tickets/{}/comments.json",
            self.config.base_url(),
            ticket_id
        );
        self.get(&url, "/tickets/{id}/comments.json", &[]).await
    }

    async fn get(
        &self,
        url: &str,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> FetcherResult<ApiResponse> {
        debug!(url = %url, params = ?params, "Sending GET request");
        let metrics = HttpRequestMetrics::start(endpoint);

        let response = self
            .client
            .get(url)
            .query(params)
            .header(ACCEPT, "application/json")
            .basic_auth(self.config.username(), Some(self.config.token()))
            .send()
            .await
            .map_err(|e| {
                metrics.record_network_error();
                FetcherError::NetworkError(e.to_string())
            })?;

        let status = response.status().as_u16();
        metrics.record_complete(status);

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("Failed to read body: {e}")))?;

        debug!(status, body_len = body.len(), "Received response");

        Ok(ApiResponse {
            status,
            retry_after,
            body,
        })
    }
}

#[async_trait]
impl ExportSource for ZendeskClient {
    async fn fetch_page(&self, cursor: Cursor) -> FetcherResult<ApiResponse> {
        ZendeskClient::fetch_page(self, cursor).await
    }
}
