//! Web-search link builder.
//!
//! Embeds the query into a search-engine URL, checks it with one GET and
//! hands back the link. Every outcome, including transport failure, is a
//! reply string.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::AppError;

/// Placeholder substituted in the URL template.
pub const QUERY_PLACEHOLDER: &str = "{query}";

#[derive(Debug, Clone)]
pub struct SearchHandler {
    client: Client,
    url_template: String,
}

impl SearchHandler {
    pub fn new(url_template: impl Into<String>, timeout_seconds: u64) -> Result<Self, AppError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(timeout_seconds));
        if cfg!(test) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("failed to build search HTTP client: {e}")))?;
        Ok(Self::with_client(url_template, client))
    }

    /// Use a caller-built client (custom proxy or TLS settings).
    pub fn with_client(url_template: impl Into<String>, client: Client) -> Self {
        Self { client, url_template: url_template.into() }
    }

    /// URL for `query`, percent-encoded into the template.
    pub fn search_url(&self, query: &str) -> String {
        self.url_template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
    }

    /// Perform the GET and describe the outcome.
    pub async fn search(&self, query: &str) -> String {
        let url = self.search_url(query);
        debug!(%url, "search request");

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => {
                format!("Here is a link to the search results: {url}")
            }
            Ok(resp) => {
                warn!(status = %resp.status(), %url, "search returned non-200");
                "Failed to fetch search results. Please try again.".to_string()
            }
            Err(e) => {
                warn!(error = %e, %url, "search request failed");
                format!("Error while performing the search: {e}")
            }
        }
    }
}
