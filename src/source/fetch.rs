use super::FetchError;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Reader service that renders a URL as Markdown
pub const DEFAULT_FETCH_ENDPOINT: &str = "https://r.jina.ai";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Retrieves web pages as text through a reader service
pub struct PageFetcher {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(endpoint, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reader URL for `url`: the target is appended verbatim to the endpoint
    pub fn request_url(&self, url: &str) -> Result<String, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FetchError::EmptyUrl);
        }
        Ok(format!("{}/{}", self.endpoint.trim_end_matches('/'), url))
    }

    /// Fetch the page at `url` and return the reader's text rendition
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_url = self.request_url(url)?;
        info!(url = url.trim(), "Fetching page");

        let response = self.http.get(&request_url).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(url = url.trim(), status = status.as_u16(), "Page fetch failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text()?;
        info!(url = url.trim(), bytes = text.len(), "Fetched page");
        Ok(text)
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}
