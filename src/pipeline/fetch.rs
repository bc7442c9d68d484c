//! Page fetching: one HTTP GET per page, every fault turned into data.
//!
//! A fetch never returns `Err`. Timeouts, DNS failures, non-2xx statuses and
//! truncated bodies all become [`FetchOutcome::Failure`] so the scheduler can
//! count them against the consecutive-failure budget. There is no retry here:
//! the scheduler simply moves on to the next index.

use crate::error::{FetchError, Pages2PdfError};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Result of fetching a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw image bytes.
    Success(Vec<u8>),
    /// Why the page could not be fetched.
    Failure(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

/// Anything that can turn a page URL into image bytes.
///
/// The scheduler is generic over this trait so tests can script outcomes
/// per index without a network.
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, which addresses page `page`.
    fn fetch_page(&self, page: u32, url: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self, Pages2PdfError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Pages2PdfError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    async fn try_fetch(&self, page: u32, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(page, e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                page,
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(page, e))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody { page });
        }
        Ok(bytes.to_vec())
    }

    fn classify(&self, page: u32, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                page,
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Transport {
                page,
                detail: e.to_string(),
            }
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, page: u32, url: &str) -> FetchOutcome {
        match self.try_fetch(page, url).await {
            Ok(bytes) => {
                debug!("Fetched page {} ({} bytes)", page, bytes.len());
                FetchOutcome::Success(bytes)
            }
            Err(e) => {
                debug!("Fetch failed: {}", e);
                FetchOutcome::Failure(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page_0001.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG fake".to_vec()))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5).unwrap();
        let url = format!("{}/page_0001.png", server.uri());
        let outcome = fetcher.fetch_page(1, &url).await;
        assert_eq!(outcome, FetchOutcome::Success(b"\x89PNG fake".to_vec()));
    }

    #[tokio::test]
    async fn not_found_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5).unwrap();
        let url = format!("{}/page_0002.png", server.uri());
        let outcome = fetcher.fetch_page(2, &url).await;
        assert_eq!(
            outcome,
            FetchOutcome::Failure(FetchError::HttpStatus { page: 2, status: 404 })
        );
    }

    #[tokio::test]
    async fn empty_body_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5).unwrap();
        let url = format!("{}/page_0003.png", server.uri());
        let outcome = fetcher.fetch_page(3, &url).await;
        assert_eq!(outcome, FetchOutcome::Failure(FetchError::EmptyBody { page: 3 }));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1u8; 8])
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(1).unwrap();
        let url = format!("{}/page_0004.png", server.uri());
        let outcome = fetcher.fetch_page(4, &url).await;
        assert_eq!(
            outcome,
            FetchOutcome::Failure(FetchError::Timeout { page: 4, secs: 1 })
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_failure() {
        let fetcher = HttpFetcher::new(2).unwrap();
        // Port 9 (discard) on localhost is closed on test machines.
        let outcome = fetcher.fetch_page(5, "http://127.0.0.1:9/page_0005.png").await;
        assert!(!outcome.is_success());
    }
}
