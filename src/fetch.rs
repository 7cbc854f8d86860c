//! Byte-fetching collaborator.
//!
//! The parser and repository only need "bytes for a URL, or a typed
//! failure"; everything about how those bytes are obtained lives behind
//! [`FeedFetcher`]. [`HttpFetcher`] is the production implementation.

use async_trait::async_trait;
use futures::StreamExt;
use url::Url;

use crate::error::FeedError;

/// Default cap on response body size (10 MiB).
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024;

/// Asynchronously fetches the raw bytes for a resource identifier.
///
/// Implementations must translate any response outside the 200–299 range
/// into [`FeedError::Network`] before handing bytes onward.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FeedError>;
}

/// HTTP implementation of [`FeedFetcher`] backed by a shared
/// [`reqwest::Client`].
///
/// The client is injected so callers can configure pooling, TLS, and
/// timeouts once and share the client across fetchers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_size: usize,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_size: MAX_FEED_SIZE,
        }
    }

    /// Overrides the response body size cap.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FeedError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FeedError::network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "feed fetch failed");
            return Err(FeedError::network_status(
                "bad server response",
                status.as_u16(),
            ));
        }

        read_limited_bytes(response, self.max_size).await
    }
}

/// Reads a response body while enforcing a size limit.
///
/// Checks the Content-Length header first, then counts streamed chunks so
/// a lying or absent header still cannot exhaust memory.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FeedError::InvalidData {
                reason: format!("response exceeds {limit} bytes"),
            });
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FeedError::network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::InvalidData {
                reason: format!("response exceeds {limit} bytes"),
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_server_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn feed_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/feed.xml", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = mock_server_with(
            ResponseTemplate::new(200)
                .set_body_string("<rss/>")
                .insert_header("Content-Type", "application/xml"),
        )
        .await;

        let fetcher = HttpFetcher::default();
        let bytes = fetcher.fetch(&feed_url(&server)).await.unwrap();
        assert_eq!(bytes, b"<rss/>");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_network_error_with_status() {
        let server = mock_server_with(ResponseTemplate::new(404)).await;

        let fetcher = HttpFetcher::default();
        let err = fetcher.fetch(&feed_url(&server)).await.unwrap_err();
        match err {
            FeedError::Network { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("expected Network, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_5xx_is_network_error_with_status() {
        let server = mock_server_with(ResponseTemplate::new(503)).await;

        let fetcher = HttpFetcher::default();
        let err = fetcher.fetch(&feed_url(&server)).await.unwrap_err();
        assert!(matches!(
            err,
            FeedError::Network {
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_error_has_no_status() {
        // Nothing listens on this port.
        let url = Url::parse("http://127.0.0.1:1/feed.xml").unwrap();
        let fetcher = HttpFetcher::default();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FeedError::Network { status: None, .. }));
    }

    #[tokio::test]
    async fn test_fetch_oversized_body_rejected() {
        let body = "x".repeat(4096);
        let server = mock_server_with(ResponseTemplate::new(200).set_body_string(body)).await;

        let fetcher = HttpFetcher::default().with_max_size(1024);
        let err = fetcher.fetch(&feed_url(&server)).await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidData { .. }));
    }
}
