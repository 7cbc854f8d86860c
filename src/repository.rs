//! Read path composing fetch, parse, cache, and filtering.

use std::sync::Arc;
use url::Url;

use crate::cache::FeedCache;
use crate::error::FeedError;
use crate::feed::FeedParser;
use crate::fetch::FeedFetcher;
use crate::item::Item;

/// Fetches feeds through the cache.
///
/// A live cached entry short-circuits the network and parse work entirely.
/// On a miss the full unfiltered parse result is cached, then any filter is
/// applied; filtering never affects what gets stored. Fetch and parse
/// failures propagate unchanged and never populate the cache.
pub struct FeedRepository {
    fetcher: Arc<dyn FeedFetcher>,
    parser: FeedParser,
    cache: FeedCache,
}

impl FeedRepository {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, parser: FeedParser, cache: FeedCache) -> Self {
        Self {
            fetcher,
            parser,
            cache,
        }
    }

    /// Returns all items for `url`, from cache when live, fetching and
    /// parsing otherwise.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<Item>, FeedError> {
        self.load(url).await
    }

    /// Like [`FeedRepository::fetch`], applying `predicate` to the result.
    ///
    /// The predicate runs only after a full list exists (fresh or cached),
    /// never during parsing, and the cache always holds the unfiltered list.
    pub async fn fetch_filtered<P>(&self, url: &Url, predicate: P) -> Result<Vec<Item>, FeedError>
    where
        P: Fn(&Item) -> bool,
    {
        let items = self.load(url).await?;
        Ok(items.into_iter().filter(|item| predicate(item)).collect())
    }

    /// Drops the cached entry for `url`, if any.
    pub async fn invalidate(&self, url: &Url) {
        self.cache.remove(url).await;
    }

    /// Drops every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.clear().await;
    }

    async fn load(&self, url: &Url) -> Result<Vec<Item>, FeedError> {
        if let Some(items) = self.cache.get(url).await {
            tracing::debug!(url = %url, count = items.len(), "returning cached items");
            return Ok(items);
        }

        let items = self.parser.parse_url(self.fetcher.as_ref(), url).await?;
        self.cache.set(url.clone(), items.clone()).await;
        tracing::info!(url = %url, count = items.len(), "fetched and cached feed");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, ParserConfig};
    use crate::fetch::HttpFetcher;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><guid>1234</guid><title>Test Title 1</title><link>https://example.com/1</link></item>
    <item><guid>5678</guid><title>Test Title 2</title><link>https://example.com/2</link></item>
</channel></rss>"#;

    fn repository() -> FeedRepository {
        FeedRepository::new(
            Arc::new(HttpFetcher::default()),
            FeedParser::new(ParserConfig::default()),
            FeedCache::new(CacheConfig::default()),
        )
    }

    fn feed_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/feed.xml", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_and_returns_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&server)
            .await;

        let items = repository().fetch(&feed_url(&server)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1234");
        assert_eq!(items[1].id, "5678");
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(1) // the second fetch must not hit the network
            .mount(&server)
            .await;

        let repo = repository();
        let url = feed_url(&server);
        let first = repo.fetch(&url).await.unwrap();
        let second = repo.fetch(&url).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_filter_applies_after_cache_stores_full_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(1)
            .mount(&server)
            .await;

        let repo = repository();
        let url = feed_url(&server);

        let filtered = repo
            .fetch_filtered(&url, |item| item.id == "5678")
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "5678");

        // The cache holds the unfiltered list.
        let all = repo.fetch(&url).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&server)
            .await;

        let repo = repository();
        let url = feed_url(&server);

        let err = repo.fetch(&url).await.unwrap_err();
        assert!(matches!(
            err,
            FeedError::Network {
                status: Some(500),
                ..
            }
        ));

        // The failure was not cached: the retry reaches the healthy mock.
        let items = repo.fetch(&url).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_propagates_and_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss><channel></item>"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&server)
            .await;

        let repo = repository();
        let url = feed_url(&server);

        assert!(matches!(
            repo.fetch(&url).await.unwrap_err(),
            FeedError::Parse { .. }
        ));

        let items = repo.fetch(&url).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(2)
            .mount(&server)
            .await;

        let repo = repository();
        let url = feed_url(&server);

        repo.fetch(&url).await.unwrap();
        repo.invalidate(&url).await;
        repo.fetch(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_refetch_of_every_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(2)
            .mount(&server)
            .await;

        let repo = repository();
        let url_a = Url::parse(&format!("{}/a.xml", server.uri())).unwrap();
        let url_b = Url::parse(&format!("{}/b.xml", server.uri())).unwrap();

        repo.fetch(&url_a).await.unwrap();
        repo.fetch(&url_b).await.unwrap();
        repo.invalidate_all().await;
        repo.fetch(&url_a).await.unwrap();
        repo.fetch(&url_b).await.unwrap();
    }
}
