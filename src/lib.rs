//! Async RSS feed parsing with a size- and time-bounded in-memory cache.
//!
//! `rill` ingests RSS-style XML from a remote or local byte source, converts
//! it into a normalized item model, and serves it through a cache that
//! bounds both memory use and staleness.
//!
//! # Architecture
//!
//! Data flows one way: fetcher → parser → builder → item list → cache ↔
//! repository → caller.
//!
//! - [`feed::FeedParser`]: streaming tag walk over the feed bytes; malformed
//!   individual items are dropped, structural problems fail the parse
//! - [`cache::FeedCache`]: URL to item-list store with approximate size
//!   accounting, lazy expiration, and least-recently-captured eviction
//! - [`repository::FeedRepository`]: composes fetch, parse, cache, and
//!   optional per-item filtering into one read path
//! - [`fetch::FeedFetcher`]: the byte-fetching seam; [`fetch::HttpFetcher`]
//!   is the reqwest-backed implementation
//! - [`error::FeedError`]: the closed failure taxonomy shared by all of the
//!   above
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rill::{Config, FeedCache, FeedParser, FeedRepository, HttpFetcher};
//!
//! # async fn run() -> Result<(), rill::FeedError> {
//! let config = Config::default();
//! let repo = FeedRepository::new(
//!     Arc::new(HttpFetcher::default()),
//!     FeedParser::new(config.parser),
//!     FeedCache::new(config.cache),
//! );
//!
//! let url = url::Url::parse("https://example.com/feed.xml").unwrap();
//! let items = repo.fetch(&url).await?;
//! let recent = repo
//!     .fetch_filtered(&url, |item| !item.categories.is_empty())
//!     .await?;
//! # let _ = (items, recent);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod item;
pub mod repository;

pub use cache::{CacheStats, FeedCache};
pub use config::{CacheConfig, Config, ConfigError, ParserConfig};
pub use error::FeedError;
pub use feed::FeedParser;
pub use fetch::{FeedFetcher, HttpFetcher};
pub use item::{Enclosure, Item};
pub use repository::FeedRepository;
