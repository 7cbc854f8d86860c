//! Normalized feed item model.

use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};
use url::Url;

/// A single normalized feed item.
///
/// Items are immutable once built: the builder is the only production code
/// path that constructs one, and every field is set exactly once there.
/// Equality and hashing cover the identifying fields only (id, title, link,
/// publish timestamp).
#[derive(Debug, Clone)]
pub struct Item {
    /// Unique identifier: the feed's explicit guid, falling back to the link.
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: Url,
    pub published: DateTime<Utc>,
    pub author: Option<String>,
    /// Category labels in document order; duplicates are preserved.
    pub categories: Vec<String>,
    /// Extended content body (`content:encoded`), absent when empty.
    pub content: Option<String>,
    pub enclosure: Option<Enclosure>,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.link == other.link
            && self.published == other.published
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.title.hash(state);
        self.link.hash(state);
        self.published.hash(state);
    }
}

/// A media attachment reference on an item.
///
/// All fields are mandatory; markup missing any of them never produces a
/// partial enclosure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Enclosure {
    pub url: Url,
    /// MIME type as declared by the feed (e.g. `audio/mpeg`).
    pub mime_type: String,
    /// Declared size in bytes.
    pub length: u64,
}
