//! Per-item accumulator used during a parse pass.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use url::Url;

use crate::error::FeedError;
use crate::item::{Enclosure, Item};

/// Mutable accumulator for a single item's fields.
///
/// Parse events may arrive in any order and may repeat, so the link and
/// publish date are kept as raw strings until [`ItemBuilder::finalize`].
#[derive(Debug, Default)]
pub(crate) struct ItemBuilder {
    pub(crate) guid: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) link: String,
    pub(crate) pub_date: String,
    pub(crate) author: String,
    pub(crate) categories: Vec<String>,
    pub(crate) content: Option<String>,
    pub(crate) enclosure: Option<Enclosure>,
}

impl ItemBuilder {
    /// Finalizes the accumulated fields into an immutable [`Item`].
    ///
    /// The identifier is the explicit guid when non-empty, falling back to
    /// the raw link string. Returns an error when the identifier or title is
    /// empty, or when the link does not parse; the caller drops the item and
    /// keeps going (one bad item never aborts a feed). An unrecognized
    /// publish date is not an error: the current time is substituted.
    pub(crate) fn finalize(self, date_formats: &[String]) -> Result<Item, FeedError> {
        let id = if self.guid.is_empty() {
            self.link.clone()
        } else {
            self.guid
        };

        if id.is_empty() {
            return Err(FeedError::MissingField { field: "guid" });
        }
        if self.title.is_empty() {
            return Err(FeedError::MissingField { field: "title" });
        }

        let link =
            Url::parse(&self.link).map_err(|_| FeedError::InvalidUrl(self.link.clone()))?;

        let published = match parse_date(&self.pub_date, date_formats) {
            Ok(date) => date,
            Err(err) => {
                if !self.pub_date.trim().is_empty() {
                    tracing::debug!(error = %err, "unrecognized publish date, using current time");
                }
                Utc::now()
            }
        };

        Ok(Item {
            id,
            title: self.title,
            description: self.description,
            link,
            published,
            author: none_if_blank(self.author),
            categories: self.categories,
            content: self.content.and_then(none_if_blank),
            enclosure: self.enclosure,
        })
    }
}

fn none_if_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Tries each configured pattern in order against the raw date string.
///
/// Patterns are attempted first as zone-aware timestamps, then as naive ones
/// read as UTC (for patterns like a literal `GMT` suffix that carry no
/// parseable offset). The first successful parse wins.
pub(crate) fn parse_date(raw: &str, formats: &[String]) -> Result<DateTime<Utc>, FeedError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FeedError::InvalidDate {
            value: String::new(),
            attempted: formats.to_vec(),
        });
    }

    for format in formats {
        if let Ok(date) = DateTime::parse_from_str(raw, format) {
            return Ok(date.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(FeedError::InvalidDate {
        value: raw.to_string(),
        attempted: formats.to_vec(),
    })
}
