//! Error taxonomy for the feed pipeline.
//!
//! Every failure the fetch/parse/cache path can produce is one of the
//! [`FeedError`] variants below. Each variant carries a stable numeric code
//! for log correlation plus enough structured context (`metadata()`) to be
//! logged without string-parsing the message.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Boxed error cause carried by the wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while fetching, parsing, or serving a feed.
///
/// The set is closed: callers can match exhaustively and rely on the codes
/// staying stable across releases.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The byte stream handed to the parser was zero length.
    #[error("feed input is empty")]
    EmptyInput,

    /// A string could not be parsed as a feed or item URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure (transport error or non-2xx response).
    #[error("network error{}: {source}", fmt_status(.status))]
    Network {
        source: BoxError,
        /// HTTP status code, when a response was received at all.
        status: Option<u16>,
    },

    /// The underlying XML walk reported a structural error.
    #[error("parse error: {source}")]
    Parse { source: BoxError },

    /// The data was readable but unusable for the stated reason.
    #[error("invalid data: {reason}")]
    InvalidData { reason: String },

    /// A field required to construct an item was missing or empty.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// A publish date matched none of the configured patterns.
    #[error("could not parse date {value:?} using {} formats", .attempted.len())]
    InvalidDate {
        value: String,
        attempted: Vec<String>,
    },

    /// The operation exceeded the configured parse timeout.
    #[error("timed out after {elapsed:.1?}")]
    Timeout { elapsed: Duration },

    /// The input was recognizably a different syndication format.
    #[error("unsupported feed format: {detected}")]
    UnsupportedFormat { detected: String },

    /// The walk completed cleanly but produced zero items.
    ///
    /// Distinct from [`FeedError::EmptyInput`]: something was sent, it just
    /// contained no usable items.
    #[error("feed contains no items")]
    EmptyFeed,
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

impl FeedError {
    /// Wraps an underlying cause as a [`FeedError::Parse`].
    pub fn parse(source: impl Into<BoxError>) -> Self {
        FeedError::Parse {
            source: source.into(),
        }
    }

    /// Wraps an underlying cause as a [`FeedError::Network`] without a status.
    pub fn network(source: impl Into<BoxError>) -> Self {
        FeedError::Network {
            source: source.into(),
            status: None,
        }
    }

    /// Wraps an underlying cause as a [`FeedError::Network`] with a status code.
    pub fn network_status(source: impl Into<BoxError>, status: u16) -> Self {
        FeedError::Network {
            source: source.into(),
            status: Some(status),
        }
    }

    /// Stable numeric code for this error, for telemetry correlation.
    pub fn code(&self) -> u16 {
        match self {
            FeedError::EmptyInput => 1001,
            FeedError::InvalidUrl(_) => 1002,
            FeedError::Network { .. } => 1003,
            FeedError::Parse { .. } => 1004,
            FeedError::InvalidData { .. } => 1005,
            FeedError::MissingField { .. } => 1006,
            FeedError::InvalidDate { .. } => 1007,
            FeedError::Timeout { .. } => 1008,
            FeedError::UnsupportedFormat { .. } => 1009,
            FeedError::EmptyFeed => 1010,
        }
    }

    /// Why the operation failed, independent of the specific input.
    pub fn failure_reason(&self) -> &'static str {
        match self {
            FeedError::EmptyInput => "The provided input contains no bytes",
            FeedError::InvalidUrl(_) => "The URL format is not valid",
            FeedError::Network { .. } => "Failed to fetch data from the network",
            FeedError::Parse { .. } => "Failed to parse the feed content",
            FeedError::InvalidData { .. } => "The data format is not valid",
            FeedError::MissingField { .. } => "A required field is missing from the feed",
            FeedError::InvalidDate { .. } => "The date format in the feed is not recognized",
            FeedError::Timeout { .. } => "The operation took too long",
            FeedError::UnsupportedFormat { .. } => "The feed format is not supported",
            FeedError::EmptyFeed => "The feed contains no items",
        }
    }

    /// A suggestion for recovering from the error.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FeedError::EmptyInput => "Ensure the feed source returns content",
            FeedError::InvalidUrl(_) => "Check the URL format and try again",
            FeedError::Network { .. } => "Check the connection and try again",
            FeedError::Parse { .. } => "Verify that the source contains valid RSS markup",
            FeedError::InvalidData { .. } => "Ensure the feed follows the RSS specification",
            FeedError::MissingField { .. } => "Ensure all required fields are present in the feed",
            FeedError::InvalidDate { .. } => "Ensure the feed uses standard date formats",
            FeedError::Timeout { .. } => "Try a smaller feed or raise the configured timeout",
            FeedError::UnsupportedFormat { .. } => "Provide an RSS formatted feed",
            FeedError::EmptyFeed => "Verify the feed source publishes items",
        }
    }

    /// Key/value context for structured logging.
    ///
    /// Always contains `error_code` and `error_type`; variant-specific keys
    /// carry the offending value, status code, or underlying cause.
    pub fn metadata(&self) -> HashMap<&'static str, String> {
        let mut meta = HashMap::new();
        meta.insert("error_code", self.code().to_string());
        meta.insert("error_type", variant_name(self).to_string());

        match self {
            FeedError::InvalidUrl(url) => {
                meta.insert("url", url.clone());
            }
            FeedError::Network { source, status } => {
                meta.insert("underlying_error", source.to_string());
                if let Some(code) = status {
                    meta.insert("status_code", code.to_string());
                }
            }
            FeedError::Parse { source } => {
                meta.insert("underlying_error", source.to_string());
            }
            FeedError::InvalidData { reason } => {
                meta.insert("reason", reason.clone());
            }
            FeedError::MissingField { field } => {
                meta.insert("field", (*field).to_string());
            }
            FeedError::InvalidDate { value, attempted } => {
                meta.insert("date_string", value.clone());
                meta.insert("attempted_formats", attempted.join(", "));
            }
            FeedError::Timeout { elapsed } => {
                meta.insert("duration_ms", elapsed.as_millis().to_string());
            }
            FeedError::UnsupportedFormat { detected } => {
                meta.insert("format", detected.clone());
            }
            FeedError::EmptyInput | FeedError::EmptyFeed => {}
        }

        meta
    }
}

fn variant_name(error: &FeedError) -> &'static str {
    match error {
        FeedError::EmptyInput => "empty_input",
        FeedError::InvalidUrl(_) => "invalid_url",
        FeedError::Network { .. } => "network",
        FeedError::Parse { .. } => "parse",
        FeedError::InvalidData { .. } => "invalid_data",
        FeedError::MissingField { .. } => "missing_field",
        FeedError::InvalidDate { .. } => "invalid_date",
        FeedError::Timeout { .. } => "timeout",
        FeedError::UnsupportedFormat { .. } => "unsupported_format",
        FeedError::EmptyFeed => "empty_feed",
    }
}

/// Equality for the wrapping variants compares only the rendered description
/// of the underlying cause, not structural identity. Two independently
/// constructed errors wrapping equal-looking causes compare equal. This is a
/// documented simplification.
impl PartialEq for FeedError {
    fn eq(&self, other: &Self) -> bool {
        use FeedError::*;
        match (self, other) {
            (EmptyInput, EmptyInput) | (EmptyFeed, EmptyFeed) => true,
            (InvalidUrl(a), InvalidUrl(b)) => a == b,
            (Network { source: a, .. }, Network { source: b, .. }) => {
                a.to_string() == b.to_string()
            }
            (Parse { source: a }, Parse { source: b }) => a.to_string() == b.to_string(),
            (InvalidData { reason: a }, InvalidData { reason: b }) => a == b,
            (MissingField { field: a }, MissingField { field: b }) => a == b,
            (
                InvalidDate {
                    value: a,
                    attempted: fa,
                },
                InvalidDate {
                    value: b,
                    attempted: fb,
                },
            ) => a == b && fa == fb,
            (Timeout { elapsed: a }, Timeout { elapsed: b }) => a == b,
            (UnsupportedFormat { detected: a }, UnsupportedFormat { detected: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for FeedError {}
