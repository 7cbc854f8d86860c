//! Parser and cache configuration.
//!
//! Configuration is immutable once constructed. A config file is optional:
//! a missing file yields `Config::default()`, and any subset of keys can be
//! specified; missing keys fall back to their defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

/// Date format patterns tried in order when parsing item publish dates.
///
/// Covers the RFC-822-style timestamps RSS feeds actually publish plus
/// ISO-8601/RFC-3339 variants. Patterns without zone information are parsed
/// naive and read as UTC.
pub const DEFAULT_DATE_FORMATS: [&str; 6] = [
    // Two-digit year first: %Y would read "24" literally as the year 24.
    "%a, %d %b %y %H:%M:%S %z",  // RFC 822 with a two-digit year
    "%a, %d %b %Y %H:%M:%S %z",  // RFC 822: "Mon, 18 Nov 2024 10:30:00 +0000"
    "%a, %d %b %Y %H:%M:%S GMT", // RFC 822 with a literal GMT zone
    "%+",                        // ISO 8601 / RFC 3339, with offset or Z
    "%Y-%m-%dT%H:%M:%S%.f",      // ISO 8601 without zone information
    "%d %b %Y %H:%M:%S %z",      // RFC 822 without the weekday
];

/// Feed parser configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Initial capacity of the XML event buffer, in bytes.
    pub buffer_size: usize,

    /// Budget for a URL-sourced parse, in seconds. Enforced at the fetch
    /// suspension point; advisory for the synchronous byte walk.
    pub parse_timeout_secs: u64,

    /// Date format patterns tried in listed order against publish dates.
    pub date_formats: Vec<String>,

    /// Reserved. Parsing is currently always permissive.
    pub strict_parsing: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            parse_timeout_secs: 30,
            date_formats: DEFAULT_DATE_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            strict_parsing: false,
        }
    }
}

impl ParserConfig {
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_timeout_secs)
    }
}

/// Feed cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum total approximate size of all cached entries, in bytes.
    pub max_size_bytes: usize,

    /// Minutes after capture at which an entry expires.
    pub expiration_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 50 * 1024 * 1024,
            expiration_minutes: 30,
        }
    }
}

impl CacheConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_minutes * 60)
    }
}

/// Top-level configuration: a parser section and a cache section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to flag probable typos at the top level
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !["parser", "cache"].contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
