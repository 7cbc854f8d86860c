//! Streaming feed parser.
//!
//! Drives a tag-level walk over the input bytes and dispatches events to a
//! per-item [`ItemBuilder`](super::builder::ItemBuilder). Malformed
//! individual items are dropped; only a structurally broken stream, empty
//! input, or an item-free document fails the parse as a whole.

use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};
use quick_xml::Reader;
use url::Url;

use crate::config::ParserConfig;
use crate::error::FeedError;
use crate::feed::builder::ItemBuilder;
use crate::fetch::FeedFetcher;
use crate::item::{Enclosure, Item};

/// Recognized feed tag vocabulary. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Item,
    Title,
    Description,
    Link,
    Guid,
    PubDate,
    Author,
    Category,
    Content,
    Enclosure,
}

impl Tag {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name.to_ascii_lowercase().as_slice() {
            b"item" => Some(Tag::Item),
            b"title" => Some(Tag::Title),
            b"description" => Some(Tag::Description),
            b"link" => Some(Tag::Link),
            b"guid" => Some(Tag::Guid),
            b"pubdate" => Some(Tag::PubDate),
            b"author" => Some(Tag::Author),
            b"category" => Some(Tag::Category),
            b"content:encoded" => Some(Tag::Content),
            b"enclosure" => Some(Tag::Enclosure),
            _ => None,
        }
    }
}

/// Streaming RSS parser.
///
/// Each parse invocation owns its builder state and output list, so one
/// parser can serve concurrent invocations over independent inputs without
/// synchronization.
#[derive(Debug, Clone)]
pub struct FeedParser {
    config: ParserConfig,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl FeedParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a byte stream into the ordered list of items it contains.
    ///
    /// # Errors
    ///
    /// - [`FeedError::EmptyInput`]: the input is zero length
    /// - [`FeedError::UnsupportedFormat`]: the root element is not RSS
    /// - [`FeedError::Parse`]: the tag walk reported a structural error
    /// - [`FeedError::EmptyFeed`]: the walk completed but found no items
    pub fn parse(&self, data: &[u8]) -> Result<Vec<Item>, FeedError> {
        let started = std::time::Instant::now();

        if data.is_empty() {
            return Err(FeedError::EmptyInput);
        }

        let mut reader = Reader::from_reader(data);
        let mut buf = Vec::with_capacity(self.config.buffer_size);
        let mut walk = Walk::new(&self.config.date_formats);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => walk.on_start(e, &reader)?,
                Ok(Event::Empty(ref e)) => walk.on_empty(e, &reader),
                Ok(Event::Text(ref t)) => walk.on_text(t)?,
                Ok(Event::CData(ref t)) => walk.on_cdata(t, &reader)?,
                Ok(Event::End(ref e)) => walk.on_end(e.name().as_ref()),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(FeedError::parse(e)),
            }
            buf.clear();
        }

        let Walk { items, dropped, .. } = walk;
        if items.is_empty() {
            return Err(FeedError::EmptyFeed);
        }

        tracing::debug!(
            items = items.len(),
            dropped = dropped,
            bytes = data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "parsed feed"
        );

        Ok(items)
    }

    /// Fetches a feed through the given collaborator and parses the bytes.
    ///
    /// The fetch, the only suspension point, runs under the configured
    /// parse timeout; fetch and parse errors propagate unchanged.
    pub async fn parse_url(
        &self,
        fetcher: &dyn FeedFetcher,
        url: &Url,
    ) -> Result<Vec<Item>, FeedError> {
        let started = std::time::Instant::now();

        let bytes = tokio::time::timeout(self.config.parse_timeout(), fetcher.fetch(url))
            .await
            .map_err(|_| FeedError::Timeout {
                elapsed: started.elapsed(),
            })??;

        tracing::debug!(url = %url, bytes = bytes.len(), "fetched feed");
        self.parse(&bytes)
    }
}

/// State for one walk over one input: outside-item vs. inside-item, the live
/// builder, and the per-element text buffer.
struct Walk<'a> {
    date_formats: &'a [String],
    in_item: bool,
    builder: Option<ItemBuilder>,
    text: String,
    items: Vec<Item>,
    dropped: usize,
    root_seen: bool,
}

impl<'a> Walk<'a> {
    fn new(date_formats: &'a [String]) -> Self {
        Self {
            date_formats,
            in_item: false,
            builder: None,
            text: String::new(),
            items: Vec::new(),
            dropped: 0,
            root_seen: false,
        }
    }

    fn on_start(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<(), FeedError> {
        if !self.root_seen {
            self.root_seen = true;
            // An Atom document would otherwise walk cleanly and report an
            // item-free feed; name the actual problem instead.
            if e.name().as_ref().eq_ignore_ascii_case(b"feed") {
                return Err(FeedError::UnsupportedFormat {
                    detected: "atom".to_string(),
                });
            }
        }

        match Tag::from_name(e.name().as_ref()) {
            Some(Tag::Item) if !self.in_item => {
                self.in_item = true;
                self.builder = Some(ItemBuilder::default());
            }
            Some(Tag::Enclosure) if self.in_item => self.read_enclosure(e, reader),
            _ => {}
        }

        self.text.clear();
        Ok(())
    }

    // Self-closing tags: only the enclosure form carries data in attributes.
    fn on_empty(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) {
        if self.in_item && Tag::from_name(e.name().as_ref()) == Some(Tag::Enclosure) {
            self.read_enclosure(e, reader);
        }
    }

    fn on_text(&mut self, t: &BytesText<'_>) -> Result<(), FeedError> {
        if self.in_item {
            self.text.push_str(&t.unescape().map_err(FeedError::parse)?);
        }
        Ok(())
    }

    fn on_cdata(&mut self, t: &BytesCData<'_>, reader: &Reader<&[u8]>) -> Result<(), FeedError> {
        if self.in_item {
            let decoded = reader.decoder().decode(t).map_err(FeedError::parse)?;
            self.text.push_str(&decoded);
        }
        Ok(())
    }

    fn on_end(&mut self, name: &[u8]) {
        let tag = Tag::from_name(name);

        if tag == Some(Tag::Item) {
            if let Some(builder) = self.builder.take() {
                match builder.finalize(self.date_formats) {
                    Ok(item) => self.items.push(item),
                    Err(err) => {
                        self.dropped += 1;
                        tracing::debug!(error = %err, "dropping malformed item");
                    }
                }
            }
            self.in_item = false;
            return;
        }

        if !self.in_item {
            return;
        }

        let content = self.text.trim().to_string();
        if let (Some(tag), Some(builder)) = (tag, self.builder.as_mut()) {
            match tag {
                Tag::Title => builder.title = content,
                Tag::Description => builder.description = content,
                Tag::Link => builder.link = content,
                Tag::Guid => builder.guid = content,
                Tag::PubDate => builder.pub_date = content,
                Tag::Author => builder.author = content,
                Tag::Category => {
                    // Category tags accumulate, they never overwrite.
                    if !content.is_empty() {
                        builder.categories.push(content);
                    }
                }
                Tag::Content => {
                    builder.content = if content.is_empty() {
                        None
                    } else {
                        Some(content)
                    }
                }
                Tag::Item | Tag::Enclosure => {}
            }
        }
        self.text.clear();
    }

    /// Constructs an enclosure only when the url, type, and an
    /// integer-parseable length are all present and valid; otherwise the tag
    /// is ignored and the item keeps parsing.
    fn read_enclosure(&mut self, e: &BytesStart<'_>, reader: &Reader<&[u8]>) {
        let decoder = reader.decoder();
        let mut url = None;
        let mut mime_type = None;
        let mut length = None;

        for attr in e.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed enclosure attribute");
                    continue;
                }
            };
            let value = match attr.decode_and_unescape_value(decoder) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecodable enclosure attribute");
                    continue;
                }
            };
            match attr.key.as_ref() {
                b"url" => url = Url::parse(&value).ok(),
                b"type" => mime_type = Some(value.into_owned()),
                b"length" => length = value.trim().parse::<u64>().ok(),
                _ => {}
            }
        }

        if let (Some(url), Some(mime_type), Some(length), Some(builder)) =
            (url, mime_type, length, self.builder.as_mut())
        {
            builder.enclosure = Some(Enclosure {
                url,
                mime_type,
                length,
            });
        }
    }
}
