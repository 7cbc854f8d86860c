//! Feed parsing: the streaming tag walk and the per-item builder.
//!
//! [`parser`] drives a streaming walk over the feed bytes and dispatches
//! events to one [`builder`] accumulator per item. Item-level problems
//! (missing link, unparsable enclosure attributes, unrecognized dates) are
//! dropped or defaulted; only structural problems fail the parse.

mod builder;
mod parser;

pub use parser::FeedParser;
