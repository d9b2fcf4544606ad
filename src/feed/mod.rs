//! Feed acquisition and parsing for WordPress eXtended RSS (WXR) exports.
//!
//! This module covers the front half of the migration pipeline:
//!
//! - [`loader`] - Obtain raw feed bytes from a local path or a remote URL
//! - [`parser`] - Parse WXR XML into the typed [`FeedItem`]/[`FeedCategory`] model
//! - [`categories`] - Reconstruct root-to-leaf category paths from the flat
//!   parent-link declarations
//!
//! Downstream components never re-inspect raw XML: all optional-field
//! defaulting happens in the parser, and everything after it works on the
//! typed model.

pub mod categories;
pub mod loader;
pub mod parser;

pub use categories::CategoryResolver;
pub use loader::{load_source, SourceError};
pub use parser::{
    parse_wxr, CommentStatus, FeedCategory, FeedError, FeedItem, ItemStatus, ItemType, WxrFeed,
};
