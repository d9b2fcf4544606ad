use thiserror::Error;

/// Where a record is filed, derived from the item's type and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Post,
    Page,
    Draft,
}

/// The assembled output unit: one normalized post/page per eligible feed
/// item, handed to the store exactly once.
#[derive(Debug, Clone)]
pub struct PostRecord {
    /// Final title; untitled items get a synthetic one before assembly.
    pub title: String,
    /// WordPress post ID.
    pub id: u64,
    /// Source-format timestamp, passed through verbatim.
    pub date: String,
    /// Final markdown body.
    pub content: String,
    pub layout: Layout,
    /// Original `wp:post_name`, percent-encoding retained. The store
    /// decodes it only when deriving the filename.
    pub slug: Option<String>,
    /// Tag names, posts only.
    pub tags: Vec<String>,
    /// Root-first category paths, posts only.
    pub categories: Vec<Vec<String>>,
    /// `Some(false)` only when comments were explicitly closed.
    pub comments: Option<bool>,
    /// Original link pathname, when alias generation is enabled.
    pub alias: Option<String>,
}

/// Errors surfaced by the persistence collaborator.
///
/// Always recoverable at the run level: the assembler logs, counts and
/// moves on to the next record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record's title and slug both normalize to nothing usable.
    #[error("Cannot derive a filename for post id {0}")]
    UnnamableRecord(u64),
}
