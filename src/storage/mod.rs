//! Persistence of assembled records as markdown files with front matter.
//!
//! The rest of the pipeline only sees the [`PostStore`] trait; [`FileStore`]
//! is the on-disk implementation that derives filenames from titles/slugs
//! and lays posts, drafts and pages out under the content source directory.

mod front_matter;
mod store;
mod types;

pub use store::{FileStore, PostStore};
pub use types::{Layout, PostRecord, StoreError};
