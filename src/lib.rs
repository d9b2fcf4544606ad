//! Migrates a WordPress WXR export into a directory of markdown files with
//! YAML front-matter, suitable as the content source of a static site.
//!
//! The pipeline runs in [`migrator::run`]: the export is loaded from a local
//! path or URL, parsed, attachment images are optionally imported, and each
//! post or page is converted to markdown and written under the content
//! source directory.

pub mod assets;
pub mod config;
pub mod content;
pub mod feed;
pub mod migrator;
pub mod storage;
pub mod util;

pub use config::Config;
pub use migrator::{run, MigrateError, MigrationOptions, MigrationSummary};
