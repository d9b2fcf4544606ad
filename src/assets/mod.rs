//! Image asset import and link rewriting for attachment items.
//!
//! Attachments are fetched in a dedicated pass that fully populates the
//! URL→local-path index before any content rewriting begins, so rewrites
//! never race an in-flight import.

mod images;

pub use images::{ImageAsset, ImageError, ImageImporter, ImportImages};
