//! Utility functions for common operations.
//!
//! This module provides reusable string helpers shared across the pipeline:
//!
//! - **Slugification**: the normalizing transform used both for stored
//!   filenames and for duplicate detection
//! - **Percent-decoding**: lossy decoding of percent-encoded slugs

mod slug;

pub use slug::{percent_decode, slugify};
