//! Content conversion: HTML bodies into final markdown text.
//!
//! - [`markdown`] - The HTML→markdown converter seam ([`MarkupConverter`])
//! - [`transform`] - Excerpt-marker splitting, paragraph preservation and
//!   line-ending normalization around that seam

pub mod markdown;
pub mod transform;

pub use markdown::{Html2md, MarkupConverter};
pub use transform::{render_content, MORE_MARKER};
