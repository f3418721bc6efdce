//! Helper functions for rendering pages
//!
//! Small, pure building blocks shared by the content pipeline and the
//! HTTP views: escaping, excerpts, URLs and date formatting.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
