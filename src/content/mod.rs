//! Content module - handles posts, front matter, rendering and the post repository

mod frontmatter;
pub mod listing;
pub mod loader;
mod markdown;
mod post;
pub mod repository;
mod sanitize;

pub use frontmatter::{parse_date_string, FrontMatter, FrontMatterError, MetaValue};
pub use listing::{paginate, recent, Page};
pub use loader::PostLoader;
pub use markdown::MarkdownRenderer;
pub use post::{derive_slug, listing_order, Post, PostSummary};
pub use repository::{FileFailure, HealthStatus, PostRepository, Snapshot};
pub use sanitize::Sanitizer;
