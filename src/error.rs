//! Error taxonomy for the content pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::content::FrontMatterError;

/// Errors produced while loading, listing and resolving content
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("malformed front matter in `{}`", path.display())]
    MalformedFrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("IO error when reading `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a slug for `{}`", path.display())]
    UnusableSlug { path: PathBuf },

    #[error("slug `{slug}` of `{}` is already taken", path.display())]
    DuplicateSlug { slug: String, path: PathBuf },

    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error("invalid page number: {0}")]
    InvalidPageNumber(i64),

    #[error("asset path rejected: {0}")]
    PathTraversalRejected(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("posts root `{}` is unavailable", path.display())]
    RepositoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BlogError {
    /// Whether the error only concerns a single post file.
    ///
    /// File-level errors exclude that file from a scan and never abort it.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            BlogError::MalformedFrontMatter { .. }
                | BlogError::Io { .. }
                | BlogError::UnusableSlug { .. }
                | BlogError::DuplicateSlug { .. }
        )
    }

    /// The error message followed by each of its sources, `: `-separated
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }

    /// Whether the caller asked for something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BlogError::PostNotFound(_) | BlogError::AssetNotFound(_)
        )
    }
}

pub type Result<T, E = BlogError> = std::result::Result<T, E>;
