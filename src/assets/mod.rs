//! Asset resolver - maps request paths to files under the assets root
//!
//! Resolution is lexical first: a path that would climb above the root is rejected
//! before anything on disk is looked at. The surviving path is then canonicalized, so
//! a symlink pointing outside the root is rejected as well.

use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{BlogError, Result};

/// Resolves URL paths to regular files inside a fixed root directory
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    /// Create a resolver rooted at `root`, which must exist
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::other(format!("{:?} is not a directory", root)));
        }
        Ok(Self { root })
    }

    /// Canonical assets root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a percent-encoded request path.
    ///
    /// Both `/` and `\` separate segments. Empty and `.` segments are dropped; `..` pops
    /// one segment and fails with [`BlogError::PathTraversalRejected`] at the root.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf> {
        let rejected = || BlogError::PathTraversalRejected(request_path.to_string());

        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| rejected())?;
        if decoded.contains('\0') {
            return Err(rejected());
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop().ok_or_else(rejected)?;
                }
                s => segments.push(s),
            }
        }

        let not_found = || BlogError::AssetNotFound(request_path.to_string());
        if segments.is_empty() {
            return Err(not_found());
        }

        let joined: PathBuf = segments.iter().fold(self.root.clone(), |p, s| p.join(s));
        let canonical = joined.canonicalize().map_err(|_| not_found())?;

        if !canonical.starts_with(&self.root) {
            tracing::warn!("Asset {:?} escapes the assets root", request_path);
            return Err(rejected());
        }
        if !canonical.is_file() {
            return Err(not_found());
        }

        Ok(canonical)
    }
}
