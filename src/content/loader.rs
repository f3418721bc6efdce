//! Content loader - discovers and parses post files under the posts root
//!
//! Scanning is a plain function from a root directory to an ordered batch of
//! per-file results. Deciding what a failed file means for the listing is left to
//! [`Snapshot::build`](super::Snapshot::build).

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::{DirEntry, WalkDir};

use super::post::{derive_slug, display_stem, split_date_prefix};
use super::{FrontMatter, FrontMatterError, MarkdownRenderer, MetaValue, Post, Sanitizer};
use crate::error::{BlogError, Result};
use crate::helpers::{first_paragraph, html_escape, normalize_image_url};

/// Extensions recognised as markdown posts (compared case-insensitively)
pub const POST_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkdn"];

/// Front-matter keys that may carry a cover image, in priority order
const IMAGE_KEYS: &[&str] = &["image", "img", "cover", "thumbnail"];

/// Every file of one scan, in path order, with its parse outcome
pub struct ScanBatch {
    pub results: Vec<(PathBuf, Result<Post>)>,
    pub fingerprint: u64,
}

/// Turns post files into [`Post`] values: front matter, markdown, sanitization
pub struct PostLoader {
    renderer: MarkdownRenderer,
    sanitizer: Sanitizer,
    assets_prefix: String,
}

impl PostLoader {
    /// Create a new content loader
    pub fn new(highlight: bool, assets_prefix: impl Into<String>) -> Self {
        Self {
            renderer: MarkdownRenderer::with_highlighting(highlight),
            sanitizer: Sanitizer::new(),
            assets_prefix: assets_prefix.into(),
        }
    }

    /// Discover and load every post under `root`
    pub fn scan(&self, root: &Path) -> Result<ScanBatch> {
        let files = discover(root)?;
        let fingerprint = fingerprint(root, &files);
        Ok(self.load_batch(files, fingerprint))
    }

    /// Load already-discovered files
    pub fn load_batch(&self, files: Vec<PathBuf>, fingerprint: u64) -> ScanBatch {
        let results = files
            .into_iter()
            .map(|path| {
                let result = self.load_post(&path);
                (path, result)
            })
            .collect();

        ScanBatch {
            results,
            fingerprint,
        }
    }

    /// Load a single post from a file
    pub fn load_post(&self, path: &Path) -> Result<Post> {
        let content = fs::read_to_string(path).map_err(|source| BlogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_post(path, &content)
    }

    /// Build a post from file content; `path` only feeds slug, title and date fallbacks
    pub fn parse_post(&self, path: &Path, content: &str) -> Result<Post> {
        let malformed = |source: FrontMatterError| BlogError::MalformedFrontMatter {
            path: path.to_path_buf(),
            source,
        };

        let (fm, body) = FrontMatter::parse(content).map_err(malformed)?;

        let title = match fm.get("title") {
            Some(MetaValue::Text(title)) if !title.trim().is_empty() => title.trim().to_string(),
            Some(MetaValue::Text(_)) | None => display_stem(path),
            Some(_) => return Err(malformed(invalid_field("title", "a string"))),
        };

        let explicit_slug = match fm.get("slug") {
            Some(MetaValue::Text(slug)) => Some(slug.as_str()),
            None => None,
            Some(_) => return Err(malformed(invalid_field("slug", "a string"))),
        };
        let slug = derive_slug(explicit_slug, path).ok_or_else(|| BlogError::UnusableSlug {
            path: path.to_path_buf(),
        })?;

        let date = match fm.get("date") {
            Some(MetaValue::Date(date)) => Some(*date),
            Some(MetaValue::Text(raw)) => {
                tracing::warn!("Unparseable date {:?} in {:?}, listing it last", raw, path);
                None
            }
            Some(MetaValue::List(_)) => return Err(malformed(invalid_field("date", "a date"))),
            None => {
                let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
                split_date_prefix(&stem).0
            }
        };

        let image = IMAGE_KEYS
            .iter()
            .find_map(|key| fm.text(key))
            .filter(|image| !image.trim().is_empty())
            .map(|image| normalize_image_url(image, &self.assets_prefix));

        let rendered_html = self.sanitizer.clean(&self.renderer.render(body));
        let excerpt = match fm.text("excerpt") {
            Some(excerpt) => self
                .sanitizer
                .clean(&format!("<p>{}</p>", html_escape(excerpt.trim()))),
            None => first_paragraph(&rendered_html).to_string(),
        };

        tracing::debug!("Loaded post {} from {:?}", slug, path);

        Ok(Post {
            slug,
            title,
            date,
            tags: fm.list("tags"),
            image,
            raw_body: body.to_string(),
            rendered_html,
            excerpt,
            source_path: path.to_path_buf(),
            metadata: fm,
        })
    }
}

fn invalid_field(key: &str, expected: &'static str) -> FrontMatterError {
    FrontMatterError::InvalidField {
        key: key.to_string(),
        expected,
    }
}

/// Collect post files under `root`, sorted by path.
///
/// Hidden files and directories are skipped. An unreadable root is an error;
/// unreadable entries below it are logged and skipped.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    let unavailable = |source: std::io::Error| BlogError::RepositoryUnavailable {
        path: root.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(root).map_err(unavailable)?;
    if !metadata.is_dir() {
        return Err(unavailable(std::io::Error::other("not a directory")));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(unavailable(e.into())),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_markdown_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Hash of every file's relative path, size and modification time.
///
/// Equal fingerprints mean a rescan would read the same files.
pub fn fingerprint(root: &Path, files: &[PathBuf]) -> u64 {
    let mut hasher = DefaultHasher::new();

    for path in files {
        let Ok(metadata) = fs::metadata(path) else {
            continue;
        };
        path.strip_prefix(root).unwrap_or(path).hash(&mut hasher);
        metadata.len().hash(&mut hasher);
        metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .hash(&mut hasher);
    }

    hasher.finish()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| POST_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
