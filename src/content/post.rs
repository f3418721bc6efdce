//! Post model

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::FrontMatter;

lazy_static! {
    /// `2024-01-15-hello-world` style file stems
    static ref DATE_PREFIX: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").unwrap();
}

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// URL identifier, unique within a snapshot
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date; undated posts sort after all dated ones
    pub date: Option<DateTime<FixedOffset>>,

    /// Post tags
    pub tags: Vec<String>,

    /// Cover image URL
    pub image: Option<String>,

    /// All front-matter fields, including the ones above
    pub metadata: FrontMatter,

    /// Raw markdown content
    pub raw_body: String,

    /// Rendered and sanitized HTML content
    pub rendered_html: String,

    /// Sanitized HTML shown in listings
    pub excerpt: String,

    /// Full source file path
    pub source_path: PathBuf,
}

impl Post {
    /// Last updated date, if the front matter has one
    pub fn updated(&self) -> Option<DateTime<FixedOffset>> {
        self.metadata.date("updated")
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            date: self.date,
            excerpt: self.excerpt.clone(),
            tags: self.tags.clone(),
            image: self.image.clone(),
        }
    }
}

/// Lightweight projection of a post used on index pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

/// Listing order: newest first, undated last, ties by slug ascending
pub fn listing_order(a: &Post, b: &Post) -> Ordering {
    let by_date = match (&a.date, &b.date) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.slug.cmp(&b.slug))
}

/// Split a `YYYY-MM-DD-` prefix off a file stem.
///
/// The prefix only counts when it is a real calendar date and something follows it.
pub fn split_date_prefix(stem: &str) -> (Option<DateTime<FixedOffset>>, &str) {
    let Some(caps) = DATE_PREFIX.captures(stem) else {
        return (None, stem);
    };

    let date = (|| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        let noon = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(12, 0, 0)?;
        Some(Utc.from_utc_datetime(&noon).fixed_offset())
    })();

    match (date, caps.get(4)) {
        (Some(date), Some(rest)) => (Some(date), rest.as_str()),
        _ => (None, stem),
    }
}

/// File stem without extension or date prefix
pub fn display_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    split_date_prefix(&stem).1.to_string()
}

/// Derive the URL slug for a post.
///
/// An explicit front-matter slug wins; otherwise the file stem (minus any date prefix)
/// is used. Both go through `slug::slugify`: lowercase ASCII, every run of
/// non-alphanumeric characters collapsed to a single `-`, no leading or trailing `-`.
/// Returns `None` when nothing usable is left.
pub fn derive_slug(explicit: Option<&str>, path: &Path) -> Option<String> {
    let base = match explicit {
        Some(s) => s.to_string(),
        None => display_stem(path),
    };
    let slug = slug::slugify(base);
    (!slug.is_empty()).then_some(slug)
}
