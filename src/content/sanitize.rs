//! HTML sanitization for rendered posts
//!
//! Post bodies may come from untrusted contributors, so everything that leaves the
//! markdown renderer passes through a fixed allow-list before it is stored or served.

use ammonia::Builder;
use std::collections::{HashMap, HashSet};

/// Tags kept as-is. Anything else is unwrapped (children kept).
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "dd", "del", "div", "dl", "dt", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "kbd",
    "li", "mark", "ol", "p", "pre", "q", "s", "samp", "small", "span", "strike", "strong", "sub",
    "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

/// Tags dropped together with their content
const REMOVED_WITH_CONTENT: &[&str] = &["script", "style"];

const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn tag_attributes() -> HashMap<&'static str, HashSet<&'static str>> {
    let mut attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    attributes.insert("a", ["href", "title"].into());
    attributes.insert(
        "img",
        ["src", "alt", "title", "width", "height", "loading"].into(),
    );
    for tag in ["code", "pre", "span", "sup"] {
        attributes.insert(tag, ["class"].into());
    }
    attributes.insert("div", ["class", "id"].into());
    for tag in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        attributes.insert(tag, ["id"].into());
    }
    for tag in ["td", "th"] {
        attributes.insert(tag, ["align"].into());
    }
    attributes
}

/// Allow-list HTML sanitizer
pub struct Sanitizer {
    builder: Builder<'static>,
}

impl Sanitizer {
    pub fn new() -> Self {
        let mut builder = Builder::default();
        builder
            .tags(ALLOWED_TAGS.iter().copied().collect())
            .clean_content_tags(REMOVED_WITH_CONTENT.iter().copied().collect())
            .generic_attributes(["lang", "title"].into())
            .tag_attributes(tag_attributes())
            .url_schemes(ALLOWED_URL_SCHEMES.iter().copied().collect())
            .link_rel(Some("noopener noreferrer"))
            .strip_comments(true);
        Self { builder }
    }

    /// Strip disallowed tags and attributes.
    ///
    /// `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}
