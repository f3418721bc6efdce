//! Front-matter parsing
//!
//! A post may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello World
//! date: 2024-01-15 10:30:00
//! tags: [rust, blog]
//! ---
//! Body text.
//! ```
//!
//! The block may also be closed with `...`. Without an opening `---` line the whole file is
//! body text.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

/// Keys whose values are read as dates when they parse as one
const DATE_KEYS: &[&str] = &["date", "updated"];

/// Reasons a front-matter block cannot be used
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter block is never closed")]
    Unterminated,

    #[error("front matter is not valid YAML")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("front matter key must be a scalar, got `{0}`")]
    InvalidKey(String),

    #[error("front matter field `{key}` must be {expected}")]
    InvalidField { key: String, expected: &'static str },
}

/// A single front-matter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    Date(DateTime<FixedOffset>),
    List(Vec<String>),
}

/// Front-matter data from a post, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, MetaValue>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        match split_block(content)? {
            Some((block, body)) => Ok((Self::parse_yaml(block)?, body)),
            None => Ok((FrontMatter::default(), content)),
        }
    }

    fn parse_yaml(block: &str) -> Result<Self, FrontMatterError> {
        if block.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let mapping = match serde_yaml::from_str::<Value>(block)? {
            Value::Null => return Ok(FrontMatter::default()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(FrontMatterError::NotAMapping),
        };

        let mut fields = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = scalar_text(&key).ok_or_else(|| FrontMatterError::InvalidKey(yaml_text(&key)))?;
            if let Some(value) = convert_value(&key, value) {
                fields.insert(key, value);
            }
        }

        Ok(Self { fields })
    }

    /// Serialize back into a front-matter block followed by `body`.
    ///
    /// Dates are written as RFC 3339, so `parse(to_source(body))` yields the same fields.
    pub fn to_source(&self, body: &str) -> Result<String, FrontMatterError> {
        let yaml = if self.fields.is_empty() {
            String::new()
        } else {
            let plain: IndexMap<&str, Value> = self
                .fields
                .iter()
                .map(|(key, value)| (key.as_str(), to_yaml(value)))
                .collect();
            serde_yaml::to_string(&plain)?
        };

        Ok(format!("---\n{yaml}---\n{body}"))
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    /// Text value of `key`; lists and dates are not text
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(MetaValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Date value of `key`, if it parsed as a date
    pub fn date(&self, key: &str) -> Option<DateTime<FixedOffset>> {
        match self.fields.get(key) {
            Some(MetaValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Handles both a single string and a list of strings
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(MetaValue::List(items)) => items.clone(),
            Some(MetaValue::Text(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) -> Option<MetaValue> {
        self.fields.insert(key.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, MetaValue)> for FrontMatter {
    fn from_iter<I: IntoIterator<Item = (String, MetaValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Locate the YAML block and the body that follows it.
///
/// Returns `None` when the first line is not an opening `---`.
fn split_block(content: &str) -> Result<Option<(&str, &str)>, FrontMatterError> {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_end() != "---" {
        return Ok(None);
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        let end = offset + line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Ok(Some((&content[block_start..offset], &content[end..])));
        }
        offset = end;
    }

    Err(FrontMatterError::Unterminated)
}

fn convert_value(key: &str, value: Value) -> Option<MetaValue> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            if DATE_KEYS.contains(&key) {
                if let Some(date) = parse_date_string(&s) {
                    return Some(MetaValue::Date(date));
                }
            }
            Some(MetaValue::Text(s))
        }
        Value::Bool(_) | Value::Number(_) => scalar_text(&value).map(MetaValue::Text),
        Value::Sequence(items) => Some(MetaValue::List(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| scalar_text(item).unwrap_or_else(|| yaml_text(item)))
                .collect(),
        )),
        Value::Mapping(_) => Some(MetaValue::Text(yaml_text(&value))),
        Value::Tagged(tagged) => convert_value(key, tagged.value),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn yaml_text(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

fn to_yaml(value: &MetaValue) -> Value {
    match value {
        MetaValue::Text(s) => Value::String(s.clone()),
        MetaValue::Date(d) => Value::String(d.to_rfc3339()),
        MetaValue::List(items) => {
            Value::Sequence(items.iter().cloned().map(Value::String).collect())
        }
    }
}

/// Parse a date string in various formats.
///
/// Values without an offset are taken as UTC; date-only values land on noon UTC so
/// they stay on the same calendar day in most timezones.
pub fn parse_date_string(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let offset_formats = [
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let naive_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt).fixed_offset());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(12, 0, 0)?;
            return Some(Utc.from_utc_datetime(&dt).fixed_offset());
        }
    }

    None
}
