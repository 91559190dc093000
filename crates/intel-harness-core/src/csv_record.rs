//! CSV line parsing for forum-post import.
//!
//! One line holds one post, in column order:
//!
//! ```text
//! url, title, author_username, content, category, comments, number_comments, date
//! ```
//!
//! `comments` is a JSON array embedded in a quoted field with its quotes
//! doubled. Exports in the wild are inconsistent, so parsing is tolerant:
//! the comments sub-field is repaired (falling back to an empty array),
//! `+0000` offsets are rewritten to `+00:00`, and the comment count is
//! coerced to a non-negative integer. Only a short line or an empty
//! required field rejects the line.

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Minimum number of tokens in a post line. Extra tokens are ignored.
pub const MIN_FIELDS: usize = 8;

/// Why a line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("wrong field count")]
    FieldCount { found: usize },
    #[error("required field empty: {field}")]
    EmptyField { field: &'static str },
}

/// A forum post ready for submission to the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPayload {
    pub forum_id: String,
    pub url: String,
    pub title: String,
    pub author_username: String,
    pub content: String,
    pub category: String,
    pub comments: Vec<Value>,
    pub number_comments: u64,
    pub date: String,
}

/// Parses one raw CSV line into a payload destined for `forum_id`.
pub fn parse_line(raw: &str, forum_id: &str) -> Result<PostPayload, LineError> {
    let tokens = tokenize(raw);
    if tokens.len() < MIN_FIELDS {
        return Err(LineError::FieldCount {
            found: tokens.len(),
        });
    }

    let mut fields = tokens.into_iter().take(MIN_FIELDS);
    let mut next = || fields.next().unwrap_or_default();
    let url = next();
    let title = next();
    let author_username = next();
    let content = next();
    let category = next();
    let comments = next();
    let number_comments = next();
    let date = next();

    for (name, value) in [
        ("url", &url),
        ("title", &title),
        ("author_username", &author_username),
        ("content", &content),
        ("category", &category),
        ("date", &date),
    ] {
        if value.trim().is_empty() {
            return Err(LineError::EmptyField { field: name });
        }
    }

    Ok(PostPayload {
        forum_id: forum_id.to_string(),
        url,
        title,
        author_username,
        content,
        category,
        comments: repair_comments(&comments),
        number_comments: coerce_count(&number_comments),
        date: normalize_date(&date),
    })
}

/// Splits a line into fields.
///
/// A field starting with `"` runs to the matching closing quote and may
/// contain commas; `""` inside it is a literal quote and the wrapping
/// quotes are removed. Quotes elsewhere are literal. An unterminated quoted
/// field keeps whatever it collected, and text following a closing quote is
/// appended to the same field.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Removes one leading and one trailing `"`, if present. Only the comments
/// repair uses this; tokenized fields are already unquoted.
fn strip_quotes(token: &str) -> &str {
    let token = token.strip_prefix('"').unwrap_or(token);
    token.strip_suffix('"').unwrap_or(token)
}

/// Recovers the comments array from its CSV sub-field.
///
/// A value that already parses as a JSON array is returned unchanged.
/// Otherwise one wrapping quote pair is removed and doubled quotes are
/// collapsed before a second attempt. Anything that still fails, or parses
/// to a non-array, becomes an empty array.
pub fn repair_comments(raw: &str) -> Vec<Value> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        return items;
    }
    let unwrapped = strip_quotes(raw.trim()).replace("\"\"", "\"");
    match serde_json::from_str::<Value>(&unwrapped) {
        Ok(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Rewrites a trailing `+0000` offset to the ISO-8601 `+00:00` form.
/// Other values pass through trimmed.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_suffix("+0000") {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    }
}

/// Coerces a comment count to a non-negative integer. Non-numeric input
/// and negative numbers become 0; fractions are truncated.
pub fn coerce_count(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return n;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}
