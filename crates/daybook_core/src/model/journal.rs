//! Journal domain model.
//!
//! # Responsibility
//! - Define the markdown journal record stored under the `journals` key.
//! - Normalize journal paths and tag lists before they reach storage.
//!
//! # Invariants
//! - A stored path has no leading or trailing `/` and no empty segment.
//! - Path segments are compared exactly (case-sensitive, no folding).
//! - Stored tags are trimmed and never blank; order and repeats are kept.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Segment separator for journal paths.
pub const PATH_SEPARATOR: char = '/';

static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid tag separator regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Markdown document addressed by a slash-delimited path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    /// Unique location such as `work/2024/standup`.
    pub path: String,
    pub title: String,
    /// Raw markdown source.
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds of the latest edit; absent until first edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
}

/// Validation failures for journal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalValidationError {
    /// Path is empty after trimming separators.
    EmptyPath,
    /// Path contains an empty segment such as `a//b`.
    EmptySegment(String),
    /// Tag value is blank.
    BlankTag,
}

impl Display for JournalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "The path is not valid!"),
            Self::EmptySegment(path) => write!(f, "path `{path}` contains an empty segment"),
            Self::BlankTag => write!(f, "tags must not be blank"),
        }
    }
}

impl Error for JournalValidationError {}

/// Normalizes a user-supplied journal path.
///
/// Leading and trailing separators are stripped. Interior empty segments are
/// rejected rather than folded so that two spellings never map to one path.
pub fn normalize_journal_path(raw: &str) -> Result<String, JournalValidationError> {
    let trimmed = raw.trim().trim_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Err(JournalValidationError::EmptyPath);
    }
    if trimmed.split(PATH_SEPARATOR).any(str::is_empty) {
        return Err(JournalValidationError::EmptySegment(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validates tags, trimming each value and keeping caller order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, JournalValidationError> {
    tags.iter()
        .map(|tag| {
            let value = WHITESPACE_RE.replace_all(tag.trim(), " ");
            if value.is_empty() {
                Err(JournalValidationError::BlankTag)
            } else {
                Ok(value.into_owned())
            }
        })
        .collect()
}

/// Parses the editor's comma separated tag field.
///
/// Blank entries (`"a,,b"`, trailing commas) are dropped.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    TAG_SEPARATOR_RE
        .split(input.trim())
        .map(|value| WHITESPACE_RE.replace_all(value.trim(), " ").into_owned())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_journal_path, normalize_tags, parse_tag_list, Journal, JournalValidationError,
    };

    #[test]
    fn path_normalization_strips_outer_separators() {
        assert_eq!(normalize_journal_path("/a/b/").unwrap(), "a/b");
        assert_eq!(normalize_journal_path("///notes").unwrap(), "notes");
        assert_eq!(normalize_journal_path("Work/Plan").unwrap(), "Work/Plan");
    }

    #[test]
    fn path_normalization_rejects_empty_and_doubled_separators() {
        assert_eq!(
            normalize_journal_path("///"),
            Err(JournalValidationError::EmptyPath)
        );
        assert_eq!(normalize_journal_path(""), Err(JournalValidationError::EmptyPath));
        assert!(matches!(
            normalize_journal_path("a//b"),
            Err(JournalValidationError::EmptySegment(_))
        ));
    }

    #[test]
    fn tags_are_trimmed_in_order_and_blank_rejected() {
        let tags = vec![" work ".to_string(), "deep   focus".to_string(), "work".to_string()];
        assert_eq!(
            normalize_tags(&tags).unwrap(),
            vec!["work".to_string(), "deep focus".to_string(), "work".to_string()]
        );
        assert_eq!(
            normalize_tags(&["  ".to_string()]),
            Err(JournalValidationError::BlankTag)
        );
    }

    #[test]
    fn tag_list_parsing_splits_on_commas() {
        assert_eq!(
            parse_tag_list("tag1 ,tag2,, tag3 ,tag1"),
            vec!["tag1", "tag2", "tag3", "tag1"]
        );
        assert!(parse_tag_list("   ").is_empty());
    }

    #[test]
    fn journal_serializes_with_snapshot_field_names() {
        let journal = Journal {
            path: "a/b".to_string(),
            title: "B".to_string(),
            content: String::new(),
            tags: vec!["x".to_string()],
            created_at: 10,
            modified_at: None,
        };
        let json = serde_json::to_value(&journal).unwrap();
        assert_eq!(json["createdAt"], 10);
        assert!(json.get("modifiedAt").is_none());
    }
}
