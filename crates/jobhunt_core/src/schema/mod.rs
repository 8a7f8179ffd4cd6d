//! Declarative validation of inbound create/patch payloads.
//!
//! # Responsibility
//! - Accept raw, serde-deserializable payloads shaped like the UI forms.
//! - Turn them into typed, normalized drafts/patches or reject them whole.
//!
//! # Invariants
//! - Validation never mutates store state; a payload is either fully valid
//!   or rejected with every issue found.
//! - String fields are trimmed before length checks.
//! - Empty optional strings collapse to "absent".

use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod company;
pub mod datetime;
pub mod task;

pub use company::{CompanyCreateInput, CompanyDraft, CompanyPatch, CompanyPatchInput};
pub use datetime::{is_iso_datetime, normalize_candidate_dates, validate_candidate_date};
pub use task::{TaskCreateInput, TaskDraft, TaskInput, TaskPatch, TaskPatchInput};

/// Maximum length (in characters) of company names and task titles.
pub const TEXT_MAX_CHARS: usize = 100;

/// Reason one field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Value is missing or blank after trimming.
    Required,
    /// Value exceeds the allowed character count.
    TooLong { max: usize, actual: usize },
    /// Value is not a `YYYY-MM-DDTHH:MM:SS[.fff]Z` instant.
    InvalidDatetime(String),
    /// Value is not one of the fixed progress labels.
    UnknownProgressStatus(String),
    /// Value is not a valid ULID.
    InvalidId(String),
    /// Identifier appears more than once in one list.
    DuplicateId(String),
    /// Candidate dates are not unique and ascending.
    NotNormalized,
    /// Stored text carries leading or trailing whitespace.
    NotTrimmed,
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::TooLong { max, actual } => {
                write!(f, "must be at most {max} characters (got {actual})")
            }
            Self::InvalidDatetime(value) => write!(f, "invalid ISO datetime `{value}`"),
            Self::UnknownProgressStatus(value) => write!(f, "unknown progress status `{value}`"),
            Self::InvalidId(value) => write!(f, "invalid id `{value}`"),
            Self::DuplicateId(value) => write!(f, "duplicate id `{value}`"),
            Self::NotNormalized => write!(f, "must be unique and sorted ascending"),
            Self::NotTrimmed => write!(f, "must not have surrounding whitespace"),
        }
    }
}

/// One failed field, addressed by a JSON-like path such as `tasks[1].title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub kind: IssueKind,
}

/// Rejection of a whole payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub(crate) fn single(path: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            issues: vec![ValidationIssue {
                path: path.into(),
                kind,
            }],
        }
    }

    /// Returns whether any issue was reported for `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: ")?;
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {}", issue.path, issue.kind)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Accumulates issues across one payload so callers see every problem at once.
#[derive(Debug, Default)]
pub(crate) struct Issues(Vec<ValidationIssue>);

impl Issues {
    pub(crate) fn push(&mut self, path: impl Into<String>, kind: IssueKind) {
        self.0.push(ValidationIssue {
            path: path.into(),
            kind,
        });
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { issues: self.0 })
        }
    }

    /// Converts recorded issues into an error; callers only use this after
    /// at least one issue was pushed.
    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError { issues: self.0 }
    }
}

/// Trims `raw` and checks it is non-empty and within `TEXT_MAX_CHARS`.
pub(crate) fn check_required_text(raw: &str, path: &str, issues: &mut Issues) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        issues.push(path, IssueKind::Required);
    } else {
        let actual = trimmed.chars().count();
        if actual > TEXT_MAX_CHARS {
            issues.push(
                path,
                IssueKind::TooLong {
                    max: TEXT_MAX_CHARS,
                    actual,
                },
            );
        }
    }
    trimmed.to_string()
}

/// Trims optional free text; blank collapses to `None`.
pub(crate) fn collapse_optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Checks an optional datetime; blank collapses to `None`.
pub(crate) fn check_optional_datetime(
    raw: Option<&str>,
    path: &str,
    issues: &mut Issues,
) -> Option<String> {
    let value = raw.filter(|value| !value.is_empty())?;
    if !is_iso_datetime(value) {
        issues.push(path, IssueKind::InvalidDatetime(value.to_string()));
    }
    Some(value.to_string())
}

/// Deserializes a field that distinguishes "absent" from "explicit null".
///
/// Use with `#[serde(default, deserialize_with = "deserialize_present")]`:
/// a missing key stays `None`, `null` becomes `Some(None)`.
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{check_required_text, collapse_optional_text, IssueKind, Issues};

    #[test]
    fn required_text_is_trimmed_and_bounded() {
        let mut issues = Issues::default();
        assert_eq!(check_required_text("  Acme  ", "name", &mut issues), "Acme");
        assert!(issues.finish(()).is_ok());

        let mut issues = Issues::default();
        check_required_text(&"あ".repeat(101), "name", &mut issues);
        let err = issues.finish(()).unwrap_err();
        assert_eq!(
            err.issues[0].kind,
            IssueKind::TooLong {
                max: 100,
                actual: 101
            }
        );
    }

    #[test]
    fn hundred_multibyte_characters_are_accepted() {
        let mut issues = Issues::default();
        check_required_text(&"株".repeat(100), "name", &mut issues);
        assert!(issues.finish(()).is_ok());
    }

    #[test]
    fn blank_optional_text_collapses_to_none() {
        assert_eq!(collapse_optional_text(Some("   ")), None);
        assert_eq!(collapse_optional_text(None), None);
        assert_eq!(
            collapse_optional_text(Some(" call HR ")).as_deref(),
            Some("call HR")
        );
    }
}
