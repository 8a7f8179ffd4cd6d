//! ISO-8601 datetime rules and candidate-date normalization.
//!
//! Accepted shape is `YYYY-MM-DDTHH:MM:SS[.fraction]Z` (UTC only, as sent by
//! the UI date pickers). Values are stored verbatim; parsing
//! is only used for validity checks and ordering.

use super::{IssueKind, ValidationError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?Z$")
        .expect("valid datetime regex")
});

/// Returns whether `value` is a UTC ISO-8601 datetime naming a real instant.
pub fn is_iso_datetime(value: &str) -> bool {
    ISO_DATETIME_RE.is_match(value) && DateTime::parse_from_rfc3339(value).is_ok()
}

/// Parses an accepted datetime string into a UTC instant.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if !ISO_DATETIME_RE.is_match(value) {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Validates a single candidate date.
pub fn validate_candidate_date(value: &str) -> Result<String, ValidationError> {
    if is_iso_datetime(value) {
        Ok(value.to_string())
    } else {
        Err(ValidationError::single(
            "date",
            IssueKind::InvalidDatetime(value.to_string()),
        ))
    }
}

/// Removes duplicate strings and sorts ascending by instant.
///
/// Ties between distinct spellings of the same instant are ordered by the
/// raw string so the result is deterministic.
pub fn normalize_candidate_dates(mut dates: Vec<String>) -> Vec<String> {
    dates.sort_by_cached_key(|date| (parse_instant(date), date.clone()));
    dates.dedup();
    dates
}

/// Returns whether `dates` is already unique and strictly ascending.
pub fn is_normalized(dates: &[String]) -> bool {
    dates.windows(2).all(|pair| {
        (parse_instant(&pair[0]), pair[0].as_str()) < (parse_instant(&pair[1]), pair[1].as_str())
    })
}
