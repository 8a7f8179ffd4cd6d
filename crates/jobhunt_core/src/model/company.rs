//! Company and task domain model.
//!
//! # Responsibility
//! - Define the records held by the store and written to storage.
//! - Re-check field-level invariants for records read back from storage.
//!
//! # Invariants
//! - `id` values are ULIDs generated once and never reused.
//! - `candidate_dates` is duplicate-free and ascending after every mutation.
//! - Tasks are owned by exactly one company and have no lifecycle outside it.
//!
//! # Wire format
//! - camelCase keys; absent optionals are omitted.
//! - Progress statuses serialize to their Japanese labels verbatim.

use crate::schema::datetime::{is_iso_datetime, is_normalized};
use crate::schema::{check_required_text, IssueKind, Issues, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ulid::Ulid;

/// Stable company identifier. Lexicographically sortable by creation time.
pub type CompanyId = Ulid;

/// Stable task identifier, unique within its owning company.
pub type TaskId = Ulid;

/// Recruiting stage for one company.
///
/// The label set is closed; persisted documents store the label strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressStatus {
    #[serde(rename = "興味あり")]
    Interested,
    #[serde(rename = "エントリー済み")]
    Applied,
    #[serde(rename = "書類選考中")]
    DocumentScreening,
    #[serde(rename = "面接中")]
    Interviewing,
    #[serde(rename = "内定")]
    Offer,
    #[serde(rename = "終了")]
    Closed,
}

impl ProgressStatus {
    /// All statuses in pipeline order.
    pub const ALL: [ProgressStatus; 6] = [
        Self::Interested,
        Self::Applied,
        Self::DocumentScreening,
        Self::Interviewing,
        Self::Offer,
        Self::Closed,
    ];

    /// Returns the persisted label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Interested => "興味あり",
            Self::Applied => "エントリー済み",
            Self::DocumentScreening => "書類選考中",
            Self::Interviewing => "面接中",
            Self::Offer => "内定",
            Self::Closed => "終了",
        }
    }

    /// Parses an exact label. Whitespace or alternate spellings are rejected.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == value)
    }
}

/// Action item owned by one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_done: bool,
}

/// One employer being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub progress_status: ProgressStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub candidate_dates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Title of the upcoming scheduled event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

impl Company {
    /// Creates an empty company record with the given identity.
    pub fn new(id: CompanyId, name: impl Into<String>, progress_status: ProgressStatus) -> Self {
        Self {
            id,
            name: name.into(),
            progress_status,
            tasks: Vec::new(),
            candidate_dates: Vec::new(),
            confirmed_date: None,
            remarks: None,
            next_action: None,
        }
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    /// Validates stored-record invariants.
    ///
    /// Used on read paths so corrupted persisted state surfaces as an error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::default();

        if check_required_text(&self.name, "name", &mut issues) != self.name {
            issues.push("name", IssueKind::NotTrimmed);
        }

        let mut seen = HashSet::new();
        for (index, task) in self.tasks.iter().enumerate() {
            let path = format!("tasks[{index}]");
            check_required_text(&task.title, &format!("{path}.title"), &mut issues);
            if let Some(due) = task.due_date.as_deref() {
                if !is_iso_datetime(due) {
                    issues.push(
                        format!("{path}.dueDate"),
                        IssueKind::InvalidDatetime(due.to_string()),
                    );
                }
            }
            if !seen.insert(task.id) {
                issues.push(
                    format!("{path}.id"),
                    IssueKind::DuplicateId(task.id.to_string()),
                );
            }
        }

        for (index, date) in self.candidate_dates.iter().enumerate() {
            if !is_iso_datetime(date) {
                issues.push(
                    format!("candidateDates[{index}]"),
                    IssueKind::InvalidDatetime(date.clone()),
                );
            }
        }
        if !is_normalized(&self.candidate_dates) {
            issues.push("candidateDates", IssueKind::NotNormalized);
        }

        if let Some(confirmed) = self.confirmed_date.as_deref() {
            if !is_iso_datetime(confirmed) {
                issues.push(
                    "confirmedDate",
                    IssueKind::InvalidDatetime(confirmed.to_string()),
                );
            }
        }
        if matches!(self.remarks.as_deref(), Some(value) if value.trim().is_empty()) {
            issues.push("remarks", IssueKind::Required);
        }
        if matches!(self.next_action.as_deref(), Some(value) if value.trim().is_empty()) {
            issues.push("nextAction", IssueKind::Required);
        }

        issues.finish(())
    }
}
