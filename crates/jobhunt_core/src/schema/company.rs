//! Company create/patch schemas.
//!
//! # Invariants
//! - Create payloads default `tasks` and `candidateDates` to empty.
//! - Patch payloads keep "absent" and "explicitly cleared" apart for
//!   `candidateDates`, `confirmedDate` and `remarks`.
//! - Patch `tasks` replaces the full list and therefore requires task ids.

use super::datetime::normalize_candidate_dates;
use super::task::{TaskCreateInput, TaskDraft, TaskInput};
use super::{
    check_optional_datetime, check_required_text, collapse_optional_text, deserialize_present,
    is_iso_datetime, IssueKind, Issues, ValidationError,
};
use crate::model::company::{Company, ProgressStatus, Task};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw payload for creating a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCreateInput {
    #[serde(default)]
    pub name: String,
    /// Must be one of the `ProgressStatus` labels.
    #[serde(default)]
    pub progress_status: String,
    #[serde(default)]
    pub tasks: Vec<TaskCreateInput>,
    #[serde(default)]
    pub candidate_dates: Vec<String>,
    #[serde(default)]
    pub confirmed_date: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub next_action: Option<String>,
}

impl CompanyCreateInput {
    pub fn new(name: impl Into<String>, progress_status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            progress_status: progress_status.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<CompanyDraft, ValidationError> {
        let mut issues = Issues::default();

        let name = check_required_text(&self.name, "name", &mut issues);
        let progress_status = check_progress_status(&self.progress_status, &mut issues);
        let tasks = self
            .tasks
            .iter()
            .enumerate()
            .map(|(index, task)| task.check(&format!("tasks[{index}]"), &mut issues))
            .collect();
        let candidate_dates = check_candidate_dates(&self.candidate_dates, &mut issues);
        let confirmed_date =
            check_optional_datetime(self.confirmed_date.as_deref(), "confirmedDate", &mut issues);

        let draft = CompanyDraft {
            name,
            // Only read when `issues` is empty, in which case the status parsed.
            progress_status: progress_status.unwrap_or(ProgressStatus::Interested),
            tasks,
            candidate_dates,
            confirmed_date,
            remarks: collapse_optional_text(self.remarks.as_deref()),
            next_action: collapse_optional_text(self.next_action.as_deref()),
        };
        issues.finish(draft)
    }
}

/// Validated create payload. Ids are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyDraft {
    pub name: String,
    pub progress_status: ProgressStatus,
    pub tasks: Vec<TaskDraft>,
    /// Already deduplicated and ascending.
    pub candidate_dates: Vec<String>,
    pub confirmed_date: Option<String>,
    pub remarks: Option<String>,
    pub next_action: Option<String>,
}

/// Raw partial update for a company.
///
/// Tri-state fields use `Option<Option<_>>`: `None` when the key is absent,
/// `Some(None)` for an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatchInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskInput>>,
    /// `null` clears the list.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub candidate_dates: Option<Option<Vec<String>>>,
    /// `null` or `""` clears the confirmed date.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub confirmed_date: Option<Option<String>>,
    /// `null` or `""` clears the remarks.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub remarks: Option<Option<String>>,
    /// `null` or `""` is treated as not supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

impl CompanyPatchInput {
    pub fn validate(&self) -> Result<CompanyPatch, ValidationError> {
        let mut issues = Issues::default();

        let name = self
            .name
            .as_deref()
            .map(|name| check_required_text(name, "name", &mut issues));
        let progress_status = self
            .progress_status
            .as_deref()
            .and_then(|status| check_progress_status(status, &mut issues));
        let tasks = self
            .tasks
            .as_ref()
            .map(|tasks| check_task_list(tasks, &mut issues));
        let candidate_dates = self.candidate_dates.as_ref().map(|dates| match dates {
            Some(dates) => check_candidate_dates(dates, &mut issues),
            None => Vec::new(),
        });
        let confirmed_date = self.confirmed_date.as_ref().map(|date| {
            check_optional_datetime(date.as_deref(), "confirmedDate", &mut issues)
        });
        let remarks = self
            .remarks
            .as_ref()
            .map(|remarks| collapse_optional_text(remarks.as_deref()));
        let next_action = collapse_optional_text(self.next_action.as_deref());

        let patch = CompanyPatch {
            name,
            progress_status,
            tasks,
            candidate_dates,
            confirmed_date,
            remarks,
            next_action,
        };
        issues.finish(patch)
    }
}

/// Validated partial update. `None` always means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub progress_status: Option<ProgressStatus>,
    /// Full replacement list.
    pub tasks: Option<Vec<Task>>,
    /// Replacement list, already normalized; `Some(vec![])` clears.
    pub candidate_dates: Option<Vec<String>>,
    /// `Some(None)` clears.
    pub confirmed_date: Option<Option<String>>,
    /// `Some(None)` clears.
    pub remarks: Option<Option<String>>,
    pub next_action: Option<String>,
}

impl CompanyPatch {
    /// Returns whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies supplied fields onto `company`, leaving the rest untouched.
    pub fn apply(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(progress_status) = self.progress_status {
            company.progress_status = progress_status;
        }
        if let Some(tasks) = self.tasks {
            company.tasks = tasks;
        }
        if let Some(candidate_dates) = self.candidate_dates {
            company.candidate_dates = candidate_dates;
        }
        if let Some(confirmed_date) = self.confirmed_date {
            company.confirmed_date = confirmed_date;
        }
        if let Some(remarks) = self.remarks {
            company.remarks = remarks;
        }
        if let Some(next_action) = self.next_action {
            company.next_action = Some(next_action);
        }
    }
}

fn check_progress_status(raw: &str, issues: &mut Issues) -> Option<ProgressStatus> {
    let status = ProgressStatus::from_label(raw);
    if status.is_none() {
        issues.push(
            "progressStatus",
            IssueKind::UnknownProgressStatus(raw.to_string()),
        );
    }
    status
}

fn check_candidate_dates(dates: &[String], issues: &mut Issues) -> Vec<String> {
    for (index, date) in dates.iter().enumerate() {
        if !is_iso_datetime(date) {
            issues.push(
                format!("candidateDates[{index}]"),
                IssueKind::InvalidDatetime(date.clone()),
            );
        }
    }
    normalize_candidate_dates(dates.to_vec())
}

fn check_task_list(tasks: &[TaskInput], issues: &mut Issues) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut checked = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let path = format!("tasks[{index}]");
        if let Some(task) = task.check(&path, issues) {
            if !seen.insert(task.id) {
                issues.push(
                    format!("{path}.id"),
                    IssueKind::DuplicateId(task.id.to_string()),
                );
            }
            checked.push(task);
        }
    }
    checked
}

#[cfg(test)]
mod tests {
    use super::{CompanyCreateInput, CompanyPatchInput};
    use crate::model::company::ProgressStatus;
    use crate::schema::IssueKind;

    #[test]
    fn create_applies_defaults() {
        let input: CompanyCreateInput =
            serde_json::from_str(r#"{"name":"Acme","progressStatus":"エントリー済み"}"#).unwrap();
        let draft = input.validate().unwrap();
        assert_eq!(draft.name, "Acme");
        assert_eq!(draft.progress_status, ProgressStatus::Applied);
        assert!(draft.tasks.is_empty());
        assert!(draft.candidate_dates.is_empty());
        assert_eq!(draft.confirmed_date, None);
    }

    #[test]
    fn create_rejects_unknown_status_and_empty_name() {
        let err = CompanyCreateInput::new("", "applied").validate().unwrap_err();
        assert!(err.has_issue_at("name"));
        assert!(err.issues.iter().any(|issue| matches!(
            &issue.kind,
            IssueKind::UnknownProgressStatus(value) if value == "applied"
        )));
    }

    #[test]
    fn create_collapses_blank_optional_strings() {
        let input: CompanyCreateInput = serde_json::from_str(
            r#"{"name":"Acme","progressStatus":"内定","confirmedDate":"","remarks":"","nextAction":"  "}"#,
        )
        .unwrap();
        let draft = input.validate().unwrap();
        assert_eq!(draft.confirmed_date, None);
        assert_eq!(draft.remarks, None);
        assert_eq!(draft.next_action, None);
    }

    #[test]
    fn create_reports_nested_task_paths() {
        let input: CompanyCreateInput = serde_json::from_str(
            r#"{"name":"Acme","progressStatus":"内定","tasks":[{"title":"ok"},{"title":""}]}"#,
        )
        .unwrap();
        let err = input.validate().unwrap_err();
        assert!(err.has_issue_at("tasks[1].title"));
    }

    #[test]
    fn patch_tracks_key_presence() {
        let absent: CompanyPatchInput = serde_json::from_str("{}").unwrap();
        let patch = absent.validate().unwrap();
        assert!(patch.is_empty());

        let cleared: CompanyPatchInput =
            serde_json::from_str(r#"{"remarks":"","confirmedDate":null,"candidateDates":null}"#)
                .unwrap();
        let patch = cleared.validate().unwrap();
        assert_eq!(patch.remarks, Some(None));
        assert_eq!(patch.confirmed_date, Some(None));
        assert_eq!(patch.candidate_dates, Some(Vec::new()));
    }

    #[test]
    fn patch_treats_empty_next_action_as_absent() {
        let input: CompanyPatchInput = serde_json::from_str(r#"{"nextAction":""}"#).unwrap();
        assert!(input.validate().unwrap().is_empty());
    }

    #[test]
    fn patch_rejects_duplicate_task_ids() {
        let id = ulid::Ulid::new().to_string();
        let input: CompanyPatchInput = serde_json::from_value(serde_json::json!({
            "tasks": [
                { "id": id, "title": "a" },
                { "id": id, "title": "b" }
            ]
        }))
        .unwrap();
        let err = input.validate().unwrap_err();
        assert!(err.has_issue_at("tasks[1].id"));
    }
}
