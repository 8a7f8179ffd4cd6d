//! Task payload schemas.

use super::{
    check_optional_datetime, check_required_text, deserialize_present, IssueKind, Issues,
    ValidationError,
};
use crate::model::company::{Task, TaskId};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Raw payload for creating a task (no id yet).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateInput {
    #[serde(default)]
    pub title: String,
    /// Empty string and `null` both mean "no due date".
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_done: bool,
}

impl TaskCreateInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn validate(&self) -> Result<TaskDraft, ValidationError> {
        let mut issues = Issues::default();
        let draft = self.check("", &mut issues);
        issues.finish(draft)
    }

    pub(crate) fn check(&self, prefix: &str, issues: &mut Issues) -> TaskDraft {
        TaskDraft {
            title: check_required_text(&self.title, &field_path(prefix, "title"), issues),
            due_date: check_optional_datetime(
                self.due_date.as_deref(),
                &field_path(prefix, "dueDate"),
                issues,
            ),
            is_done: self.is_done,
        }
    }
}

/// Validated task fields awaiting an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub due_date: Option<String>,
    pub is_done: bool,
}

impl TaskDraft {
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            due_date: self.due_date,
            is_done: self.is_done,
        }
    }
}

/// Raw payload for an already-persisted task, used when a company patch
/// replaces the whole task list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_done: bool,
}

impl TaskInput {
    pub fn validate(&self) -> Result<Task, ValidationError> {
        let mut issues = Issues::default();
        match self.check("", &mut issues) {
            Some(task) => issues.finish(task),
            None => Err(issues.into_error()),
        }
    }

    /// Returns `None` only when the id failed to parse (an issue is recorded).
    pub(crate) fn check(&self, prefix: &str, issues: &mut Issues) -> Option<Task> {
        let draft = TaskCreateInput {
            title: self.title.clone(),
            due_date: self.due_date.clone(),
            is_done: self.is_done,
        }
        .check(prefix, issues);

        match Ulid::from_string(self.id.trim()) {
            Ok(id) => Some(draft.into_task(id)),
            Err(_) => {
                issues.push(
                    field_path(prefix, "id"),
                    IssueKind::InvalidId(self.id.clone()),
                );
                None
            }
        }
    }
}

impl From<&Task> for TaskInput {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            due_date: task.due_date.clone(),
            is_done: task.is_done,
        }
    }
}

/// Raw partial update for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatchInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absent leaves the due date; `null` or `""` clears it.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl TaskPatchInput {
    pub fn validate(&self) -> Result<TaskPatch, ValidationError> {
        let mut issues = Issues::default();
        let patch = TaskPatch {
            title: self
                .title
                .as_deref()
                .map(|title| check_required_text(title, "title", &mut issues)),
            due_date: self
                .due_date
                .as_ref()
                .map(|due| check_optional_datetime(due.as_deref(), "dueDate", &mut issues)),
            is_done: self.is_done,
        };
        issues.finish(patch)
    }
}

/// Validated partial update for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<String>>,
    pub is_done: Option<bool>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(is_done) = self.is_done {
            task.is_done = is_done;
        }
    }
}

fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskCreateInput, TaskInput, TaskPatchInput};
    use crate::schema::IssueKind;

    #[test]
    fn create_defaults_done_flag_and_collapses_empty_due_date() {
        let input: TaskCreateInput =
            serde_json::from_str(r#"{"title":"  ES提出  ","dueDate":""}"#).unwrap();
        let draft = input.validate().unwrap();
        assert_eq!(draft.title, "ES提出");
        assert_eq!(draft.due_date, None);
        assert!(!draft.is_done);
    }

    #[test]
    fn create_rejects_blank_title_and_bad_due_date_together() {
        let input = TaskCreateInput::new("   ").with_due_date("tomorrow");
        let err = input.validate().unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.has_issue_at("title"));
        assert!(err.has_issue_at("dueDate"));
    }

    #[test]
    fn task_input_requires_a_ulid() {
        let input = TaskInput {
            id: "task-1".to_string(),
            title: "prepare".to_string(),
            ..TaskInput::default()
        };
        let err = input.validate().unwrap_err();
        assert_eq!(
            err.issues[0].kind,
            IssueKind::InvalidId("task-1".to_string())
        );
    }

    #[test]
    fn patch_distinguishes_absent_and_null_due_date() {
        let absent: TaskPatchInput = serde_json::from_str(r#"{"isDone":true}"#).unwrap();
        assert_eq!(absent.validate().unwrap().due_date, None);

        let cleared: TaskPatchInput = serde_json::from_str(r#"{"dueDate":null}"#).unwrap();
        assert_eq!(cleared.validate().unwrap().due_date, Some(None));

        let emptied: TaskPatchInput = serde_json::from_str(r#"{"dueDate":""}"#).unwrap();
        assert_eq!(emptied.validate().unwrap().due_date, Some(None));
    }
}
