//! Read-only projections of the company collection for list, calendar and
//! detail screens.
//!
//! # Invariants
//! - Projections never mutate or reorder the source collection.
//! - Calendar days are computed in the caller-supplied UTC offset.

use crate::model::company::{Company, CompanyId, Task, TaskId};
use crate::schema::datetime::parse_instant;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::collections::BTreeMap;

/// What put an entry on the calendar. Ordering breaks same-instant ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CalendarEntryKind {
    Confirmed,
    Candidate,
    TaskDue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub kind: CalendarEntryKind,
    pub company_id: CompanyId,
    pub company_name: String,
    /// `next_action` for schedule entries, task title for due tasks.
    pub title: Option<String>,
    pub task_id: Option<TaskId>,
    /// Stored ISO string, verbatim.
    pub at: String,
    pub local: DateTime<FixedOffset>,
}

/// Buckets confirmed dates, candidate dates and open-task due dates by local
/// calendar day. Entries inside a day are ordered by instant, then kind.
pub fn calendar_entries(
    companies: &[Company],
    offset: FixedOffset,
) -> BTreeMap<NaiveDate, Vec<CalendarEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();

    for company in companies {
        let schedule_dates = company
            .confirmed_date
            .iter()
            .map(|date| (CalendarEntryKind::Confirmed, date))
            .chain(
                company
                    .candidate_dates
                    .iter()
                    .map(|date| (CalendarEntryKind::Candidate, date)),
            );
        for (kind, date) in schedule_dates {
            if let Some(instant) = parse_instant(date) {
                let local = instant.with_timezone(&offset);
                days.entry(local.date_naive()).or_default().push(CalendarEntry {
                    kind,
                    company_id: company.id,
                    company_name: company.name.clone(),
                    title: company.next_action.clone(),
                    task_id: None,
                    at: date.clone(),
                    local,
                });
            }
        }

        for task in company.tasks.iter().filter(|task| !task.is_done) {
            let Some(due) = task.due_date.as_deref() else {
                continue;
            };
            if let Some(instant) = parse_instant(due) {
                let local = instant.with_timezone(&offset);
                days.entry(local.date_naive()).or_default().push(CalendarEntry {
                    kind: CalendarEntryKind::TaskDue,
                    company_id: company.id,
                    company_name: company.name.clone(),
                    title: Some(task.title.clone()),
                    task_id: Some(task.id),
                    at: due.to_string(),
                    local,
                });
            }
        }
    }

    for entries in days.values_mut() {
        entries.sort_by(|a, b| a.local.cmp(&b.local).then(a.kind.cmp(&b.kind)));
    }
    days
}

/// One not-done task with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskView<'a> {
    pub company_id: CompanyId,
    pub company_name: &'a str,
    pub task: &'a Task,
}

/// Open tasks across all companies: dated tasks first by due instant,
/// undated tasks after them in collection order.
pub fn open_tasks(companies: &[Company]) -> Vec<TaskView<'_>> {
    let mut views: Vec<TaskView<'_>> = companies
        .iter()
        .flat_map(|company| {
            company
                .tasks
                .iter()
                .filter(|task| !task.is_done)
                .map(move |task| TaskView {
                    company_id: company.id,
                    company_name: company.name.as_str(),
                    task,
                })
        })
        .collect();

    views.sort_by_cached_key(|view| {
        let due = view.task.due_date.as_deref().and_then(parse_instant);
        (due.is_none(), due)
    });
    views
}

/// Next schedule shown on a company's detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextSchedule {
    Confirmed(String),
    Candidate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanySummary {
    pub open_tasks: usize,
    pub done_tasks: usize,
    pub next_schedule: Option<NextSchedule>,
}

/// Summarizes one company relative to `now`.
///
/// The confirmed date wins while it is not in the past; otherwise the
/// earliest candidate date at or after `now` is reported.
pub fn company_summary(company: &Company, now: DateTime<Utc>) -> CompanySummary {
    let done_tasks = company.tasks.iter().filter(|task| task.is_done).count();
    let upcoming = |date: &String| parse_instant(date).is_some_and(|instant| instant >= now);

    let next_schedule = match company.confirmed_date.as_ref().filter(|date| upcoming(date)) {
        Some(confirmed) => Some(NextSchedule::Confirmed(confirmed.clone())),
        None => company
            .candidate_dates
            .iter()
            .find(|date| upcoming(date))
            .map(|date| NextSchedule::Candidate(date.clone())),
    };

    CompanySummary {
        open_tasks: company.tasks.len() - done_tasks,
        done_tasks,
        next_schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::{calendar_entries, company_summary, open_tasks, CalendarEntryKind, NextSchedule};
    use crate::model::company::{Company, ProgressStatus, Task};
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    use ulid::Ulid;

    fn task(title: &str, due: Option<&str>, is_done: bool) -> Task {
        Task {
            id: Ulid::new(),
            title: title.to_string(),
            due_date: due.map(str::to_string),
            is_done,
        }
    }

    #[test]
    fn calendar_buckets_use_local_offset() {
        let mut company = Company::new(Ulid::new(), "Acme", ProgressStatus::Interviewing);
        // 16:00Z on June 15th is June 16th in JST.
        company.candidate_dates = vec!["2025-06-15T16:00:00.000Z".to_string()];
        company.next_action = Some("一次面接".to_string());
        company.tasks.push(task("done", Some("2025-06-16T01:00:00.000Z"), true));

        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let days = calendar_entries(&[company], jst);

        let day = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let entries = &days[&day];
        assert_eq!(days.len(), 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, CalendarEntryKind::Candidate);
        assert_eq!(entries[0].title.as_deref(), Some("一次面接"));
    }

    #[test]
    fn open_tasks_put_dated_tasks_first() {
        let mut first = Company::new(Ulid::new(), "A", ProgressStatus::Applied);
        first.tasks.push(task("undated", None, false));
        first.tasks.push(task("late", Some("2025-07-01T00:00:00.000Z"), false));
        let mut second = Company::new(Ulid::new(), "B", ProgressStatus::Applied);
        second.tasks.push(task("early", Some("2025-06-01T00:00:00.000Z"), false));
        second.tasks.push(task("finished", None, true));

        let companies = [first, second];
        let titles: Vec<&str> = open_tasks(&companies)
            .iter()
            .map(|view| view.task.title.as_str())
            .collect();
        assert_eq!(titles, vec!["early", "late", "undated"]);
    }

    #[test]
    fn summary_prefers_future_confirmed_date() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap();
        let mut company = Company::new(Ulid::new(), "Acme", ProgressStatus::Interviewing);
        company.candidate_dates = vec![
            "2025-06-01T00:00:00.000Z".to_string(),
            "2025-06-20T00:00:00.000Z".to_string(),
        ];
        company.tasks.push(task("a", None, true));
        company.tasks.push(task("b", None, false));

        let summary = company_summary(&company, now);
        assert_eq!(summary.open_tasks, 1);
        assert_eq!(summary.done_tasks, 1);
        assert_eq!(
            summary.next_schedule,
            Some(NextSchedule::Candidate("2025-06-20T00:00:00.000Z".to_string()))
        );

        company.confirmed_date = Some("2025-06-12T01:00:00.000Z".to_string());
        assert_eq!(
            company_summary(&company, now).next_schedule,
            Some(NextSchedule::Confirmed("2025-06-12T01:00:00.000Z".to_string()))
        );
    }
}
