use jobhunt_core::{
    CompanyCreateInput, CompanyPatchInput, CompanyStore, MemoryStateStorage, ProgressStatus,
    StoreError, TaskCreateInput, TaskInput, TaskPatchInput,
};
use serde_json::json;
use ulid::Ulid;

fn empty_store() -> CompanyStore<MemoryStateStorage> {
    CompanyStore::load(MemoryStateStorage::default()).unwrap()
}

fn patch(value: serde_json::Value) -> CompanyPatchInput {
    serde_json::from_value(value).unwrap()
}

#[test]
fn create_company_starts_with_empty_schedule() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "エントリー済み"))
        .unwrap();

    let company = store.company(id).unwrap();
    assert_eq!(company.name, "Acme");
    assert_eq!(company.progress_status, ProgressStatus::Applied);
    assert!(company.tasks.is_empty());
    assert!(company.candidate_dates.is_empty());
    assert_eq!(company.confirmed_date, None);
}

#[test]
fn created_company_is_listed_first_with_fresh_id() {
    let mut store = empty_store();
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let id = store
            .create_company(&CompanyCreateInput::new(name, "興味あり"))
            .unwrap();
        assert!(!ids.contains(&id));
        ids.push(id);
        assert_eq!(store.companies()[0].id, id);
    }

    let names: Vec<&str> = store.companies().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["C", "B", "A"]);
}

#[test]
fn create_company_trims_and_normalizes_payload() {
    let mut store = empty_store();
    let input: CompanyCreateInput = serde_json::from_value(json!({
        "name": "  株式会社サンプル  ",
        "progressStatus": "書類選考中",
        "tasks": [{ "title": " ES提出 ", "dueDate": "2025-06-10T15:00:00.000Z" }, { "title": "OB訪問" }],
        "candidateDates": [
            "2025-07-01T10:00:00.000Z",
            "2025-06-15T09:00:00.000Z",
            "2025-07-01T10:00:00.000Z"
        ],
        "remarks": "",
        "nextAction": " 一次面接 "
    }))
    .unwrap();

    let id = store.create_company(&input).unwrap();
    let company = store.company(id).unwrap();
    assert_eq!(company.name, "株式会社サンプル");
    assert_eq!(company.tasks.len(), 2);
    assert_eq!(company.tasks[0].title, "ES提出");
    assert_ne!(company.tasks[0].id, company.tasks[1].id);
    assert!(!company.tasks[1].is_done);
    assert_eq!(
        company.candidate_dates,
        vec!["2025-06-15T09:00:00.000Z", "2025-07-01T10:00:00.000Z"]
    );
    assert_eq!(company.remarks, None);
    assert_eq!(company.next_action.as_deref(), Some("一次面接"));
}

#[test]
fn invalid_create_is_rejected_without_state_change() {
    let mut store = empty_store();
    let err = store
        .create_company(&CompanyCreateInput::new("", "内定"))
        .unwrap_err();

    match err {
        StoreError::Validation(validation) => assert!(validation.has_issue_at("name")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.companies().is_empty());
    assert_eq!(store.storage().raw_document().unwrap(), None);
}

#[test]
fn candidate_dates_stay_sorted_and_unique() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();

    for date in [
        "2025-07-01T10:00:00.000Z",
        "2025-06-15T09:00:00.000Z",
        "2025-07-01T10:00:00.000Z",
        "2025-06-20T09:00:00.000Z",
        "2025-06-15T09:00:00.000Z",
    ] {
        store.add_candidate_date(id, date).unwrap();
    }

    assert_eq!(
        store.company(id).unwrap().candidate_dates,
        vec![
            "2025-06-15T09:00:00.000Z",
            "2025-06-20T09:00:00.000Z",
            "2025-07-01T10:00:00.000Z"
        ]
    );
}

#[test]
fn add_candidate_date_rejects_non_iso_values() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();

    let err = store.add_candidate_date(id, "2025/06/15 09:00").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.company(id).unwrap().candidate_dates.is_empty());
}

#[test]
fn remove_candidate_date_removes_exact_match_only() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    store.add_candidate_date(id, "2025-06-15T09:00:00.000Z").unwrap();
    store.add_candidate_date(id, "2025-06-20T09:00:00.000Z").unwrap();

    store.remove_candidate_date(id, "2025-06-15T09:00:00Z").unwrap();
    assert_eq!(store.company(id).unwrap().candidate_dates.len(), 2);

    store.remove_candidate_date(id, "2025-06-15T09:00:00.000Z").unwrap();
    assert_eq!(
        store.company(id).unwrap().candidate_dates,
        vec!["2025-06-20T09:00:00.000Z"]
    );
}

#[test]
fn confirm_candidate_date_clears_candidates() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    store.add_candidate_date(id, "2025-07-01T10:00:00.000Z").unwrap();
    store.add_candidate_date(id, "2025-06-15T09:00:00.000Z").unwrap();

    store
        .confirm_candidate_date(id, "2025-06-15T09:00:00.000Z")
        .unwrap();

    let company = store.company(id).unwrap();
    assert!(company.candidate_dates.is_empty());
    assert_eq!(
        company.confirmed_date.as_deref(),
        Some("2025-06-15T09:00:00.000Z")
    );

    store.clear_confirmed_date(id).unwrap();
    assert_eq!(store.company(id).unwrap().confirmed_date, None);
}

#[test]
fn empty_patch_leaves_company_unchanged() {
    let mut store = empty_store();
    let input: CompanyCreateInput = serde_json::from_value(json!({
        "name": "Acme",
        "progressStatus": "面接中",
        "tasks": [{ "title": "prepare" }],
        "candidateDates": ["2025-06-15T09:00:00.000Z"],
        "confirmedDate": "2025-06-01T09:00:00.000Z",
        "remarks": "referral",
        "nextAction": "二次面接"
    }))
    .unwrap();
    let id = store.create_company(&input).unwrap();
    let before = store.company(id).unwrap().clone();

    store.update_company(id, &patch(json!({}))).unwrap();

    assert_eq!(store.company(id).unwrap(), &before);
}

#[test]
fn omitted_and_empty_remarks_are_distinct() {
    let mut store = empty_store();
    let mut input = CompanyCreateInput::new("Acme", "面接中");
    input.remarks = Some("keep me".to_string());
    let id = store.create_company(&input).unwrap();

    store
        .update_company(id, &patch(json!({ "name": "Acme Corp" })))
        .unwrap();
    assert_eq!(store.company(id).unwrap().remarks.as_deref(), Some("keep me"));

    store
        .update_company(id, &patch(json!({ "remarks": "" })))
        .unwrap();
    assert_eq!(store.company(id).unwrap().remarks, None);
    assert_eq!(store.company(id).unwrap().name, "Acme Corp");
}

#[test]
fn patch_can_clear_and_replace_schedule_fields() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    store.add_candidate_date(id, "2025-06-15T09:00:00.000Z").unwrap();

    store
        .update_company(
            id,
            &patch(json!({
                "candidateDates": ["2025-08-01T00:00:00.000Z", "2025-07-01T00:00:00.000Z"],
                "confirmedDate": "2025-06-01T00:00:00.000Z",
                "progressStatus": "内定"
            })),
        )
        .unwrap();
    let company = store.company(id).unwrap();
    assert_eq!(
        company.candidate_dates,
        vec!["2025-07-01T00:00:00.000Z", "2025-08-01T00:00:00.000Z"]
    );
    assert_eq!(company.progress_status, ProgressStatus::Offer);

    store
        .update_company(id, &patch(json!({ "candidateDates": null, "confirmedDate": null })))
        .unwrap();
    let company = store.company(id).unwrap();
    assert!(company.candidate_dates.is_empty());
    assert_eq!(company.confirmed_date, None);
}

#[test]
fn patch_tasks_replace_the_whole_list() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    let first = store.add_task(id, &TaskCreateInput::new("first")).unwrap();
    store.add_task(id, &TaskCreateInput::new("second")).unwrap();

    let mut kept = TaskInput::from(store.company(id).unwrap().task(first).unwrap());
    kept.is_done = true;
    let replacement = CompanyPatchInput {
        tasks: Some(vec![kept]),
        ..CompanyPatchInput::default()
    };
    store.update_company(id, &replacement).unwrap();

    let company = store.company(id).unwrap();
    assert_eq!(company.tasks.len(), 1);
    assert_eq!(company.tasks[0].id, first);
    assert!(company.tasks[0].is_done);
}

#[test]
fn invalid_patch_is_not_partially_applied() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    let before = store.company(id).unwrap().clone();

    let err = store
        .update_company(
            id,
            &patch(json!({ "name": "Renamed", "confirmedDate": "next week" })),
        )
        .unwrap_err();

    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.company(id).unwrap(), &before);
}

#[test]
fn unknown_company_id_is_a_hard_failure() {
    let mut store = empty_store();
    store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    let snapshot = store.companies().to_vec();
    let revision = store.revision();
    let missing = Ulid::new();

    let results = [
        store.update_company(missing, &patch(json!({ "name": "X" }))),
        store.add_candidate_date(missing, "2025-06-15T09:00:00.000Z"),
        store.remove_candidate_date(missing, "2025-06-15T09:00:00.000Z"),
        store.confirm_candidate_date(missing, "2025-06-15T09:00:00.000Z"),
        store.delete_company(missing),
        store.add_task(missing, &TaskCreateInput::new("x")).map(|_| ()),
    ];
    for result in results {
        assert!(matches!(result, Err(StoreError::CompanyNotFound(id)) if id == missing));
    }

    assert_eq!(store.companies(), snapshot.as_slice());
    assert_eq!(store.revision(), revision);
}

#[test]
fn task_operations_locate_task_within_company() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    let task_id = store
        .add_task(id, &TaskCreateInput::new("prepare").with_due_date("2025-06-10T00:00:00.000Z"))
        .unwrap();

    assert!(store.toggle_task(id, task_id).unwrap());
    assert!(!store.toggle_task(id, task_id).unwrap());

    let task_patch: TaskPatchInput =
        serde_json::from_value(json!({ "title": "prepare slides", "dueDate": null })).unwrap();
    store.update_task(id, task_id, &task_patch).unwrap();
    let task = store.company(id).unwrap().task(task_id).unwrap();
    assert_eq!(task.title, "prepare slides");
    assert_eq!(task.due_date, None);

    let missing = Ulid::new();
    assert!(matches!(
        store.toggle_task(id, missing),
        Err(StoreError::TaskNotFound { task_id, .. }) if task_id == missing
    ));

    store.remove_task(id, task_id).unwrap();
    assert!(store.company(id).unwrap().tasks.is_empty());
    assert!(matches!(
        store.remove_task(id, task_id),
        Err(StoreError::TaskNotFound { .. })
    ));
}

#[test]
fn delete_company_removes_only_that_company() {
    let mut store = empty_store();
    let keep = store
        .create_company(&CompanyCreateInput::new("Keep", "内定"))
        .unwrap();
    let gone = store
        .create_company(&CompanyCreateInput::new("Drop", "終了"))
        .unwrap();

    store.delete_company(gone).unwrap();

    assert_eq!(store.companies().len(), 1);
    assert_eq!(store.companies()[0].id, keep);
}

#[test]
fn every_mutation_is_written_through() {
    let mut store = empty_store();
    let id = store
        .create_company(&CompanyCreateInput::new("Acme", "面接中"))
        .unwrap();
    store.add_candidate_date(id, "2025-06-15T09:00:00.000Z").unwrap();

    let storage = store.into_storage();
    let reloaded = CompanyStore::load(storage).unwrap();
    assert_eq!(
        reloaded.company(id).unwrap().candidate_dates,
        vec!["2025-06-15T09:00:00.000Z"]
    );
}
