use chrono::NaiveDate;
use std::fs;
use weightlog_core::{
    CsvRecordStore, InitError, MemoryRecordStore, Project, ProjectSetup, RecordError,
    RecordOutcome, RecordService, RecordStore, WeightRecord,
};

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn setup() -> ProjectSetup {
    ProjectSetup {
        start_date: day(1, 1),
        start_weight: 90.0,
        end_date: day(6, 30),
        goal_weight: 80.0,
    }
}

fn initialized_memory_store() -> MemoryRecordStore {
    let store = MemoryRecordStore::new();
    RecordService::new(&store).initialize_project(&setup()).unwrap();
    store
}

fn is_strictly_sorted(project: &Project) -> bool {
    project
        .records()
        .windows(2)
        .all(|pair| pair[0].date < pair[1].date)
}

#[test]
fn initialize_writes_two_record_project() {
    let store = MemoryRecordStore::new();
    let service = RecordService::new(&store);
    assert!(service.needs_setup());

    let project = service.initialize_project(&setup()).unwrap();

    assert!(!service.needs_setup());
    assert_eq!(project.len(), 2);
    assert_eq!(*project.start(), WeightRecord { date: day(1, 1), weight: 90.0 });
    assert_eq!(*project.goal(), WeightRecord { date: day(6, 30), weight: 80.0 });
    assert_eq!(store.load().unwrap(), project);
}

#[test]
fn initialize_rejects_end_not_after_start() {
    let store = MemoryRecordStore::new();
    let service = RecordService::new(&store);

    for end_date in [day(1, 1), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()] {
        let err = service
            .initialize_project(&ProjectSetup { end_date, ..setup() })
            .unwrap_err();
        assert!(matches!(err, InitError::EndNotAfterStart { .. }));
    }
    assert!(!store.exists());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn initialize_never_overwrites_existing_project() {
    let store = initialized_memory_store();
    let err = RecordService::new(&store)
        .initialize_project(&setup())
        .unwrap_err();
    assert!(matches!(err, InitError::AlreadyInitialized));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn insert_adds_exactly_one_sorted_record() {
    let store = initialized_memory_store();
    let service = RecordService::new(&store);

    for (date, weight) in [(day(3, 1), 86.0), (day(2, 1), 88.0), (day(4, 1), 84.5)] {
        let before = store.load().unwrap().len();
        let outcome = service
            .record_weight(date, weight, |_, _| false)
            .unwrap();
        assert_eq!(outcome, RecordOutcome::Inserted(WeightRecord { date, weight }));

        let after = store.load().unwrap();
        assert_eq!(after.len(), before + 1);
        assert!(is_strictly_sorted(&after));
    }
}

#[test]
fn confirmed_overwrite_changes_exactly_one_weight() {
    let store = initialized_memory_store();
    let service = RecordService::new(&store);
    service.record_weight(day(2, 1), 88.0, |_, _| false).unwrap();
    let before = store.load().unwrap();

    let mut asked = None;
    let outcome = service
        .record_weight(day(2, 1), 87.4, |existing, new_weight| {
            asked = Some((*existing, new_weight));
            true
        })
        .unwrap();

    assert_eq!(asked, Some((WeightRecord { date: day(2, 1), weight: 88.0 }, 87.4)));
    assert_eq!(
        outcome,
        RecordOutcome::Updated {
            record: WeightRecord { date: day(2, 1), weight: 87.4 },
            previous_weight: 88.0,
        }
    );

    let after = store.load().unwrap();
    assert_eq!(after.len(), before.len());
    let changed = before
        .records()
        .iter()
        .zip(after.records())
        .filter(|(old, new)| old != new)
        .count();
    assert_eq!(changed, 1);
}

#[test]
fn declined_overwrite_is_a_no_op() {
    let store = initialized_memory_store();
    let service = RecordService::new(&store);
    service.record_weight(day(2, 1), 88.0, |_, _| false).unwrap();
    let saves = store.save_count();

    let outcome = service.record_weight(day(2, 1), 70.0, |_, _| false).unwrap();

    assert_eq!(
        outcome,
        RecordOutcome::DuplicateDeclined(WeightRecord { date: day(2, 1), weight: 88.0 })
    );
    assert_eq!(store.save_count(), saves);
    assert_eq!(store.load().unwrap().get(day(2, 1)).unwrap().weight, 88.0);
}

#[test]
fn overwriting_end_date_changes_goal_weight() {
    let store = initialized_memory_store();
    let service = RecordService::new(&store);

    service.record_weight(day(6, 30), 78.0, |_, _| true).unwrap();

    assert_eq!(store.load().unwrap().goal_weight(), 78.0);
}

#[test]
fn out_of_range_dates_leave_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.csv");
    let store = CsvRecordStore::new(&path);
    let service = RecordService::new(&store);
    service.initialize_project(&setup()).unwrap();
    let before = fs::read(&path).unwrap();

    for date in [
        day(1, 1).pred_opt().unwrap(),
        day(6, 30).succ_opt().unwrap(),
    ] {
        let err = service.record_weight(date, 85.0, |_, _| true).unwrap_err();
        assert!(matches!(err, RecordError::OutOfRange { .. }));
    }

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn raw_input_dates_are_parsed_day_first() {
    let store = initialized_memory_store();
    let service = RecordService::new(&store);

    service.record_weight_input("02/03/2024", 86.0, |_, _| false).unwrap();
    assert!(store.load().unwrap().contains_date(day(3, 2)));

    let err = service
        .record_weight_input("2024-03-02", 86.0, |_, _| false)
        .unwrap_err();
    assert!(matches!(err, RecordError::InvalidDate(raw) if raw == "2024-03-02"));
}

#[test]
fn invalid_weight_is_rejected_before_saving() {
    let store = initialized_memory_store();
    let err = RecordService::new(&store)
        .record_weight(day(2, 1), -5.0, |_, _| true)
        .unwrap_err();
    assert!(matches!(err, RecordError::InvalidWeight(_)));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn summary_reports_distance_to_goal() {
    let store = initialized_memory_store();
    let service = RecordService::new(&store);
    service.record_weight(day(2, 1), 86.5, |_, _| false).unwrap();

    let summary = service.project_summary().unwrap();
    assert_eq!(summary.intermediate_count, 1);
    assert_eq!(summary.latest.date, day(2, 1));
    assert_eq!(summary.remaining_kg, 6.5);
}
