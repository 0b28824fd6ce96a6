use chrono::{Days, NaiveDate};
use weightlog_core::{
    project_goal, MemoryRecordStore, Project, ProjectionError, ProjectionService, StoredRow,
    TrendScope, WeightRecord, MAX_SERIES_DAYS,
};

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn at(offset: u64, weight: f64) -> WeightRecord {
    WeightRecord {
        date: origin().checked_add_days(Days::new(offset)).unwrap(),
        weight,
    }
}

fn project(records: Vec<WeightRecord>) -> Project {
    Project::from_records(records).unwrap()
}

fn reference_project() -> Project {
    project(vec![at(0, 80.0), at(10, 78.0), at(20, 76.0), at(100, 70.0)])
}

#[test]
fn reference_series_reaches_goal_after_fifty_days() {
    let forecast = project_goal(&reference_project(), TrendScope::Measurements).unwrap();

    assert!((forecast.trend.slope + 0.2).abs() < 1e-12);
    assert!((forecast.trend.intercept - 80.0).abs() < 1e-9);
    assert!((forecast.target_day - 50.0).abs() < 1e-9);
    assert_eq!(forecast.target_weight, 70.0);
    assert_eq!(forecast.origin, origin());
    assert_eq!(
        forecast.predicted_date,
        NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
    );
    assert!(forecast.is_moving_toward_goal());
    assert_eq!(
        forecast.headline(),
        "At this pace you will reach 70kg on 20/02/2024"
    );
}

#[test]
fn projected_series_steps_whole_days_up_to_target() {
    let forecast = project_goal(&reference_project(), TrendScope::Measurements).unwrap();

    assert_eq!(forecast.series.len(), 51);
    let first = forecast.series.first().unwrap();
    assert_eq!(first.day_offset, 0);
    assert_eq!(first.date, origin());
    assert!((first.weight - 80.0).abs() < 1e-9);

    let last = forecast.series.last().unwrap();
    assert_eq!(last.day_offset, 50);
    assert_eq!(last.date, forecast.predicted_date);
    assert!((last.weight - 70.0).abs() < 1e-9);
}

#[test]
fn two_records_are_insufficient_and_three_succeed() {
    let bounds_only = project(vec![at(0, 80.0), at(100, 70.0)]);
    assert!(matches!(
        project_goal(&bounds_only, TrendScope::Measurements),
        Err(ProjectionError::InsufficientData { records: 2 })
    ));
    assert!(matches!(
        project_goal(&bounds_only, TrendScope::AllRecords),
        Err(ProjectionError::InsufficientData { records: 2 })
    ));

    let one_measurement = project(vec![at(0, 80.0), at(10, 78.0), at(100, 70.0)]);
    let forecast = project_goal(&one_measurement, TrendScope::Measurements).unwrap();
    assert!((forecast.target_day - 50.0).abs() < 1e-9);
}

#[test]
fn flat_measurements_report_flat_trend() {
    let flat = project(vec![at(0, 80.0), at(7, 80.0), at(14, 80.0), at(100, 70.0)]);
    match project_goal(&flat, TrendScope::Measurements) {
        Err(ProjectionError::FlatTrend { weight }) => assert_eq!(weight, 80.0),
        other => panic!("expected flat trend, got {other:?}"),
    }
}

#[test]
fn fractional_flat_weights_on_uneven_days_report_flat_trend() {
    for days in [[0, 3, 10], [0, 7, 13], [0, 5, 17]] {
        let mut records: Vec<WeightRecord> = days.iter().map(|day| at(*day, 92.9)).collect();
        records.push(at(100, 70.0));
        let flat = project(records);

        match project_goal(&flat, TrendScope::Measurements) {
            Err(ProjectionError::FlatTrend { weight }) => {
                assert!((weight - 92.9).abs() < 1e-9, "days {days:?}")
            }
            other => panic!("days {days:?}: expected flat trend, got {other:?}"),
        }

        let forecast = project_goal(&flat, TrendScope::AllRecords).unwrap();
        assert!(forecast.trend.slope < 0.0, "days {days:?}");
        assert!(forecast.is_moving_toward_goal());
    }
}

#[test]
fn all_records_scope_includes_goal_row_in_fit() {
    let forecast = project_goal(&reference_project(), TrendScope::AllRecords).unwrap();

    // x = [0, 10, 20, 100], y = [80, 78, 76, 70]: cov = -580, var = 6275.
    let slope = -580.0 / 6275.0;
    assert!((forecast.trend.slope - slope).abs() < 1e-12);
    assert!((forecast.trend.intercept - (76.0 - slope * 32.5)).abs() < 1e-9);
    assert_eq!(forecast.scope, TrendScope::AllRecords);
}

#[test]
fn goal_weight_is_reread_from_last_row() {
    let mut records = reference_project().records().to_vec();
    records.last_mut().unwrap().weight = 72.0;
    let forecast = project_goal(&project(records), TrendScope::Measurements).unwrap();

    assert_eq!(forecast.target_weight, 72.0);
    assert!((forecast.target_day - 40.0).abs() < 1e-9);
}

#[test]
fn diverging_trend_has_past_crossing_and_no_series() {
    let gaining = project(vec![at(0, 80.0), at(10, 82.0), at(100, 70.0)]);
    let forecast = project_goal(&gaining, TrendScope::Measurements).unwrap();

    assert!((forecast.target_day + 50.0).abs() < 1e-9);
    assert!(!forecast.is_moving_toward_goal());
    assert!(forecast.series.is_empty());
    assert_eq!(
        forecast.predicted_date,
        NaiveDate::from_ymd_opt(2023, 11, 12).unwrap()
    );
}

#[test]
fn slow_trend_beyond_series_cap_still_predicts_date() {
    // 0.0002 kg/day with 10 kg to go: the crossing is about 50 000 days out.
    let crawling = project(vec![at(0, 80.0), at(100, 79.98), at(200, 70.0)]);
    let forecast = project_goal(&crawling, TrendScope::Measurements).unwrap();

    assert!((forecast.target_day - 50_000.0).abs() < 1e-3);
    let days_out = (forecast.predicted_date - origin()).num_days();
    assert!((49_999..=50_000).contains(&days_out), "days_out {days_out}");
    assert_eq!(forecast.series.len(), MAX_SERIES_DAYS as usize + 1);
    assert_eq!(forecast.series.last().unwrap().day_offset, MAX_SERIES_DAYS);
}

#[test]
fn crossing_past_the_calendar_is_rejected() {
    let stalled = project(vec![at(0, 80.0), at(10, 80.0 - 1e-12), at(100, 70.0)]);
    assert!(matches!(
        project_goal(&stalled, TrendScope::Measurements),
        Err(ProjectionError::HorizonOutOfRange { .. })
    ));
}

#[test]
fn chart_describes_actual_projection_and_goal_line() {
    let project = reference_project();
    let forecast = project_goal(&project, TrendScope::Measurements).unwrap();
    let chart = forecast.chart(&project);

    assert_eq!(chart.actual.label, "Actual weight");
    assert_eq!(chart.actual.points.len(), 3);
    assert_eq!(chart.projection.label, "Projection");
    assert_eq!(chart.projection.points.len(), forecast.series.len());
    assert_eq!(chart.goal_line.weight, 70.0);
    assert_eq!(chart.goal_line.label, "Goal 70kg");
    assert_eq!(chart.caption, "Goal expected on 20/02/2024");
    assert_eq!(chart.y_label, "Weight (kg)");
}

#[test]
fn service_lists_corrupt_dates_instead_of_projecting() {
    let store = MemoryRecordStore::with_raw_rows(vec![
        StoredRow::new("2024-01-01", "80"),
        StoredRow::new("2024-13-01", "79"),
        StoredRow::new("yesterday", "78"),
        StoredRow::new("2024-04-10", "70"),
    ]);

    match ProjectionService::new(&store).forecast() {
        Err(ProjectionError::CorruptDates(rows)) => {
            let dates: Vec<_> = rows.iter().map(|row| row.date.as_str()).collect();
            assert_eq!(dates, vec!["2024-13-01", "yesterday"]);
        }
        other => panic!("expected corrupt dates, got {other:?}"),
    }
}

#[test]
fn service_forecasts_stored_project() {
    let store = MemoryRecordStore::with_project(&reference_project());
    let service = ProjectionService::with_scope(&store, TrendScope::Measurements);

    let (loaded, forecast) = service.forecast().unwrap();
    assert_eq!(loaded, reference_project());
    assert_eq!(
        forecast.predicted_date,
        NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
    );
}
