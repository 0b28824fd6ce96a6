//! Core domain logic for Weightlog.
//! This crate is the single source of truth for weight project invariants.

pub mod input;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use input::{
    format_store_date, format_user_date, parse_confirmation, parse_user_date, parse_weight,
    InputError, InputResult,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::record::{Project, RecordValidationError, WeightRecord, MIN_PROJECT_RECORDS};
pub use repo::record_store::{
    CorruptReason, CsvRecordStore, InvalidRow, MemoryRecordStore, RecordStore, StoreError,
    StoreResult, StoredRow,
};
pub use service::projection::{
    project_goal, ChartSeries, ChartSpec, Forecast, GoalLine, ProjectedPoint, ProjectionError,
    ProjectionService, TrendLine, TrendScope, MAX_SERIES_DAYS, MIN_PROJECTION_RECORDS,
};
pub use service::record_service::{
    InitError, ProjectSetup, ProjectSummary, RecordError, RecordOutcome, RecordService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
