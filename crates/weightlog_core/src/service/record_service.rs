//! Weight recording use-case service.
//!
//! # Responsibility
//! - Create the initial two-record project on first run.
//! - Validate and apply insert/update of single weight records.
//!
//! # Invariants
//! - This is the only component that writes the record store.
//! - A rejected request never reaches `RecordStore::save`.
//! - Overwriting an existing date requires explicit caller confirmation;
//!   a declined overwrite is an outcome, not an error.

use crate::input::parse_user_date;
use crate::model::record::{validate_weight, Project, RecordValidationError, WeightRecord};
use crate::repo::record_store::{CorruptReason, RecordStore, StoreError, StoreResult};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// First-run project parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectSetup {
    pub start_date: NaiveDate,
    pub start_weight: f64,
    /// Goal deadline; must be strictly after `start_date`.
    pub end_date: NaiveDate,
    pub goal_weight: f64,
}

/// Result of a successful record request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordOutcome {
    /// A new date was added.
    Inserted(WeightRecord),
    /// An existing date got a new weight.
    Updated {
        record: WeightRecord,
        previous_weight: f64,
    },
    /// The date already existed and the caller kept the stored weight.
    DuplicateDeclined(WeightRecord),
}

/// Rejections for record requests.
#[derive(Debug)]
pub enum RecordError {
    InvalidDate(String),
    InvalidWeight(f64),
    /// Date falls outside `[start, end]` of the project.
    OutOfRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
    Store(StoreError),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(raw) => write!(f, "invalid date `{raw}`; use DD/MM/YYYY"),
            Self::InvalidWeight(weight) => {
                write!(f, "weight must be a positive number of kg, got {weight}")
            }
            Self::OutOfRange { date, start, end } => write!(
                f,
                "date {} is outside the project period ({} to {})",
                date.format("%d/%m/%Y"),
                start.format("%d/%m/%Y"),
                end.format("%d/%m/%Y")
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RecordError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RecordValidationError> for RecordError {
    fn from(value: RecordValidationError) -> Self {
        match value {
            RecordValidationError::InvalidWeight(weight) => Self::InvalidWeight(weight),
            other => Self::Store(StoreError::Corrupt(CorruptReason::Invariant(other))),
        }
    }
}

/// Rejections for first-run initialization.
#[derive(Debug)]
pub enum InitError {
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },
    InvalidWeight(f64),
    /// A project is already stored; it is never overwritten by setup.
    AlreadyInitialized,
    Store(StoreError),
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndNotAfterStart { start, end } => write!(
                f,
                "end date {} must be after start date {}",
                end.format("%d/%m/%Y"),
                start.format("%d/%m/%Y")
            ),
            Self::InvalidWeight(weight) => {
                write!(f, "weight must be a positive number of kg, got {weight}")
            }
            Self::AlreadyInitialized => write!(f, "a weight project already exists"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for InitError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Snapshot of progress shown when a session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectSummary {
    pub start: WeightRecord,
    pub goal: WeightRecord,
    /// Records strictly between start and goal.
    pub intermediate_count: usize,
    /// Most recent non-goal record (the start record when nothing else exists).
    pub latest: WeightRecord,
    /// `latest.weight - goal.weight`; positive while above the goal.
    pub remaining_kg: f64,
}

impl ProjectSummary {
    pub fn of(project: &Project) -> Self {
        let start = *project.start();
        let goal = *project.goal();
        let latest = project.measurements().last().copied().unwrap_or(start);
        Self {
            start,
            goal,
            intermediate_count: project.len().saturating_sub(2),
            latest,
            remaining_kg: latest.weight - goal.weight,
        }
    }
}

/// Validator/mutator over a record store.
pub struct RecordService<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns whether a project still has to be set up.
    pub fn needs_setup(&self) -> bool {
        !self.store.exists()
    }

    /// Writes the initial start/goal project.
    ///
    /// # Errors
    /// - `EndNotAfterStart` when `end_date <= start_date`.
    /// - `InvalidWeight` for non-positive weights.
    /// - `AlreadyInitialized` when the store already holds a project.
    pub fn initialize_project(&self, setup: &ProjectSetup) -> Result<Project, InitError> {
        if setup.end_date <= setup.start_date {
            return Err(InitError::EndNotAfterStart {
                start: setup.start_date,
                end: setup.end_date,
            });
        }
        for weight in [setup.start_weight, setup.goal_weight] {
            validate_weight(weight).map_err(|_| InitError::InvalidWeight(weight))?;
        }
        if self.store.exists() {
            return Err(InitError::AlreadyInitialized);
        }

        let project = Project::new(
            WeightRecord {
                date: setup.start_date,
                weight: setup.start_weight,
            },
            WeightRecord {
                date: setup.end_date,
                weight: setup.goal_weight,
            },
        )
        .map_err(|err| InitError::Store(StoreError::Corrupt(CorruptReason::Invariant(err))))?;

        self.store.save(&project)?;
        info!(
            "event=project_init module=service status=ok span_days={}",
            (setup.end_date - setup.start_date).num_days()
        );
        Ok(project)
    }

    /// Records `weight` for a raw `DD/MM/YYYY` date string.
    pub fn record_weight_input<F>(
        &self,
        raw_date: &str,
        weight: f64,
        confirm_overwrite: F,
    ) -> Result<RecordOutcome, RecordError>
    where
        F: FnOnce(&WeightRecord, f64) -> bool,
    {
        let date = parse_user_date(raw_date)
            .map_err(|_| RecordError::InvalidDate(raw_date.trim().to_string()))?;
        self.record_weight(date, weight, confirm_overwrite)
    }

    /// Inserts or updates the record for `date`.
    ///
    /// `confirm_overwrite` is called with the stored record and the new weight
    /// only when `date` already exists.
    ///
    /// # Errors
    /// - `InvalidWeight` for non-positive weights.
    /// - `OutOfRange` when `date` is before the start or after the end date.
    /// - `Store` when the project cannot be loaded or saved.
    pub fn record_weight<F>(
        &self,
        date: NaiveDate,
        weight: f64,
        confirm_overwrite: F,
    ) -> Result<RecordOutcome, RecordError>
    where
        F: FnOnce(&WeightRecord, f64) -> bool,
    {
        validate_weight(weight)?;
        let mut project = self.store.load()?;

        if !project.covers(date) {
            warn!("event=record_weight module=service status=rejected reason=out_of_range");
            return Err(RecordError::OutOfRange {
                date,
                start: project.start_date(),
                end: project.end_date(),
            });
        }

        if let Some(existing) = project.get(date).copied() {
            if !confirm_overwrite(&existing, weight) {
                info!("event=record_weight module=service status=declined");
                return Ok(RecordOutcome::DuplicateDeclined(existing));
            }

            let previous_weight = project.replace_weight(date, weight)?.unwrap_or(existing.weight);
            self.store.save(&project)?;
            info!(
                "event=record_weight module=service status=ok action=update rows={}",
                project.len()
            );
            return Ok(RecordOutcome::Updated {
                record: WeightRecord { date, weight },
                previous_weight,
            });
        }

        let record = WeightRecord { date, weight };
        project.insert(record)?;
        self.store.save(&project)?;
        info!(
            "event=record_weight module=service status=ok action=insert rows={}",
            project.len()
        );
        Ok(RecordOutcome::Inserted(record))
    }

    /// Summarizes stored progress.
    pub fn project_summary(&self) -> StoreResult<ProjectSummary> {
        Ok(ProjectSummary::of(&self.store.load()?))
    }
}
