//! Weight record and project domain model.
//!
//! # Responsibility
//! - Define the `(date, weight)` observation shared by store, mutator and
//!   projector.
//! - Own the ordering and boundary invariants of a weight project.
//!
//! # Invariants
//! - A project holds at least two records: the start record first and the
//!   goal record last.
//! - Records are sorted ascending by date and no two share a date.
//! - Every intermediate date lies strictly between start and end dates.
//! - Every weight is finite and strictly positive (kg).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum number of records a persisted project may hold.
pub const MIN_PROJECT_RECORDS: usize = 2;

/// One weight observation in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    /// Calendar day of the observation.
    pub date: NaiveDate,
    /// Weight in kg.
    pub weight: f64,
}

impl WeightRecord {
    /// Creates a record after checking the weight is a positive number.
    pub fn new(date: NaiveDate, weight: f64) -> Result<Self, RecordValidationError> {
        validate_weight(weight)?;
        Ok(Self { date, weight })
    }
}

/// Validation failures for records and projects.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    /// Weight is NaN, infinite, zero or negative.
    InvalidWeight(f64),
    /// Fewer than two records were supplied.
    TooFewRecords(usize),
    /// The goal date is not strictly after the start date.
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },
    /// Two records share the same date.
    DuplicateDate(NaiveDate),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWeight(weight) => {
                write!(f, "weight must be a positive number of kg, got {weight}")
            }
            Self::TooFewRecords(count) => write!(
                f,
                "a project needs at least {MIN_PROJECT_RECORDS} records, found {count}"
            ),
            Self::EndNotAfterStart { start, end } => {
                write!(f, "end date {end} must be after start date {start}")
            }
            Self::DuplicateDate(date) => write!(f, "date {date} appears more than once"),
        }
    }
}

impl Error for RecordValidationError {}

/// Checks that `weight` is usable as a measurement in kg.
pub fn validate_weight(weight: f64) -> Result<(), RecordValidationError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(RecordValidationError::InvalidWeight(weight))
    }
}

/// Ordered weight table bounded by a start record and a goal record.
///
/// Construct through [`Project::new`] or [`Project::from_records`]; both
/// establish the ordering invariants, so every other API can index the first
/// and last rows without checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeightRecord>", into = "Vec<WeightRecord>")]
pub struct Project {
    records: Vec<WeightRecord>,
}

impl Project {
    /// Creates a fresh two-record project from start and goal records.
    pub fn new(start: WeightRecord, goal: WeightRecord) -> Result<Self, RecordValidationError> {
        Self::from_records(vec![start, goal])
    }

    /// Builds a project from records in any order.
    ///
    /// The input is sorted by date first; the earliest row becomes the start
    /// record and the latest the goal record.
    pub fn from_records(mut records: Vec<WeightRecord>) -> Result<Self, RecordValidationError> {
        records.sort_by_key(|record| record.date);
        let project = Self { records };
        project.validate()?;
        Ok(project)
    }

    /// Re-checks every project invariant.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.records.len() < MIN_PROJECT_RECORDS {
            return Err(RecordValidationError::TooFewRecords(self.records.len()));
        }

        for record in &self.records {
            validate_weight(record.weight)?;
        }

        for pair in self.records.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(RecordValidationError::DuplicateDate(pair[0].date));
            }
        }

        let start = self.start_date();
        let end = self.end_date();
        if end <= start {
            return Err(RecordValidationError::EndNotAfterStart { start, end });
        }

        Ok(())
    }

    pub fn records(&self) -> &[WeightRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed project; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn start(&self) -> &WeightRecord {
        &self.records[0]
    }

    pub fn goal(&self) -> &WeightRecord {
        &self.records[self.records.len() - 1]
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start().date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.goal().date
    }

    /// Goal weight as currently stored in the last row.
    ///
    /// Remeasuring the end date rewrites this value.
    pub fn goal_weight(&self) -> f64 {
        self.goal().weight
    }

    /// Every record except the goal row, in date order.
    pub fn measurements(&self) -> &[WeightRecord] {
        &self.records[..self.records.len() - 1]
    }

    /// Returns whether `date` falls inside `[start, end]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date()
    }

    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.records
            .binary_search_by_key(&date, |record| record.date)
            .ok()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.position_of(date).is_some()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&WeightRecord> {
        self.position_of(date).map(|index| &self.records[index])
    }

    /// Inserts a record for a date not yet present, keeping date order.
    ///
    /// # Errors
    /// - `DuplicateDate` when the date already exists.
    /// - `InvalidWeight` for unusable weights.
    ///
    /// Callers are responsible for the `[start, end]` range check, since a
    /// record outside it would silently become the new start or goal row.
    pub(crate) fn insert(&mut self, record: WeightRecord) -> Result<(), RecordValidationError> {
        validate_weight(record.weight)?;
        match self
            .records
            .binary_search_by_key(&record.date, |existing| existing.date)
        {
            Ok(_) => Err(RecordValidationError::DuplicateDate(record.date)),
            Err(index) => {
                self.records.insert(index, record);
                Ok(())
            }
        }
    }

    /// Replaces the weight of the record at `date` and returns the old value.
    pub(crate) fn replace_weight(
        &mut self,
        date: NaiveDate,
        weight: f64,
    ) -> Result<Option<f64>, RecordValidationError> {
        validate_weight(weight)?;
        Ok(self.position_of(date).map(|index| {
            let previous = self.records[index].weight;
            self.records[index].weight = weight;
            previous
        }))
    }
}

impl TryFrom<Vec<WeightRecord>> for Project {
    type Error = RecordValidationError;

    fn try_from(value: Vec<WeightRecord>) -> Result<Self, Self::Error> {
        Self::from_records(value)
    }
}

impl From<Project> for Vec<WeightRecord> {
    fn from(value: Project) -> Self {
        value.records
    }
}
