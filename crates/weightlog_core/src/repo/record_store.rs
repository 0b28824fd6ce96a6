//! Record store contract plus CSV and in-memory implementations.
//!
//! # Responsibility
//! - Load the full weight table and write it back in one piece.
//! - Keep CSV layout details inside the persistence boundary.
//!
//! # Invariants
//! - `save` is a total overwrite with rows sorted ascending by date.
//! - A file save never exposes a half-written table: rows go to a temp file
//!   that is renamed over the target.
//! - `load` rejects corrupt persisted state instead of masking it; rows with
//!   unparsable dates are reported together.

use crate::input::{format_store_date, parse_store_date};
use crate::model::record::{
    validate_weight, Project, RecordValidationError, WeightRecord, MIN_PROJECT_RECORDS,
};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Header of the date column.
pub const DATE_COLUMN: &str = "Data";
/// Header of the weight column.
pub const WEIGHT_COLUMN: &str = "Peso";

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored row that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRow {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub date: String,
    pub weight: String,
}

impl Display for InvalidRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {}: {}={:?} {}={:?}",
            self.row, DATE_COLUMN, self.date, WEIGHT_COLUMN, self.weight
        )
    }
}

/// Why a persisted table was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CorruptReason {
    /// Header is not `Data,Peso`.
    BadHeader(Vec<String>),
    /// One or more rows carry a date that is not `YYYY-MM-DD`.
    InvalidDates(Vec<InvalidRow>),
    /// A row carries a weight that is not a positive number.
    InvalidWeight(InvalidRow),
    /// Fewer than two rows are stored.
    TooFewRecords(usize),
    /// Rows parse, but violate a project invariant (e.g. duplicated dates).
    Invariant(RecordValidationError),
}

impl Display for CorruptReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadHeader(found) => write!(
                f,
                "expected header `{DATE_COLUMN},{WEIGHT_COLUMN}`, found `{}`",
                found.join(",")
            ),
            Self::InvalidDates(rows) => {
                write!(f, "{} row(s) with invalid dates", rows.len())?;
                for row in rows {
                    write!(f, "; {row}")?;
                }
                Ok(())
            }
            Self::InvalidWeight(row) => write!(f, "invalid weight in {row}"),
            Self::TooFewRecords(count) => write!(
                f,
                "at least {MIN_PROJECT_RECORDS} rows are required, found {count}"
            ),
            Self::Invariant(err) => write!(f, "{err}"),
        }
    }
}

/// Record store error for load/save operations.
#[derive(Debug)]
pub enum StoreError {
    /// No project has been created yet at this location.
    NotInitialized(PathBuf),
    Corrupt(CorruptReason),
    Io(io::Error),
    Csv(csv::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized(path) => {
                write!(f, "no weight project found at `{}`", path.display())
            }
            Self::Corrupt(reason) => write!(f, "corrupt weight table: {reason}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::NotInitialized(_) | Self::Corrupt(_) => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for StoreError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<CorruptReason> for StoreError {
    fn from(value: CorruptReason) -> Self {
        Self::Corrupt(value)
    }
}

/// Persistence contract for a single weight project.
pub trait RecordStore {
    /// Returns whether a project has been persisted yet.
    fn exists(&self) -> bool;
    /// Loads the full table as a validated, date-sorted project.
    fn load(&self) -> StoreResult<Project>;
    /// Replaces the stored table with `project`.
    fn save(&self, project: &Project) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn load(&self) -> StoreResult<Project> {
        (**self).load()
    }

    fn save(&self, project: &Project) -> StoreResult<()> {
        (**self).save(project)
    }
}

/// Raw textual row, shared by the CSV layout and the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Peso")]
    pub weight: String,
}

impl StoredRow {
    pub fn new(date: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            weight: weight.into(),
        }
    }

    fn from_record(record: &WeightRecord) -> Self {
        Self {
            date: format_store_date(record.date),
            weight: record.weight.to_string(),
        }
    }
}

/// Interprets raw rows as a project, collecting every row with a bad date.
pub fn parse_rows(rows: &[StoredRow]) -> Result<Project, CorruptReason> {
    let mut invalid_dates = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let invalid = || InvalidRow {
            row: index + 1,
            date: row.date.clone(),
            weight: row.weight.clone(),
        };

        let Some(date) = parse_store_date(&row.date) else {
            invalid_dates.push(invalid());
            continue;
        };
        let weight = row
            .weight
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|weight| validate_weight(*weight).is_ok())
            .ok_or_else(|| CorruptReason::InvalidWeight(invalid()))?;

        records.push(WeightRecord { date, weight });
    }

    if !invalid_dates.is_empty() {
        return Err(CorruptReason::InvalidDates(invalid_dates));
    }
    if records.len() < MIN_PROJECT_RECORDS {
        return Err(CorruptReason::TooFewRecords(records.len()));
    }

    Project::from_records(records).map_err(CorruptReason::Invariant)
}

fn rows_of(project: &Project) -> Vec<StoredRow> {
    project.records().iter().map(StoredRow::from_record).collect()
}

/// CSV file store with a `Data,Peso` header.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> StoreResult<Vec<StoredRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        if headers.len() != 2
            || headers.get(0) != Some(DATE_COLUMN)
            || headers.get(1) != Some(WEIGHT_COLUMN)
        {
            return Err(CorruptReason::BadHeader(
                headers.iter().map(str::to_string).collect(),
            )
            .into());
        }

        let mut rows = Vec::new();
        for row in reader.deserialize::<StoredRow>() {
            rows.push(row?);
        }
        Ok(rows)
    }

    fn write_rows(&self, rows: &[StoredRow]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut staged = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = csv::Writer::from_writer(staged.as_file_mut());
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl RecordStore for CsvRecordStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> StoreResult<Project> {
        let started_at = Instant::now();
        if !self.exists() {
            return Err(StoreError::NotInitialized(self.path.clone()));
        }

        let result = self
            .read_rows()
            .and_then(|rows| parse_rows(&rows).map_err(StoreError::from));
        match &result {
            Ok(project) => debug!(
                "event=store_load module=repo status=ok rows={} duration_ms={}",
                project.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_load module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn save(&self, project: &Project) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.write_rows(&rows_of(project));
        match &result {
            Ok(()) => info!(
                "event=store_save module=repo status=ok rows={} duration_ms={}",
                project.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_save module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

/// In-process store holding rows in their textual form.
///
/// Shares row parsing with the CSV store, so seeded corrupt rows surface the
/// same errors a damaged file would.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: RefCell<Option<Vec<StoredRow>>>,
    saves: Cell<usize>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `project`.
    pub fn with_project(project: &Project) -> Self {
        Self::with_raw_rows(rows_of(project))
    }

    /// Creates a store holding arbitrary rows, valid or not.
    pub fn with_raw_rows(rows: Vec<StoredRow>) -> Self {
        Self {
            rows: RefCell::new(Some(rows)),
            saves: Cell::new(0),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Snapshot of the stored rows, if any.
    pub fn raw_rows(&self) -> Option<Vec<StoredRow>> {
        self.rows.borrow().clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn exists(&self) -> bool {
        self.rows.borrow().is_some()
    }

    fn load(&self) -> StoreResult<Project> {
        match self.rows.borrow().as_deref() {
            Some(rows) => Ok(parse_rows(rows)?),
            None => Err(StoreError::NotInitialized(PathBuf::from(":memory:"))),
        }
    }

    fn save(&self, project: &Project) -> StoreResult<()> {
        *self.rows.borrow_mut() = Some(rows_of(project));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
