//! Goal projection over the recorded weight series.
//!
//! # Responsibility
//! - Fit an ordinary-least-squares line of weight against day offset.
//! - Solve the line for the goal weight and build the projected series.
//! - Describe the chart a plotting surface should render.
//!
//! # Invariants
//! - Day offsets count whole days from the earliest record (the start date).
//! - The goal weight is re-read from the last stored row on every call.
//! - Projection is pure over the loaded snapshot; no I/O during the fit.

use crate::input::format_user_date;
use crate::model::record::{Project, WeightRecord};
use crate::repo::record_store::{CorruptReason, InvalidRow, RecordStore, StoreError};
use chrono::{Days, NaiveDate, TimeDelta};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Projection needs the start, the goal, and at least one measurement.
pub const MIN_PROJECTION_RECORDS: usize = 3;
/// Most whole days the projected series enumerates (100 years).
pub const MAX_SERIES_DAYS: i64 = 36_525;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Which stored rows feed the trend fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrendScope {
    /// Every row except the goal row: only real measurements.
    #[default]
    Measurements,
    /// Every row, the goal row included.
    AllRecords,
}

impl TrendScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "measurements" => Some(Self::Measurements),
            "all" | "all_records" => Some(Self::AllRecords),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Measurements => "measurements",
            Self::AllRecords => "all",
        }
    }

    fn sample(self, project: &Project) -> &[WeightRecord] {
        match self {
            Self::Measurements => project.measurements(),
            Self::AllRecords => project.records(),
        }
    }
}

/// Fitted `weight = slope * day + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    /// kg per day.
    pub slope: f64,
    /// kg at day 0.
    pub intercept: f64,
}

impl TrendLine {
    /// Least-squares fit over `(day, weight)` points.
    ///
    /// Returns `None` with fewer than two points or when every point shares
    /// the same day.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        // Centering y on a sample keeps the covariance exactly zero for
        // equal weights, where `mean_y` may carry rounding error.
        let y0 = points[0].1;
        let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
            let dx = x - mean_x;
            (cov + dx * (y - y0), var + dx * dx)
        });
        if variance == 0.0 {
            return None;
        }

        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, day: f64) -> f64 {
        self.slope * day + self.intercept
    }

    /// Day offset at which the line reaches `weight`; `None` for a flat line.
    pub fn day_for_weight(&self, weight: f64) -> Option<f64> {
        if self.slope == 0.0 {
            None
        } else {
            Some((weight - self.intercept) / self.slope)
        }
    }
}

/// One point of the projected trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub day_offset: i64,
    pub date: NaiveDate,
    pub weight: f64,
}

/// Outcome of a successful projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub trend: TrendLine,
    pub scope: TrendScope,
    /// Day 0 of the offsets (earliest stored date).
    pub origin: NaiveDate,
    /// Goal weight read from the last row.
    pub target_weight: f64,
    /// Fractional day offset at which the trend meets the goal.
    pub target_day: f64,
    /// Calendar day containing `origin + target_day`.
    pub predicted_date: NaiveDate,
    /// Whole-day points `0..=floor(target_day)`; empty when `target_day < 0`.
    pub series: Vec<ProjectedPoint>,
}

impl Forecast {
    /// False when the goal crossing lies before the start date, i.e. the
    /// trend moves away from the goal.
    pub fn is_moving_toward_goal(&self) -> bool {
        self.target_day >= 0.0
    }

    /// One-line human-readable forecast.
    pub fn headline(&self) -> String {
        if self.is_moving_toward_goal() {
            format!(
                "At this pace you will reach {}kg on {}",
                self.target_weight,
                format_user_date(self.predicted_date)
            )
        } else {
            format!(
                "The current trend moves away from {}kg (it crossed that weight on {})",
                self.target_weight,
                format_user_date(self.predicted_date)
            )
        }
    }

    /// Chart description for a plotting surface.
    pub fn chart(&self, project: &Project) -> ChartSpec {
        ChartSpec {
            title: "Weight trend with projection".to_string(),
            x_label: "Date".to_string(),
            y_label: "Weight (kg)".to_string(),
            caption: format!(
                "Goal expected on {}",
                format_user_date(self.predicted_date)
            ),
            actual: ChartSeries {
                label: "Actual weight".to_string(),
                points: project
                    .measurements()
                    .iter()
                    .map(|record| (record.date, record.weight))
                    .collect(),
            },
            projection: ChartSeries {
                label: "Projection".to_string(),
                points: self
                    .series
                    .iter()
                    .map(|point| (point.date, point.weight))
                    .collect(),
            },
            goal_line: GoalLine {
                label: format!("Goal {}kg", self.target_weight),
                weight: self.target_weight,
            },
        }
    }
}

/// Labeled `(date, kg)` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Horizontal reference line at the goal weight.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalLine {
    pub label: String,
    pub weight: f64,
}

/// Everything a plotting surface needs to draw the progress chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub caption: String,
    pub actual: ChartSeries,
    pub projection: ChartSeries,
    pub goal_line: GoalLine,
}

/// Reasons a forecast cannot be produced.
#[derive(Debug)]
pub enum ProjectionError {
    InsufficientData { records: usize },
    /// Stored rows whose dates do not parse.
    CorruptDates(Vec<InvalidRow>),
    /// Zero slope; the goal date is undefined.
    FlatTrend { weight: f64 },
    /// The goal crossing is not a usable calendar date.
    HorizonOutOfRange { target_day: f64 },
    Store(StoreError),
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { records } => write!(
                f,
                "at least one measurement besides the start and goal records is needed (found {records} records)"
            ),
            Self::CorruptDates(rows) => {
                write!(f, "{} stored row(s) have invalid dates", rows.len())
            }
            Self::FlatTrend { weight } => write!(
                f,
                "weight is flat at {weight:.1}kg; the goal date cannot be projected"
            ),
            Self::HorizonOutOfRange { target_day } => write!(
                f,
                "the goal would be reached {target_day:.0} days from the start, beyond the projection horizon"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ProjectionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Corrupt(CorruptReason::InvalidDates(rows)) => Self::CorruptDates(rows),
            other => Self::Store(other),
        }
    }
}

/// Projects the goal attainment date for `project`.
///
/// # Errors
/// - `InsufficientData` with fewer than three records.
/// - `FlatTrend` when the fitted slope is exactly zero.
/// - `HorizonOutOfRange` when the crossing is not finite or falls outside
///   the representable calendar.
///
/// The projected series stops after `MAX_SERIES_DAYS` days even when the
/// crossing lies further out.
pub fn project_goal(project: &Project, scope: TrendScope) -> Result<Forecast, ProjectionError> {
    if project.len() < MIN_PROJECTION_RECORDS {
        return Err(ProjectionError::InsufficientData {
            records: project.len(),
        });
    }

    let origin = project.start_date();
    let points: Vec<(f64, f64)> = scope
        .sample(project)
        .iter()
        .map(|record| ((record.date - origin).num_days() as f64, record.weight))
        .collect();

    let trend = TrendLine::fit(&points).ok_or(ProjectionError::InsufficientData {
        records: project.len(),
    })?;
    debug!(
        "event=trend_fit module=projection scope={} points={} slope={} intercept={}",
        scope.as_str(),
        points.len(),
        trend.slope,
        trend.intercept
    );

    let target_weight = project.goal_weight();
    let target_day = trend
        .day_for_weight(target_weight)
        .ok_or(ProjectionError::FlatTrend {
            weight: trend.intercept,
        })?;
    let predicted_date = date_at_offset(origin, target_day)
        .ok_or(ProjectionError::HorizonOutOfRange { target_day })?;
    let series = projected_series(origin, &trend, target_day)
        .ok_or(ProjectionError::HorizonOutOfRange { target_day })?;

    Ok(Forecast {
        trend,
        scope,
        origin,
        target_weight,
        target_day,
        predicted_date,
        series,
    })
}

/// Calendar day containing `origin + offset` fractional days.
fn date_at_offset(origin: NaiveDate, offset: f64) -> Option<NaiveDate> {
    let millis = (offset * MILLIS_PER_DAY).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let millis = millis as i64;
    let delta = TimeDelta::try_milliseconds(millis)?;
    origin
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(delta)
        .map(|instant| instant.date())
}

fn projected_series(
    origin: NaiveDate,
    trend: &TrendLine,
    target_day: f64,
) -> Option<Vec<ProjectedPoint>> {
    if target_day < 0.0 {
        return Some(Vec::new());
    }

    let last = (target_day.floor() as i64).min(MAX_SERIES_DAYS);
    (0..=last)
        .map(|day| {
            let date = origin.checked_add_days(Days::new(day as u64))?;
            Some(ProjectedPoint {
                day_offset: day,
                date,
                weight: trend.predict(day as f64),
            })
        })
        .collect()
}

/// Projection use-case service over a record store.
pub struct ProjectionService<S: RecordStore> {
    store: S,
    scope: TrendScope,
}

impl<S: RecordStore> ProjectionService<S> {
    pub fn new(store: S) -> Self {
        Self::with_scope(store, TrendScope::default())
    }

    pub fn with_scope(store: S, scope: TrendScope) -> Self {
        Self { store, scope }
    }

    /// Loads the current project and projects it.
    ///
    /// Corrupt stored dates surface as `ProjectionError::CorruptDates` with
    /// the offending rows.
    pub fn forecast(&self) -> Result<(Project, Forecast), ProjectionError> {
        let project = self.store.load()?;
        match project_goal(&project, self.scope) {
            Ok(forecast) => {
                info!(
                    "event=forecast module=projection status=ok scope={} records={} target_day={:.2}",
                    self.scope.as_str(),
                    project.len(),
                    forecast.target_day
                );
                Ok((project, forecast))
            }
            Err(err) => {
                warn!(
                    "event=forecast module=projection status=error records={} error={}",
                    project.len(),
                    err
                );
                Err(err)
            }
        }
    }
}
