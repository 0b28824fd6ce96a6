//! Boundary normalization for raw user input.
//!
//! # Responsibility
//! - Turn prompt strings into typed dates and weights.
//! - Render dates in the user-facing and storage formats.
//!
//! # Invariants
//! - User dates are day/month/year (`DD/MM/YYYY`).
//! - Stored dates are ISO (`YYYY-MM-DD`).
//! - Weights accept both `,` and `.` as decimal separator.

use crate::model::record::validate_weight;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Display format used in prompts and reports.
pub const USER_DATE_FORMAT: &str = "%d/%m/%Y";
/// Canonical format of the persisted `Data` column.
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%d";

static USER_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid user date regex"));
static STORE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid store date regex"));

pub type InputResult<T> = Result<T, InputError>;

/// Parse failures for raw user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Date is not a real `DD/MM/YYYY` calendar day.
    InvalidDate(String),
    /// Weight is not a positive decimal number.
    InvalidWeight(String),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(raw) => write!(f, "invalid date `{raw}`; use DD/MM/YYYY"),
            Self::InvalidWeight(raw) => {
                write!(f, "invalid weight `{raw}`; use a positive number of kg")
            }
        }
    }
}

impl Error for InputError {}

/// Parses a `DD/MM/YYYY` date typed by the user.
pub fn parse_user_date(raw: &str) -> InputResult<NaiveDate> {
    let trimmed = raw.trim();
    let caps = USER_DATE_RE
        .captures(trimmed)
        .ok_or_else(|| InputError::InvalidDate(trimmed.to_string()))?;

    let component = |index: usize| caps.get(index).map(|m| m.as_str()).unwrap_or_default();
    let day = component(1).parse::<u32>();
    let month = component(2).parse::<u32>();
    let year = component(3).parse::<i32>();

    match (year, month, day) {
        (Ok(year), Ok(month), Ok(day)) => NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| InputError::InvalidDate(trimmed.to_string())),
        _ => Err(InputError::InvalidDate(trimmed.to_string())),
    }
}

/// Parses an ISO `YYYY-MM-DD` date as stored on disk.
///
/// Returns `None` for anything else; the store decides how to report it.
pub fn parse_store_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !STORE_DATE_RE.is_match(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, STORE_DATE_FORMAT).ok()
}

/// Parses a weight in kg, accepting `,` or `.` as decimal separator.
pub fn parse_weight(raw: &str) -> InputResult<f64> {
    let normalized = raw.trim().replace(',', ".");
    let weight = normalized
        .parse::<f64>()
        .map_err(|_| InputError::InvalidWeight(raw.trim().to_string()))?;
    validate_weight(weight).map_err(|_| InputError::InvalidWeight(raw.trim().to_string()))?;
    Ok(weight)
}

/// Interprets a yes/no confirmation answer.
///
/// Only an explicit yes confirms; anything else counts as a decline.
pub fn parse_confirmation(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

pub fn format_user_date(date: NaiveDate) -> String {
    date.format(USER_DATE_FORMAT).to_string()
}

pub fn format_store_date(date: NaiveDate) -> String {
    date.format(STORE_DATE_FORMAT).to_string()
}
