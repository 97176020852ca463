//! Format-agnostic tables: the shape inputs arrive in and outputs leave in.
//!
//! Adapters (spreadsheet readers, query runners, report writers) convert
//! to and from these types; the engine never touches files.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Empty cells and whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render as a key string. Whole numbers drop the fractional part so a
    /// plant read as `2674.0` keys the same as the text `"2674"`.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Read as a number. `Ok(None)` for blanks; anything present but not
    /// numeric comes back as `Err` carrying the rendered cell.
    ///
    /// Commas are accepted only as thousands separators (`1,250.5`); a
    /// decimal comma such as `1,5` is rejected.
    pub fn as_number(&self) -> Result<Option<f64>, String> {
        match self {
            Self::Empty => Ok(None),
            Self::Number(n) if n.is_finite() => Ok(Some(*n)),
            Self::Number(n) => Err(n.to_string()),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                let digits = if !trimmed.contains(',') {
                    trimmed.to_string()
                } else if is_thousands_grouped(trimmed) {
                    trimmed.replace(',', "")
                } else {
                    return Err(s.clone());
                };
                digits
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Some)
                    .ok_or_else(|| s.clone())
            }
            Self::Bool(_) | Self::Date(_) => Err(self.to_key_string()),
        }
    }

    /// Coerce to a calendar date. Never fails: anything unreadable is `None`.
    ///
    /// Text is tried against `formats` in order (date-time formats keep the
    /// date part). Numbers are read as spreadsheet serial dates.
    pub fn as_date(&self, formats: &[String]) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_date_text(s.trim(), formats),
            Self::Number(n) => serial_to_date(*n),
            Self::Empty | Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            other => write!(f, "{}", other.to_key_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

fn is_thousands_grouped(s: &str) -> bool {
    static GROUPED: OnceLock<Option<Regex>> = OnceLock::new();
    GROUPED
        .get_or_init(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

fn parse_date_text(s: &str, formats: &[String]) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    for fmt in formats {
        if fmt.contains("%H") {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        } else if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Spreadsheet serial day number (1900 date system, 1 = 1900-01-01).
///
/// The 1900 system counts a nonexistent 1900-02-29 as serial 60, so that
/// serial has no date and serials from 61 on are shifted by one day.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Upper bound is 9999-12-31.
    if !serial.is_finite() || serial < 1.0 || serial >= 2_958_466.0 {
        return None;
    }
    let day = serial.trunc() as i64;
    let epoch = match day {
        1..=59 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        60 => return None,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };
    epoch.checked_add_signed(Duration::days(day))
}

// ---------------------------------------------------------------------------
// Input tables
// ---------------------------------------------------------------------------

/// A loaded input table: header row plus typed data rows.
///
/// Rows shorter than the header are treated as padded with `Empty`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Trim surrounding whitespace from every header.
    pub fn normalize_columns(&mut self) {
        for col in &mut self.columns {
            let trimmed = col.trim();
            if trimmed.len() != col.len() {
                *col = trimmed.to_string();
            }
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }
}

// ---------------------------------------------------------------------------
// Output tables
// ---------------------------------------------------------------------------

/// One named output table, ready for a sink (one sheet, one file, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl NamedTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}
