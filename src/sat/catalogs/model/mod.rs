use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sat::catalogs::error::{CatalogError, Result};

/// Represents a raw worksheet cell as read from the source workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    /// Plain text cell.
    Text(String),
    /// Numeric cell. Date cells arrive as their serial number.
    Number(f64),
    /// Boolean cell.
    Boolean(bool),
    /// Absent or blank cell.
    Empty,
}

impl CellValue {
    /// Returns `true` for absent cells and zero-length text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as text. Integral numbers drop their fractional part
    /// so that a code stored as `1.0` reads as `"1"`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Boolean(value) => value.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Converts the cell into the JSON value persisted in a record.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Text(value) => Value::String(value.clone()),
            CellValue::Number(value) => number_to_json(*value),
            CellValue::Boolean(value) => Value::Bool(*value),
            CellValue::Empty => Value::Null,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64
}

fn format_number(value: f64) -> String {
    if is_integral(value) {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn number_to_json(value: f64) -> Value {
    if is_integral(value) {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// An ordered sequence of cells. Rows of one sheet may differ in length.
pub type Row = Vec<CellValue>;

/// A worksheet exactly as the reader produced it, blank rows included.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    pub name: String,
    pub rows: Vec<Row>,
    /// Set when the reader listed the sheet but could not decode it.
    pub read_error: Option<String>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
            read_error: None,
        }
    }

    pub fn unreadable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            read_error: Some(reason.into()),
        }
    }
}

/// All sheets of a source workbook in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Worksheet>,
}

/// Non-blank rows of a sheet with trailing empty cells removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    pub(crate) fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Normalised column identifiers in column order.
///
/// The identifiers apply to the first `len()` columns of every data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    columns: Vec<String>,
}

impl HeaderSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Replaces the identifier at `index`, padding with empty identifiers
    /// when the set is shorter.
    pub fn set(&mut self, index: usize, identifier: &str) {
        if self.columns.len() <= index {
            self.columns.resize(index + 1, String::new());
        }
        self.columns[index] = identifier.to_string();
    }
}

/// One materialised row: column identifier → scalar value, in header order.
pub type Record = serde_json::Map<String, Value>;

/// Date key naming a snapshot directory, formatted `YYYYMMDD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y%m%d").to_string())
    }

    /// Parses a bare `YYYYMMDD` key.
    pub fn parse(value: &str) -> Result<Self> {
        let digits = value.trim();
        if digits.len() != 8 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(CatalogError::InvalidSnapshotName(value.to_string()));
        }
        NaiveDate::parse_from_str(digits, "%Y%m%d")
            .map(Self::from_date)
            .map_err(|_| CatalogError::InvalidSnapshotName(value.to_string()))
    }

    /// Extracts the key embedded at the end of a catalog file name such as
    /// `catCFDI_V_4_20251110.xls`.
    pub fn from_file_name(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| CatalogError::InvalidSnapshotName(path.display().to_string()))?;
        let digits = stem
            .rsplit('_')
            .next()
            .ok_or_else(|| CatalogError::InvalidSnapshotName(stem.to_string()))?;
        Self::parse(digits).map_err(|_| CatalogError::InvalidSnapshotName(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
