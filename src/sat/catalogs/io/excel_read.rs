use std::path::Path;

use calamine::{DataType, Range, Reader, open_workbook_auto};
use tracing::{debug, instrument, warn};

use crate::sat::catalogs::error::{CatalogError, Result};
use crate::sat::catalogs::model::{CellValue, Row, Workbook, Worksheet};

/// Reads every sheet of an `.xls` or `.xlsx` workbook, in workbook order.
///
/// Sheets whose cell range cannot be decoded are kept as unreadable entries
/// so they are reported alongside the others.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    if !path.exists() {
        return Err(CatalogError::MissingInput(path.to_path_buf()));
    }
    let mut workbook = open_workbook_auto(path)?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_owned() {
        match workbook.worksheet_range(&name) {
            Some(Ok(range)) => {
                let rows = range_to_rows(&range);
                debug!(sheet = %name, rows = rows.len(), "read worksheet");
                sheets.push(Worksheet::new(name, rows));
            }
            Some(Err(error)) => {
                warn!(sheet = %name, %error, "unreadable worksheet");
                sheets.push(Worksheet::unreadable(name, error.to_string()));
            }
            None => {
                warn!(sheet = %name, "worksheet listed but missing");
                sheets.push(Worksheet::unreadable(name, "worksheet missing from workbook"));
            }
        }
    }

    if sheets.is_empty() {
        return Err(CatalogError::InvalidWorkbook(format!(
            "no sheets in {}",
            path.display()
        )));
    }
    Ok(Workbook { sheets })
}

fn range_to_rows(range: &Range<DataType>) -> Vec<Row> {
    range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect()
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::DateTime(serial) => CellValue::Number(*serial),
        DataType::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}
