//! Turns one worksheet into a list of records.
//!
//! The stages run in a fixed order: [`grid::load_grid`] drops blank rows,
//! [`header::locate_header`] finds the title row, [`layout::resolve_layout`]
//! picks the header set and first data row, and [`records::materialize`]
//! builds the records.

pub mod grid;
pub mod header;
pub mod layout;
pub mod naming;
pub mod records;

use tracing::{debug, instrument};

use crate::sat::catalogs::error::SheetError;
use crate::sat::catalogs::model::{Record, Worksheet};

pub use layout::{LayoutRules, LayoutRulesPatch, SheetLayout};

/// Converts a worksheet into its records, or the reason it has none.
#[instrument(level = "debug", skip_all, fields(sheet = %sheet.name))]
pub fn convert_sheet(rules: &LayoutRules, sheet: &Worksheet) -> Result<Vec<Record>, SheetError> {
    let grid = grid::load_grid(sheet)?;
    let title_row = header::locate_header(rules, &sheet.name, &grid)?;
    let resolved = layout::resolve_layout(rules, &sheet.name, title_row, &grid)?;
    debug!(
        title_row,
        data_start = resolved.data_start,
        layout = ?resolved.layout,
        columns = resolved.headers.len(),
        "resolved sheet layout"
    );
    Ok(records::materialize(
        &resolved.headers,
        &grid.rows()[resolved.data_start..],
    ))
}
