use crate::sat::catalogs::error::SheetError;
use crate::sat::catalogs::model::{Grid, Row, Worksheet};

/// Builds the working grid of a sheet.
///
/// Rows whose cells are all blank are dropped and every remaining row loses
/// its trailing blank cells, so row lengths vary. A sheet left with no rows
/// is reported as [`SheetError::EmptySheet`]; one the reader failed on as
/// [`SheetError::Unreadable`].
pub fn load_grid(sheet: &Worksheet) -> Result<Grid, SheetError> {
    if let Some(reason) = &sheet.read_error {
        return Err(SheetError::Unreadable {
            reason: reason.clone(),
        });
    }
    let rows: Vec<Row> = sheet.rows.iter().filter_map(trim_row).collect();
    if rows.is_empty() {
        return Err(SheetError::EmptySheet);
    }
    Ok(Grid::from_rows(rows))
}

fn trim_row(row: &Row) -> Option<Row> {
    let width = row.iter().rposition(|cell| !cell.is_blank())? + 1;
    Some(row[..width].to_vec())
}
