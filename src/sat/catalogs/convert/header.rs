use crate::sat::catalogs::convert::layout::LayoutRules;
use crate::sat::catalogs::error::SheetError;
use crate::sat::catalogs::model::Grid;

/// Title token the sheet is expected to carry in its first column.
///
/// An entry in the override table wins; otherwise the part markers are
/// removed from the sheet name and the rest is lowercased.
pub fn title_token(rules: &LayoutRules, sheet_name: &str) -> String {
    if let Some(token) = rules.title_overrides.get(sheet_name) {
        return token.to_lowercase();
    }
    rules
        .part_markers
        .iter()
        .fold(sheet_name.to_string(), |name, marker| {
            name.replacen(marker.as_str(), "", 1)
        })
        .to_lowercase()
}

/// Index of the first row whose first cell reads as the sheet's title token.
pub fn locate_header(
    rules: &LayoutRules,
    sheet_name: &str,
    grid: &Grid,
) -> Result<usize, SheetError> {
    let token = title_token(rules, sheet_name);
    grid.rows()
        .iter()
        .position(|row| {
            row.first()
                .is_some_and(|cell| cell.to_text().trim().to_lowercase() == token)
        })
        .ok_or(SheetError::HeaderNotFound { token })
}
