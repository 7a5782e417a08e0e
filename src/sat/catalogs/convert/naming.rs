use unicode_normalization::UnicodeNormalization as _;
use unicode_normalization::char::is_combining_mark;

use crate::sat::catalogs::model::CellValue;

/// Normalises a raw header label into a stable column identifier.
///
/// The label is trimmed, lowercased, stripped of diacritics and every run of
/// whitespace becomes a single underscore: `"Descripción del Uso"` →
/// `"descripcion_del_uso"`. Blank cells yield the empty identifier.
pub fn column_name(cell: &CellValue) -> String {
    normalize_label(&cell.to_text())
}

/// Text form of [`column_name`].
pub fn normalize_label(label: &str) -> String {
    let stripped: String = label
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join("_")
}
