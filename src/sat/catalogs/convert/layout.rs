use std::collections::BTreeMap;

use serde::Deserialize;

use crate::sat::catalogs::convert::naming::column_name;
use crate::sat::catalogs::error::SheetError;
use crate::sat::catalogs::model::{Grid, HeaderSet};

/// Suffixes marking a sheet that holds one half of a split table.
pub const PART_MARKERS: [&str; 2] = ["_Parte_1", "_Parte_2"];
/// Sheet whose header spans a super-header and a numeric range sub-header.
pub const RATE_TABLE_SHEET: &str = "c_TasaOCuota";
/// Identifiers forced onto the two range columns of the rate table.
pub const RANGE_COLUMNS: [&str; 2] = ["valor_minimo", "valor_maximo"];
/// Key columns shared by both halves of a split table.
pub const TWO_PART_KEY_WIDTH: usize = 7;

/// Sheets whose embedded title differs from the sheet name.
const TITLE_OVERRIDES: &[(&str, &str)] = &[
    ("C_Colonia_1", "c_colonia"),
    ("C_Colonia_2", "c_colonia"),
    ("C_Colonia_3", "c_colonia"),
];

/// Static lookup tables steering header location and layout resolution.
///
/// The defaults carry the built-in tables; see [`LayoutRules::merge`] for
/// layering a configuration file over them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRules {
    /// Sheet name → title token, consulted before deriving the token.
    pub title_overrides: BTreeMap<String, String>,
    /// Name fragments identifying two-part sheets; stripped from the token.
    pub part_markers: Vec<String>,
    /// The single sheet laid out as a rate table.
    pub rate_table_sheet: String,
    /// Identifiers written over header positions 1 and 2 of the rate table.
    pub range_columns: [String; 2],
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self {
            title_overrides: TITLE_OVERRIDES
                .iter()
                .map(|(sheet, token)| (sheet.to_string(), token.to_string()))
                .collect(),
            part_markers: PART_MARKERS.iter().map(|m| m.to_string()).collect(),
            rate_table_sheet: RATE_TABLE_SHEET.to_string(),
            range_columns: RANGE_COLUMNS.map(String::from),
        }
    }
}

/// Partial rules as read from a configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutRulesPatch {
    #[serde(default)]
    pub title_overrides: BTreeMap<String, String>,
    pub part_markers: Option<Vec<String>>,
    pub rate_table_sheet: Option<String>,
    pub range_columns: Option<[String; 2]>,
}

impl LayoutRules {
    /// Layers a patch over these rules. Overrides are added or replaced one
    /// by one; the other fields are replaced wholesale when present.
    pub fn merge(mut self, patch: LayoutRulesPatch) -> Self {
        self.title_overrides.extend(patch.title_overrides);
        if let Some(markers) = patch.part_markers {
            self.part_markers = markers;
        }
        if let Some(sheet) = patch.rate_table_sheet {
            self.rate_table_sheet = sheet;
        }
        if let Some(columns) = patch.range_columns {
            self.range_columns = columns;
        }
        self
    }

    /// Selects the layout variant for a sheet name.
    pub fn layout_for(&self, sheet_name: &str) -> SheetLayout {
        if self
            .part_markers
            .iter()
            .any(|marker| sheet_name.contains(marker.as_str()))
        {
            SheetLayout::TwoPart
        } else if sheet_name == self.rate_table_sheet {
            SheetLayout::RateTable
        } else {
            SheetLayout::Standard
        }
    }
}

/// How the rows around the title marker are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetLayout {
    /// Title row, then a header row, then data.
    Standard,
    /// The title row is itself the header row and only the shared key
    /// columns are named.
    TwoPart,
    /// The title row is a super-header over a numeric range sub-header.
    ///
    /// Identifiers are read from the title row itself, so column 0 carries
    /// the title text, and positions 1 and 2 are renamed to the range
    /// identifiers. The sub-header row is skipped: data starts two rows
    /// below the title row.
    RateTable,
}

impl SheetLayout {
    /// Offset of the row supplying identifiers, relative to the title row.
    pub fn header_offset(self) -> usize {
        match self {
            SheetLayout::Standard => 1,
            SheetLayout::TwoPart | SheetLayout::RateTable => 0,
        }
    }

    /// Number of leading cells read as identifiers; `None` reads them all.
    pub fn header_width(self) -> Option<usize> {
        match self {
            SheetLayout::TwoPart => Some(TWO_PART_KEY_WIDTH),
            SheetLayout::Standard | SheetLayout::RateTable => None,
        }
    }

    /// Offset of the first data row, relative to the title row.
    pub fn data_offset(self) -> usize {
        match self {
            SheetLayout::TwoPart => 1,
            SheetLayout::Standard | SheetLayout::RateTable => 2,
        }
    }
}

/// Header set and first data row of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub layout: SheetLayout,
    pub headers: HeaderSet,
    pub data_start: usize,
}

/// Resolves the header set and first data row once the title row is known.
///
/// A layout that would start reading past the last row yields
/// [`SheetError::DataStartOutOfRange`].
pub fn resolve_layout(
    rules: &LayoutRules,
    sheet_name: &str,
    title_row: usize,
    grid: &Grid,
) -> Result<ResolvedLayout, SheetError> {
    let layout = rules.layout_for(sheet_name);
    let data_start = title_row + layout.data_offset();
    let header_row = grid
        .row(title_row + layout.header_offset())
        .filter(|_| data_start < grid.len())
        .ok_or(SheetError::DataStartOutOfRange {
            data_start,
            rows: grid.len(),
        })?;

    let width = layout
        .header_width()
        .map_or(header_row.len(), |width| width.min(header_row.len()));
    let mut headers = HeaderSet::new(header_row[..width].iter().map(column_name).collect());

    if layout == SheetLayout::RateTable {
        for (offset, identifier) in rules.range_columns.iter().enumerate() {
            headers.set(offset + 1, identifier);
        }
    }

    Ok(ResolvedLayout {
        layout,
        headers,
        data_start,
    })
}
