use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error type covering the failures that abort a whole run or a lookup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the spreadsheet reader.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Errors bubbled up from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when the workbook cannot be interpreted at all.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when no catalog date can be derived from a file name or argument.
    #[error("cannot derive a catalog date from '{0}'")]
    InvalidSnapshotName(String),

    /// Raised when no catalog file could be found or downloaded in the search window.
    #[error("no catalog file available in the last {days} days")]
    CatalogUnavailable { days: u32 },

    /// Raised when the output directory holds no snapshot directories.
    #[error("no data directories found")]
    NoSnapshots,

    /// Raised when the latest snapshot lacks the requested catalog.
    #[error("catalog {catalog} not found in latest data ({snapshot})")]
    CatalogNotFound { catalog: String, snapshot: String },

    /// Raised when a sheet name cannot be used as a file name.
    #[error("sheet name '{0}' is not a plain file name")]
    InvalidSheetName(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Reasons a single sheet is left out of a snapshot. These never abort the
/// workbook loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// The sheet has no non-blank rows.
    #[error("sheet has no usable rows")]
    EmptySheet,

    /// The reader could not decode the sheet's cells.
    #[error("sheet could not be read: {reason}")]
    Unreadable { reason: String },

    /// The sheet name would not stay inside the snapshot directory.
    #[error("sheet name is not a plain file name")]
    InvalidSheetName,

    /// No row starts with the sheet's title token.
    #[error("title '{token}' not found in the first column")]
    HeaderNotFound { token: String },

    /// The layout places the first data row past the end of the grid.
    #[error("data would start at row {data_start} but the sheet has {rows} rows")]
    DataStartOutOfRange { data_start: usize, rows: usize },

    /// Storing the converted records failed.
    #[error("records could not be stored: {reason}")]
    WriteFailed { reason: String },
}
