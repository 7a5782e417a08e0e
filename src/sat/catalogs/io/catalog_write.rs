use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::sat::catalogs::error::{CatalogError, Result};
use crate::sat::catalogs::model::{Record, SnapshotKey};

/// Result of handing a sheet's records to a [`CatalogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    AlreadyPresent,
}

/// Persistence boundary for converted sheets.
///
/// Implementations must never replace a sheet that is already stored for a
/// snapshot.
pub trait CatalogSink {
    /// Readies storage for a snapshot. Called once per run; a failure here
    /// aborts the run.
    fn prepare(&self, snapshot: &SnapshotKey) -> Result<()>;

    /// Whether the sheet has already been stored under the snapshot.
    fn contains(&self, snapshot: &SnapshotKey, sheet: &str) -> bool;

    /// Stores the records unless the sheet is already present.
    fn write(&self, snapshot: &SnapshotKey, sheet: &str, records: &[Record]) -> Result<WriteOutcome>;
}

/// Whether a sheet name is a single plain path component, safe to use as a
/// file name inside the snapshot directory.
pub fn is_plain_sheet_name(sheet: &str) -> bool {
    let mut components = Path::new(sheet).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == sheet
    )
}

/// Stores each sheet as `<root>/<snapshot>/<sheet>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_dir(&self, snapshot: &SnapshotKey) -> PathBuf {
        self.root.join(snapshot.as_str())
    }

    pub fn sheet_path(&self, snapshot: &SnapshotKey, sheet: &str) -> PathBuf {
        self.snapshot_dir(snapshot).join(format!("{sheet}.json"))
    }
}

impl CatalogSink for DirectoryCatalog {
    fn prepare(&self, snapshot: &SnapshotKey) -> Result<()> {
        fs::create_dir_all(self.snapshot_dir(snapshot))?;
        Ok(())
    }

    fn contains(&self, snapshot: &SnapshotKey, sheet: &str) -> bool {
        is_plain_sheet_name(sheet) && self.sheet_path(snapshot, sheet).exists()
    }

    fn write(&self, snapshot: &SnapshotKey, sheet: &str, records: &[Record]) -> Result<WriteOutcome> {
        if !is_plain_sheet_name(sheet) {
            return Err(CatalogError::InvalidSheetName(sheet.to_string()));
        }
        let bytes = to_pretty_json(records)?;
        self.prepare(snapshot)?;
        let path = self.sheet_path(snapshot, sheet);

        // create_new keeps the existence check and the creation atomic.
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "sheet already written");
                return Ok(WriteOutcome::AlreadyPresent);
            }
            Err(error) => return Err(error.into()),
        };

        if let Err(error) = file.write_all(&bytes).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(error.into());
        }
        Ok(WriteOutcome::Written)
    }
}

/// Serialises records with four-space indentation.
pub fn to_pretty_json(records: &[Record]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    Ok(bytes)
}
