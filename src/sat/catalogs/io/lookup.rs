use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::sat::catalogs::error::{CatalogError, Result};
use crate::sat::catalogs::model::SnapshotKey;

/// Name of the newest snapshot directory under `output`.
///
/// Only directories named by a `YYYYMMDD` date count; among them the greatest
/// name is the latest.
pub fn latest_snapshot(output: &Path) -> Result<String> {
    let mut latest: Option<String> = None;
    for entry in fs::read_dir(output)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !SnapshotKey::parse(&name).is_ok_and(|key| key.as_str() == name) {
            continue;
        }
        if latest.as_ref().is_none_or(|current| name > *current) {
            latest = Some(name);
        }
    }
    latest.ok_or(CatalogError::NoSnapshots)
}

/// Path of a catalog file inside the newest snapshot.
pub fn latest_catalog_path(output: &Path, catalog: &str) -> Result<PathBuf> {
    let snapshot = latest_snapshot(output)?;
    let file_name = if catalog.ends_with(".json") {
        catalog.to_string()
    } else {
        format!("{catalog}.json")
    };
    let path = output.join(&snapshot).join(&file_name);
    if !path.is_file() {
        return Err(CatalogError::CatalogNotFound {
            catalog: file_name,
            snapshot,
        });
    }
    Ok(path)
}

/// Parsed contents of a catalog in the newest snapshot. Older snapshots are
/// never consulted.
pub fn latest_catalog(output: &Path, catalog: &str) -> Result<Value> {
    let path = latest_catalog_path(output, catalog)?;
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
