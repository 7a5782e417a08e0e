use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::sat::catalogs::convert::{LayoutRules, LayoutRulesPatch, convert_sheet};
use crate::sat::catalogs::error::{Result, SheetError};
use crate::sat::catalogs::io::catalog_write::{
    CatalogSink, DirectoryCatalog, WriteOutcome, is_plain_sheet_name,
};
use crate::sat::catalogs::io::excel_read;
use crate::sat::catalogs::io::fetch::{self, CatalogSource, Downloader};
use crate::sat::catalogs::model::{SnapshotKey, Workbook, Worksheet};

/// What happened to one sheet during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    /// Records were converted and stored.
    Written { records: usize },
    /// The snapshot already held this sheet; nothing was converted.
    AlreadyPresent,
    /// The sheet produced no output.
    Skipped(SheetError),
}

/// Per-sheet outcomes of a run, in workbook order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub snapshot: SnapshotKey,
    pub outcomes: Vec<(String, SheetOutcome)>,
}

impl ConversionReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Sheets present in the snapshot after the run.
    pub fn processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, SheetOutcome::Skipped(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.total() - self.processed()
    }

    pub fn outcome(&self, sheet: &str) -> Option<&SheetOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, outcome)| outcome)
    }
}

/// Converts every sheet of a workbook into the snapshot, one sheet at a time.
///
/// A sheet that cannot be converted or stored is recorded as skipped and the
/// loop moves on. Only failing to prepare the snapshot aborts the run.
#[instrument(level = "info", skip_all, fields(snapshot = %snapshot))]
pub fn convert_workbook(
    rules: &LayoutRules,
    workbook: &Workbook,
    snapshot: &SnapshotKey,
    sink: &dyn CatalogSink,
) -> Result<ConversionReport> {
    sink.prepare(snapshot)?;
    let mut outcomes = Vec::with_capacity(workbook.sheets.len());

    for sheet in &workbook.sheets {
        info!(sheet = %sheet.name, "processing sheet");
        let outcome = match store_sheet(rules, sheet, snapshot, sink) {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(sheet = %sheet.name, %reason, "skipping sheet");
                SheetOutcome::Skipped(reason)
            }
        };
        outcomes.push((sheet.name.clone(), outcome));
    }

    let report = ConversionReport {
        snapshot: snapshot.clone(),
        outcomes,
    };
    info!(
        processed = report.processed(),
        total = report.total(),
        "processed {} of {} sheets",
        report.processed(),
        report.total()
    );
    Ok(report)
}

fn store_sheet(
    rules: &LayoutRules,
    sheet: &Worksheet,
    snapshot: &SnapshotKey,
    sink: &dyn CatalogSink,
) -> std::result::Result<SheetOutcome, SheetError> {
    if !is_plain_sheet_name(&sheet.name) {
        return Err(SheetError::InvalidSheetName);
    }
    if sink.contains(snapshot, &sheet.name) {
        debug!(sheet = %sheet.name, "already converted");
        return Ok(SheetOutcome::AlreadyPresent);
    }

    let records = convert_sheet(rules, sheet)?;
    let written = sink
        .write(snapshot, &sheet.name, &records)
        .map_err(|error| SheetError::WriteFailed {
            reason: error.to_string(),
        })?;
    Ok(match written {
        WriteOutcome::Written => {
            info!(sheet = %sheet.name, records = records.len(), "sheet written");
            SheetOutcome::Written {
                records: records.len(),
            }
        }
        WriteOutcome::AlreadyPresent => SheetOutcome::AlreadyPresent,
    })
}

/// Converts a local workbook file into `<output>/<snapshot>/`.
///
/// Without an explicit snapshot the key is taken from the file name.
#[instrument(level = "info", skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn convert_file(
    rules: &LayoutRules,
    input: &Path,
    output: &Path,
    snapshot: Option<SnapshotKey>,
) -> Result<ConversionReport> {
    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => SnapshotKey::from_file_name(input)?,
    };
    let workbook = excel_read::read_workbook(input)?;
    info!(sheet_count = workbook.sheets.len(), "read workbook");
    let sink = DirectoryCatalog::new(output);
    convert_workbook(rules, &workbook, &snapshot, &sink)
}

/// Settings for a full daily run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: CatalogSource,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub rules: LayoutRules,
}

/// Locates the newest published workbook and converts it.
#[instrument(level = "info", skip_all)]
pub fn run(options: &RunOptions, downloader: &dyn Downloader, today: NaiveDate) -> Result<ConversionReport> {
    let input = fetch::locate_catalog(&options.source, downloader, &options.input_dir, today)?;
    convert_file(&options.rules, &input, &options.output_dir, None)
}

/// Built-in layout rules, extended by a JSON rules file when given.
pub fn load_rules(path: Option<&Path>) -> Result<LayoutRules> {
    let rules = LayoutRules::default();
    match path {
        Some(path) => {
            let data = fs::read_to_string(path)?;
            let patch: LayoutRulesPatch = serde_json::from_str(&data)?;
            Ok(rules.merge(patch))
        }
        None => Ok(rules),
    }
}
