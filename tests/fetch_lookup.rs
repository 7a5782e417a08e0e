use std::cell::RefCell;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use sat_catalogs::io::fetch::{CatalogSource, Downloader, locate_catalog};
use sat_catalogs::io::lookup::{latest_catalog, latest_snapshot};
use sat_catalogs::model::SnapshotKey;
use sat_catalogs::{CatalogError, Result};
use serde_json::json;
use tempfile::tempdir;

/// Serves only the URLs it was given, remembering every request.
struct FakeDownloader {
    available: Vec<String>,
    requested: RefCell<Vec<String>>,
}

impl FakeDownloader {
    fn new(available: &[&str]) -> Self {
        Self {
            available: available.iter().map(|url| url.to_string()).collect(),
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, destination: &Path) -> Result<()> {
        self.requested.borrow_mut().push(url.to_string());
        if self.available.iter().any(|available| available == url) {
            fs::write(destination, b"workbook")?;
            Ok(())
        } else {
            Err(CatalogError::InvalidWorkbook(format!("404 for {url}")))
        }
    }
}

/// Writes part of the file, then fails as a dropped connection would.
struct InterruptedDownloader;

impl Downloader for InterruptedDownloader {
    fn download(&self, _url: &str, destination: &Path) -> Result<()> {
        fs::write(destination, b"PK\x03\x04trunc")?;
        Err(CatalogError::InvalidWorkbook("connection reset".to_string()))
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn source(lookback_days: u32) -> CatalogSource {
    CatalogSource {
        base_url: "http://catalogos.test/documentos".to_string(),
        lookback_days,
    }
}

#[test]
fn candidate_dates_start_yesterday() {
    let dates = source(3).candidate_dates(date(2025, 3, 2));
    assert_eq!(dates, vec![date(2025, 3, 1), date(2025, 2, 28), date(2025, 2, 27)]);
    assert_eq!(CatalogSource::default().candidate_dates(date(2025, 3, 2)).len(), 31);
}

#[test]
fn catalog_urls_follow_published_names() {
    assert_eq!(
        CatalogSource::file_name(date(2025, 11, 10)),
        "catCFDI_V_4_20251110.xls"
    );
    assert_eq!(
        source(1).url_for("catCFDI_V_4_20251110.xls"),
        "http://catalogos.test/documentos/catCFDI_V_4_20251110.xls"
    );
}

#[test]
fn newest_available_date_is_downloaded() {
    let temp_dir = tempdir().expect("temporary directory");
    let downloader =
        FakeDownloader::new(&["http://catalogos.test/documentos/catCFDI_V_4_20251108.xls"]);

    let path = locate_catalog(&source(5), &downloader, temp_dir.path(), date(2025, 11, 11))
        .expect("catalog located");

    assert_eq!(path, temp_dir.path().join("catCFDI_V_4_20251108.xls"));
    assert_eq!(fs::read(&path).expect("download read"), b"workbook");
    assert_eq!(downloader.requested.borrow().len(), 3);
    assert!(!temp_dir.path().join("catCFDI_V_4_20251110.xls").exists());
}

#[test]
fn interrupted_download_leaves_no_workbook_behind() {
    let temp_dir = tempdir().expect("temporary directory");

    let result = locate_catalog(&source(2), &InterruptedDownloader, temp_dir.path(), date(2025, 11, 11));

    assert!(matches!(result, Err(CatalogError::CatalogUnavailable { days: 2 })));
    let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
        .expect("input dir listed")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");

    let downloader =
        FakeDownloader::new(&["http://catalogos.test/documentos/catCFDI_V_4_20251110.xls"]);
    let path = locate_catalog(&source(2), &downloader, temp_dir.path(), date(2025, 11, 11))
        .expect("catalog located");
    assert_eq!(fs::read(&path).expect("download read"), b"workbook");
    assert_eq!(downloader.requested.borrow().len(), 1);
}

#[test]
fn local_file_skips_the_network() {
    let temp_dir = tempdir().expect("temporary directory");
    let local = temp_dir.path().join("catCFDI_V_4_20251110.xls");
    fs::write(&local, b"cached").expect("cached workbook");
    let downloader = FakeDownloader::new(&[]);

    let path = locate_catalog(&source(5), &downloader, temp_dir.path(), date(2025, 11, 11))
        .expect("catalog located");

    assert_eq!(path, local);
    assert!(downloader.requested.borrow().is_empty());
}

#[test]
fn exhausted_window_is_an_error() {
    let temp_dir = tempdir().expect("temporary directory");
    let downloader = FakeDownloader::new(&[]);

    let result = locate_catalog(&source(4), &downloader, temp_dir.path(), date(2025, 11, 11));

    assert!(matches!(result, Err(CatalogError::CatalogUnavailable { days: 4 })));
    assert_eq!(downloader.requested.borrow().len(), 4);
}

#[test]
fn snapshot_key_comes_from_file_name() {
    let key = SnapshotKey::from_file_name(Path::new("input/catCFDI_V_4_20251110.xls"))
        .expect("key parsed");
    assert_eq!(key.as_str(), "20251110");
    assert_eq!(key, SnapshotKey::from_date(date(2025, 11, 10)));

    assert!(SnapshotKey::from_file_name(Path::new("catCFDI_V_4_2025111.xls")).is_err());
    assert!(SnapshotKey::from_file_name(Path::new("catCFDI_V_4_20251340.xls")).is_err());
    assert!(SnapshotKey::parse("hoy").is_err());
}

#[test]
fn latest_snapshot_is_the_greatest_date_directory() {
    let temp_dir = tempdir().expect("temporary directory");
    for dir in ["20250101", "20251110", "20250630"] {
        fs::create_dir(temp_dir.path().join(dir)).expect("snapshot dir");
    }
    fs::write(temp_dir.path().join("20991231"), "not a directory").expect("stray file");

    assert_eq!(latest_snapshot(temp_dir.path()).expect("latest found"), "20251110");
}

#[test]
fn non_date_directories_are_not_snapshots() {
    let temp_dir = tempdir().expect("temporary directory");
    for dir in ["20250101", "20251110", "logs", "tmp", "20251399"] {
        fs::create_dir(temp_dir.path().join(dir)).expect("dir created");
    }
    assert_eq!(latest_snapshot(temp_dir.path()).expect("latest found"), "20251110");

    let only_logs = tempdir().expect("temporary directory");
    fs::create_dir(only_logs.path().join("logs")).expect("logs dir");
    assert!(matches!(
        latest_snapshot(only_logs.path()),
        Err(CatalogError::NoSnapshots)
    ));
}

#[test]
fn latest_catalog_reads_newest_snapshot_only() {
    let temp_dir = tempdir().expect("temporary directory");
    let older = temp_dir.path().join("20250101");
    let newer = temp_dir.path().join("20251110");
    fs::create_dir(&older).expect("older snapshot");
    fs::create_dir(&newer).expect("newer snapshot");
    fs::write(older.join("c_FormaPago.json"), r#"[{"c_formapago": "99"}]"#).expect("old catalog");
    fs::write(newer.join("c_FormaPago.json"), r#"[{"c_formapago": "01"}]"#).expect("new catalog");
    fs::write(older.join("c_Moneda.json"), r#"[{"c_moneda": "MXN"}]"#).expect("old moneda");

    assert_eq!(
        latest_catalog(temp_dir.path(), "c_FormaPago").expect("catalog read"),
        json!([{"c_formapago": "01"}])
    );
    assert_eq!(
        latest_catalog(temp_dir.path(), "c_FormaPago.json").expect("catalog read"),
        json!([{"c_formapago": "01"}])
    );

    match latest_catalog(temp_dir.path(), "c_Moneda") {
        Err(CatalogError::CatalogNotFound { catalog, snapshot }) => {
            assert_eq!(catalog, "c_Moneda.json");
            assert_eq!(snapshot, "20251110");
        }
        other => panic!("unexpected lookup result: {other:?}"),
    }
}

#[test]
fn lookup_without_snapshots_fails() {
    let temp_dir = tempdir().expect("temporary directory");
    assert!(matches!(
        latest_catalog(temp_dir.path(), "c_FormaPago"),
        Err(CatalogError::NoSnapshots)
    ));
}
