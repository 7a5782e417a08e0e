use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Days, FixedOffset, NaiveDate, Utc};
use reqwest::blocking::Client;
use tempfile::Builder;
use tracing::{debug, info, instrument};

use crate::sat::catalogs::error::{CatalogError, Result};

/// Directory on the SAT site that publishes the catalog workbooks.
pub const DEFAULT_BASE_URL: &str = "http://omawww.sat.gob.mx/tramitesyservicios/Paginas/documentos/";
/// Number of past days searched for a published workbook.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 31;
const FILE_PREFIX: &str = "catCFDI_V_4_";
const FILE_EXTENSION: &str = "xls";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Mexico City, without daylight saving.
const CDMX_OFFSET_SECS: i32 = -6 * 3600;

/// Where and how far back to look for the catalog workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSource {
    pub base_url: String,
    pub lookback_days: u32,
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl CatalogSource {
    /// File name published for a given date, e.g. `catCFDI_V_4_20251110.xls`.
    pub fn file_name(date: NaiveDate) -> String {
        format!("{FILE_PREFIX}{}.{FILE_EXTENSION}", date.format("%Y%m%d"))
    }

    pub fn url_for(&self, file_name: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{file_name}", self.base_url)
        } else {
            format!("{}/{file_name}", self.base_url)
        }
    }

    /// Dates to try, newest first, starting the day before `today`.
    pub fn candidate_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (1..=u64::from(self.lookback_days))
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .collect()
    }
}

/// Current calendar date in Mexico City.
pub fn today_in_cdmx() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(CDMX_OFFSET_SECS)
        .map_or_else(|| now.date_naive(), |offset| now.with_timezone(&offset).date_naive())
}

/// Fetches one remote file to a local path.
pub trait Downloader {
    fn download(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Blocking HTTP downloader.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        fs::write(destination, &bytes)?;
        Ok(())
    }
}

/// Finds the most recent catalog workbook, downloading it when needed.
///
/// Dates are tried newest first; a file already in `input_dir` is reused
/// without touching the network. Downloads land in a `.part` file beside the
/// destination and are renamed into place only once complete, so an
/// interrupted transfer never leaves a workbook behind. Download failures
/// move on to the previous day.
#[instrument(level = "info", skip(source, downloader, input_dir), fields(input_dir = %input_dir.display()))]
pub fn locate_catalog(
    source: &CatalogSource,
    downloader: &dyn Downloader,
    input_dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(input_dir)?;

    for date in source.candidate_dates(today) {
        let file_name = CatalogSource::file_name(date);
        let path = input_dir.join(&file_name);
        if path.exists() {
            info!(path = %path.display(), "catalog already downloaded");
            return Ok(path);
        }

        let url = source.url_for(&file_name);
        debug!(%url, "attempting download");
        let partial = Builder::new()
            .prefix(&file_name)
            .suffix(".part")
            .tempfile_in(input_dir)?
            .into_temp_path();
        match downloader.download(&url, &partial) {
            Ok(()) => {
                partial.persist(&path).map_err(|error| error.error)?;
                info!(path = %path.display(), "catalog downloaded");
                return Ok(path);
            }
            // Dropping `partial` removes whatever was written.
            Err(error) => debug!(%url, %error, "catalog not available"),
        }
    }

    Err(CatalogError::CatalogUnavailable {
        days: source.lookback_days,
    })
}
