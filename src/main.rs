use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sat_catalogs::io::fetch::{self, CatalogSource, DEFAULT_BASE_URL, DEFAULT_LOOKBACK_DAYS, HttpDownloader};
use sat_catalogs::io::lookup;
use sat_catalogs::model::SnapshotKey;
use sat_catalogs::pipeline::{self, ConversionReport, RunOptions};
use sat_catalogs::{CatalogError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| CatalogError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => execute_run(args),
        Command::Convert(args) => execute_convert(args),
        Command::Latest(args) => execute_latest(args),
    }
}

fn execute_run(args: RunArgs) -> Result<()> {
    let options = RunOptions {
        source: CatalogSource {
            base_url: args.base_url,
            lookback_days: args.lookback,
        },
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        rules: pipeline::load_rules(args.layout.as_deref())?,
    };
    let downloader = HttpDownloader::new()?;
    let report = pipeline::run(&options, &downloader, fetch::today_in_cdmx())?;
    print_summary(&report);
    Ok(())
}

fn execute_convert(args: ConvertArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(CatalogError::MissingInput(args.input));
    }
    let rules = pipeline::load_rules(args.layout.as_deref())?;
    let snapshot = args.snapshot.as_deref().map(SnapshotKey::parse).transpose()?;
    let report = pipeline::convert_file(&rules, &args.input, &args.output_dir, snapshot)?;
    print_summary(&report);
    Ok(())
}

fn execute_latest(args: LatestArgs) -> Result<()> {
    let records = lookup::latest_catalog(&args.output_dir, &args.catalog)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn print_summary(report: &ConversionReport) {
    println!(
        "{}: processed {} of {} sheets",
        report.snapshot,
        report.processed(),
        report.total()
    );
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert the SAT CFDI catalog workbook into per-sheet JSON files."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the newest published workbook and convert it.
    Run(RunArgs),
    /// Convert a workbook already on disk.
    Convert(ConvertArgs),
    /// Print a catalog from the newest snapshot.
    Latest(LatestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory holding downloaded workbooks.
    #[arg(long, default_value = "input")]
    input_dir: PathBuf,

    /// Directory holding one subdirectory per catalog date.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Location the workbooks are published under.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Number of past days to search for a published workbook.
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    lookback: u32,

    /// Optional JSON file extending the built-in layout rules.
    #[arg(long)]
    layout: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Workbook to convert.
    #[arg(long)]
    input: PathBuf,

    /// Directory holding one subdirectory per catalog date.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Catalog date (YYYYMMDD); defaults to the date in the file name.
    #[arg(long)]
    snapshot: Option<String>,

    /// Optional JSON file extending the built-in layout rules.
    #[arg(long)]
    layout: Option<PathBuf>,
}

#[derive(clap::Args)]
struct LatestArgs {
    /// Catalog sheet name, e.g. c_FormaPago.
    #[arg(long)]
    catalog: String,

    /// Directory holding one subdirectory per catalog date.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}
