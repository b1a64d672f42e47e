//! Roster scanner command-line tool.
//!
//! Scans one screenshot against a JSON catalog and prints the resulting grid.
//!
//! ```text
//! roster-scan <screenshot> <catalog.json> [--tokens detections.json]
//!             [--config config.json] [--debug out.png] [--json]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use roster_scan::ocr::{RecordedOcr, TesseractOcr};
use roster_scan::{
    log, paths, HttpFetcher, JsonCatalog, OcrService, PipelineConfig, ReferenceCache, ScanMode,
    ScanOutcome, Scanner,
};

/// Command-line arguments for a single diagnostic scan
#[derive(Debug, Parser)]
#[command(name = "roster-scan")]
#[command(about = "Read a roster screenshot into a grid of catalog entities")]
struct Args {
    /// Screenshot of the roster grid
    screenshot: PathBuf,

    /// JSON array of catalog entries
    catalog: PathBuf,

    /// Replay saved detections instead of running tesseract
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Pipeline config (defaults to config.json in the data directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the debug overlay PNG here
    #[arg(long)]
    debug: Option<PathBuf>,

    /// Print JSON records instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Tesseract page segmentation mode
    #[arg(long, default_value_t = 11)]
    psm: u8,
}

fn main() -> Result<()> {
    // Log panics the same way as everything else
    std::panic::set_hook(Box::new(|panic_info| {
        log(&format!("[PANIC] {}", panic_info));
    }));

    let args = Args::parse();

    paths::ensure_directories()?;
    roster_scan::set_log_file(paths::get_logs_dir().join("roster_scan.log"));

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| paths::get_data_dir().join("config.json"));
    let config = PipelineConfig::load(&config_path);

    let ocr: Box<dyn OcrService> = match &args.tokens {
        Some(path) => Box::new(RecordedOcr::new(path)),
        None => Box::new(TesseractOcr::discover()?.with_psm(args.psm)),
    };
    let fetcher = HttpFetcher::new(Duration::from_millis(config.resolve.fetch_timeout_ms))?;
    let cache = ReferenceCache::new();
    let catalog = JsonCatalog::new(&args.catalog);

    let scanner = Scanner::new(ocr.as_ref(), &catalog, &fetcher, &cache, config)?
        .with_mode(ScanMode::Diagnostic);

    let bytes = std::fs::read(&args.screenshot)
        .with_context(|| format!("Failed to read {}", args.screenshot.display()))?;

    let report = match scanner.scan(&bytes)? {
        ScanOutcome::NothingDetected => {
            log("No text detected in screenshot");
            return Ok(());
        }
        ScanOutcome::Scanned(report) => report,
    };

    if let (Some(path), Some(png)) = (&args.debug, &report.debug_image) {
        std::fs::write(path, png)
            .with_context(|| format!("Failed to write debug image {}", path.display()))?;
        log(&format!("Debug image saved to {}", path.display()));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.records())?);
    } else {
        print!("{}", report.grid.render_text());
    }

    let unresolved = report.unresolved();
    if !unresolved.is_empty() {
        log(&format!("{} unresolved cells: {:?}", unresolved.len(), unresolved));
    }

    Ok(())
}
