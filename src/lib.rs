//! Roster screenshot scanner.
//!
//! Turns a screenshot of a grid of character portraits (name and power
//! rating printed under each, optional glow) into a grid of catalog
//! entities with their ratings and glow state.
//!
//! Stages:
//! - `ocr`: token cleanup and same-line merging
//! - `grid`: name/rating pairing and grid synthesis
//! - `resolve`: fuzzy catalog matching and portrait disambiguation
//! - `attribute`: glow detection from a pixel strip
//! - `debug`: diagnostic overlay rendering

pub mod attribute;
pub mod catalog;
pub mod config;
pub mod debug;
pub mod geometry;
pub mod grid;
pub mod imaging;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod resolve;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

pub use catalog::{CatalogEntry, CatalogProvider, EntityRef, JsonCatalog};
pub use config::PipelineConfig;
pub use geometry::{PixelRect, Point, Quad};
pub use grid::{CellRecord, Grid, GridCell};
pub use ocr::{OcrService, OcrToken};
pub use pipeline::{ScanMode, ScanOutcome, ScanReport, Scanner};
pub use resolve::fetch::{HttpFetcher, ImageFetcher, ReferenceCache};

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Sets the file that `log` appends to. Only the first call takes effect.
pub fn set_log_file(path: PathBuf) {
    let _ = LOG_FILE.set(path);
}

/// Logs a message to stderr and, when configured, the log file, with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    if let Some(log_path) = LOG_FILE.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}
