//! End-to-end scan: screenshot bytes in, annotated grid out.
//!
//! Stages run in order on one screenshot:
//! 1. OCR detections → corrected, merged labels
//! 2. labels → grid of cells with names and ratings
//! 3. names → catalog entities (fuzzy match, then portrait comparison)
//! 4. resolved cells → glow flag

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use std::time::Instant;

use crate::attribute::extract_attributes;
use crate::catalog::{CatalogIndex, CatalogProvider};
use crate::config::PipelineConfig;
use crate::debug::{encode_png, render_debug};
use crate::grid::{self, CellRecord, Grid};
use crate::imaging::decode_rgba;
use crate::ocr::{prepare_labels, OcrService, OcrToken};
use crate::resolve::fetch::{ImageFetcher, ReferenceCache};
use crate::resolve::EntityResolver;

/// How failures are reported to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// "Nothing detected" and "nothing resolved" are errors.
    #[default]
    Production,
    /// Every outcome is returned as a value, with a debug image attached.
    Diagnostic,
}

/// What a scan produced.
#[derive(Clone, Debug)]
pub struct ScanReport {
    pub grid: Grid,
    /// PNG overlay, diagnostic mode only
    pub debug_image: Option<Vec<u8>>,
}

impl ScanReport {
    /// Named cells that could not be matched to a catalog entity.
    pub fn unresolved(&self) -> Vec<(usize, usize)> {
        self.grid.unresolved()
    }

    pub fn records(&self) -> Vec<CellRecord> {
        self.grid.records()
    }
}

#[derive(Clone, Debug)]
pub enum ScanOutcome {
    /// The detector returned no tokens at all.
    NothingDetected,
    Scanned(ScanReport),
}

/// Runs the pipeline with a fixed set of collaborators.
///
/// A scanner holds no per-scan state; the reference cache is the only thing
/// carried from one scan to the next.
pub struct Scanner<'a> {
    ocr: &'a dyn OcrService,
    catalog: CatalogIndex,
    fetcher: &'a dyn ImageFetcher,
    cache: &'a ReferenceCache,
    config: PipelineConfig,
    mode: ScanMode,
}

impl<'a> Scanner<'a> {
    pub fn new(
        ocr: &'a dyn OcrService,
        catalog: &dyn CatalogProvider,
        fetcher: &'a dyn ImageFetcher,
        cache: &'a ReferenceCache,
        config: PipelineConfig,
    ) -> Result<Self> {
        Ok(Self {
            ocr,
            catalog: CatalogIndex::load(catalog)?,
            fetcher,
            cache,
            config,
            mode: ScanMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Runs OCR on the screenshot, then every later stage.
    pub fn scan(&self, image_bytes: &[u8]) -> Result<ScanOutcome> {
        let detections = self.ocr.detect(image_bytes).context("OCR failed")?;
        self.scan_detections(image_bytes, &detections)
    }

    /// Runs every stage after OCR on detections obtained elsewhere.
    pub fn scan_detections(&self, image_bytes: &[u8], detections: &[OcrToken]) -> Result<ScanOutcome> {
        let start = Instant::now();

        if detections.is_empty() {
            crate::log("Scan: nothing detected");
            if self.mode == ScanMode::Production {
                bail!("Nothing detected in screenshot");
            }
            return Ok(ScanOutcome::NothingDetected);
        }

        let screenshot = decode_rgba(image_bytes)?;
        let grid = self.analyze(&screenshot, detections);

        crate::log(&format!(
            "Scan: {} of {} named cells resolved in {}ms",
            grid.resolved_count(),
            grid.resolved_count() + grid.unresolved().len(),
            start.elapsed().as_millis()
        ));

        match self.mode {
            ScanMode::Production => {
                if grid.resolved_count() == 0 {
                    bail!("No cells could be resolved");
                }
                Ok(ScanOutcome::Scanned(ScanReport {
                    grid,
                    debug_image: None,
                }))
            }
            ScanMode::Diagnostic => {
                let overlay = render_debug(&screenshot, &grid, &self.config.debug);
                let debug_image = match encode_png(&overlay) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        crate::log(&format!("Scan: debug image unavailable: {:#}", e));
                        None
                    }
                };
                Ok(ScanOutcome::Scanned(ScanReport { grid, debug_image }))
            }
        }
    }

    /// Stages 1-4 on a decoded screenshot.
    pub fn analyze(&self, screenshot: &RgbaImage, detections: &[OcrToken]) -> Grid {
        let labels = prepare_labels(detections, &self.config.merge);
        let mut grid = grid::estimate(&labels, screenshot.width(), &self.config.grid);
        if grid.is_empty() {
            return grid;
        }

        let resolver = EntityResolver::new(&self.catalog, self.fetcher, self.cache, &self.config.resolve);
        resolver.resolve(&mut grid, screenshot);
        extract_attributes(&mut grid, screenshot, &self.config.attribute);
        grid
    }
}
