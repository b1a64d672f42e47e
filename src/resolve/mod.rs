//! Entity resolution: which catalog entry each grid cell shows.
//!
//! Pass 1 snaps OCR names to catalog short names, pass 2 resolves short
//! names that identify a single entry, pass 3 compares portrait art for short
//! names shared by several entries.

pub mod fetch;
pub mod fuzzy;
pub mod signature;

use anyhow::{anyhow, Result};
use image::RgbaImage;
use rayon::prelude::*;
use std::sync::Arc;

use crate::catalog::{CatalogEntry, CatalogIndex, EntityRef};
use crate::config::ResolveConfig;
use crate::geometry::PixelRect;
use crate::grid::Grid;
use crate::imaging::{crop, decode_rgba, PortraitCrop};
use fetch::{ImageFetcher, ReferenceArt, ReferenceCache};
use signature::{color_distance, normalized_hamming, PortraitSignature, SignatureHasher};

/// Outcome of comparing one cell against its ambiguous group.
struct Disambiguation {
    position: (usize, usize),
    crop: PortraitCrop,
    winner: Option<(EntityRef, Arc<ReferenceArt>)>,
    scores: Vec<(String, f32)>,
}

pub struct EntityResolver<'a> {
    catalog: &'a CatalogIndex,
    fetcher: &'a dyn ImageFetcher,
    cache: &'a ReferenceCache,
    config: &'a ResolveConfig,
    hasher: SignatureHasher,
}

impl<'a> EntityResolver<'a> {
    pub fn new(
        catalog: &'a CatalogIndex,
        fetcher: &'a dyn ImageFetcher,
        cache: &'a ReferenceCache,
        config: &'a ResolveConfig,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            cache,
            config,
            hasher: SignatureHasher::new(config.hash_size),
        }
    }

    /// Runs all three passes over the grid. Cells that cannot be resolved
    /// are left as they are.
    pub fn resolve(&self, grid: &mut Grid, screenshot: &RgbaImage) {
        self.match_names(grid);
        self.resolve_unique(grid);
        self.disambiguate_all(grid, screenshot);

        crate::log(&format!(
            "Resolve: {} cells resolved, {} unresolved",
            grid.resolved_count(),
            grid.unresolved().len()
        ));
    }

    /// Pass 1: replace each OCR name with the short name of its best match.
    fn match_names(&self, grid: &mut Grid) {
        for ((row, col), cell) in grid.cells_mut() {
            let Some(candidate) = cell.candidate_name.clone() else {
                continue;
            };
            match fuzzy::best_match(&candidate, self.catalog.entries(), self.config.fuzzy_threshold)
            {
                Some((entry, score)) => {
                    if entry.short_name != candidate {
                        crate::log(&format!(
                            "Resolve: ({}, {}) {} -> {} ({:.2})",
                            row, col, candidate, entry.short_name, score
                        ));
                    }
                    cell.candidate_name = Some(entry.short_name.clone());
                }
                None => {
                    crate::log(&format!(
                        "Resolve: ({}, {}) no catalog match for {}",
                        row, col, candidate
                    ));
                }
            }
        }
    }

    /// Pass 2: short names owned by exactly one entry.
    fn resolve_unique(&self, grid: &mut Grid) {
        for (_, cell) in grid.cells_mut() {
            let Some(name) = &cell.candidate_name else {
                continue;
            };
            if let [entry] = self.catalog.group(name).as_slice() {
                cell.resolve(EntityRef::from(*entry));
            }
        }
    }

    /// Pass 3: short names shared by several entries, compared by portrait.
    fn disambiguate_all(&self, grid: &mut Grid, screenshot: &RgbaImage) {
        let (img_w, img_h) = screenshot.dimensions();
        let jobs: Vec<((usize, usize), PixelRect, Vec<&CatalogEntry>)> = grid
            .cells()
            .filter(|(_, cell)| cell.resolved_entity().is_none())
            .filter_map(|(pos, cell)| {
                let group = self.catalog.group(cell.candidate_name.as_deref()?);
                (group.len() > 1).then(|| (pos, cell.bounds().to_pixel_rect(img_w, img_h), group))
            })
            .collect();

        if jobs.is_empty() {
            return;
        }

        let results: Vec<Disambiguation> = jobs
            .par_iter()
            .map(|(pos, region, group)| self.disambiguate(*pos, region, group, screenshot))
            .collect();

        for result in results {
            let Some(cell) = grid.get_mut(result.position.0, result.position.1) else {
                continue;
            };
            cell.diagnostics.portrait_crop = Some(result.crop);
            cell.diagnostics.candidate_scores = result.scores;
            if let Some((entity, art)) = result.winner {
                cell.diagnostics.reference_thumbnail = Some(Arc::clone(&art.thumbnail));
                cell.resolve(entity);
            }
        }
    }

    fn portrait_crop(&self, region: PixelRect) -> PortraitCrop {
        PortraitCrop::new(
            region,
            self.config.portrait_bottom_fraction,
            self.config.portrait_side_fraction,
            self.config.inner_fraction,
        )
    }

    /// Signature of the inner portrait crop of `region`.
    fn region_signature(&self, img: &RgbaImage, crop_regions: &PortraitCrop) -> Result<PortraitSignature> {
        let inner = crop(img, &crop_regions.inner)
            .ok_or_else(|| anyhow!("Portrait crop {:?} is empty", crop_regions.inner))?;
        self.hasher.signature(&inner)
    }

    /// Downloads and fingerprints a candidate's reference art (cached).
    fn reference(&self, entry: &CatalogEntry) -> Result<Arc<ReferenceArt>> {
        self.cache.get_or_compute(&entry.reference_portrait_url, || {
            let bytes = self.fetcher.fetch(&entry.reference_portrait_url)?;
            let img = decode_rgba(&bytes)?;
            let whole = PixelRect::new(0, 0, img.width(), img.height());
            let signature = self.region_signature(&img, &self.portrait_crop(whole))?;
            let thumbnail = image::imageops::thumbnail(&img, 64, 64);
            Ok(ReferenceArt {
                signature,
                thumbnail: Arc::new(thumbnail),
            })
        })
    }

    fn score(&self, cell: &PortraitSignature, reference: &PortraitSignature) -> Option<f32> {
        let hash = normalized_hamming(&cell.hash, &reference.hash)?;
        let color = color_distance(&cell.color, &reference.color);
        Some(self.config.hash_weight * hash + self.config.color_weight * color)
    }

    fn disambiguate(
        &self,
        position: (usize, usize),
        region: &PixelRect,
        group: &[&CatalogEntry],
        screenshot: &RgbaImage,
    ) -> Disambiguation {
        let crop_regions = self.portrait_crop(*region);
        let mut result = Disambiguation {
            position,
            crop: crop_regions,
            winner: None,
            scores: Vec::new(),
        };

        let cell_signature = match self.region_signature(screenshot, &crop_regions) {
            Ok(sig) => sig,
            Err(e) => {
                crate::log(&format!("Resolve: {:?} cannot fingerprint cell: {}", position, e));
                return result;
            }
        };

        // Fetch every candidate concurrently; a failed candidate is left out
        let scored: Vec<(&CatalogEntry, f32, Arc<ReferenceArt>)> = group
            .par_iter()
            .filter_map(|entry| match self.reference(entry) {
                Ok(art) => {
                    let score = self.score(&cell_signature, &art.signature)?;
                    Some((*entry, score, art))
                }
                Err(e) => {
                    crate::log(&format!(
                        "Resolve: reference for {} unavailable: {:#}",
                        entry.id, e
                    ));
                    None
                }
            })
            .collect();

        result.scores = scored.iter().map(|(e, s, _)| (e.id.clone(), *s)).collect();

        let best = scored
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));

        match best {
            Some((entry, score, art)) => {
                crate::log(&format!(
                    "Resolve: {:?} {} -> {} (score {:.3})",
                    position, entry.short_name, entry.id, score
                ));
                result.winner = Some((EntityRef::from(entry), art));
            }
            None => {
                crate::log(&format!(
                    "Resolve: {:?} no usable reference among {} candidates",
                    position,
                    group.len()
                ));
            }
        }

        result
    }
}
