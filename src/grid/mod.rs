//! Roster grid model and topology estimation.
//!
//! This module provides:
//! - `GridCell` / `Grid`: the mutable result the later stages annotate
//! - `estimate`: labels → synthesized grid with names and ratings placed
//! - `CellRecord` and a text rendering for callers

pub mod classify;
pub mod layout;
pub mod pairing;

use image::RgbaImage;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

use crate::catalog::EntityRef;
use crate::config::GridConfig;
use crate::geometry::{PixelRect, Quad};
use crate::imaging::PortraitCrop;
use crate::ocr::OcrToken;

/// Regions computed for a cell while annotating it. Only the debug renderer
/// reads them.
#[derive(Clone, Debug, Default)]
pub struct CellDiagnostics {
    pub attribute_strip: Option<PixelRect>,
    pub portrait_crop: Option<PortraitCrop>,
    /// Reference art that won disambiguation
    pub reference_thumbnail: Option<Arc<RgbaImage>>,
    /// (entity id, score) for every candidate that could be scored
    pub candidate_scores: Vec<(String, f32)>,
}

/// One inferred portrait slot.
///
/// The bounds are fixed at creation and the resolved entity can be set only
/// once; later stages only annotate.
#[derive(Clone, Debug)]
pub struct GridCell {
    bounds: Quad,
    pub candidate_name: Option<String>,
    resolved_entity: Option<EntityRef>,
    pub rating: Option<String>,
    pub attribute_flag: Option<bool>,
    pub diagnostics: CellDiagnostics,
}

impl GridCell {
    pub fn new(bounds: Quad) -> Self {
        Self {
            bounds,
            candidate_name: None,
            resolved_entity: None,
            rating: None,
            attribute_flag: None,
            diagnostics: CellDiagnostics::default(),
        }
    }

    pub fn bounds(&self) -> &Quad {
        &self.bounds
    }

    pub fn resolved_entity(&self) -> Option<&EntityRef> {
        self.resolved_entity.as_ref()
    }

    /// Records the cell's identity. Returns false if it was already resolved.
    pub fn resolve(&mut self, entity: EntityRef) -> bool {
        if self.resolved_entity.is_some() {
            return false;
        }
        self.candidate_name = Some(entity.short_name.clone());
        self.resolved_entity = Some(entity);
        true
    }

    /// An empty slot: nothing was read for it.
    pub fn is_placeholder(&self) -> bool {
        self.candidate_name.is_none()
    }
}

/// Cells in rows (outer) and columns (inner). All rows share one width,
/// except the last row, which ends at its last populated column.
#[derive(Clone, Debug, Default)]
pub struct Grid {
    rows: Vec<Vec<GridCell>>,
    /// Bottom edge of the header banner, if one was found
    pub header_boundary: Option<f32>,
}

/// Flat, serializable view of one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellRecord {
    pub row: usize,
    pub column: usize,
    pub entity: Option<EntityRef>,
    pub candidate_name: Option<String>,
    pub rating: Option<String>,
    pub attribute_flag: Option<bool>,
}

impl CellRecord {
    /// Numeric rating with separators removed.
    pub fn rating_value(&self) -> Option<u32> {
        let digits: String = self.rating.as_ref()?.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

impl Grid {
    pub fn new(rows: Vec<Vec<GridCell>>, header_boundary: Option<f32>) -> Self {
        Self { rows, header_boundary }
    }

    pub fn empty(header_boundary: Option<f32>) -> Self {
        Self::new(Vec::new(), header_boundary)
    }

    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&GridCell> {
        self.rows.get(row)?.get(column)
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut GridCell> {
        self.rows.get_mut(row)?.get_mut(column)
    }

    /// Cells with their (row, column) position, row-major.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &GridCell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().map(move |(c, cell)| ((r, c), cell))
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut GridCell)> {
        self.rows.iter_mut().enumerate().flat_map(|(r, row)| {
            row.iter_mut().enumerate().map(move |(c, cell)| ((r, c), cell))
        })
    }

    pub fn resolved_count(&self) -> usize {
        self.cells().filter(|(_, cell)| cell.resolved_entity.is_some()).count()
    }

    /// Positions of cells that carry a name but no entity.
    pub fn unresolved(&self) -> Vec<(usize, usize)> {
        self.cells()
            .filter(|(_, cell)| !cell.is_placeholder() && cell.resolved_entity.is_none())
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn records(&self) -> Vec<CellRecord> {
        self.cells()
            .map(|((row, column), cell)| CellRecord {
                row,
                column,
                entity: cell.resolved_entity.clone(),
                candidate_name: cell.candidate_name.clone(),
                rating: cell.rating.clone(),
                attribute_flag: cell.attribute_flag,
            })
            .collect()
    }

    /// One line per populated cell: state glyph, icon, name, rating.
    ///
    /// Unresolved names are marked with a trailing `?`.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (_, cell) in self.cells() {
            let Some(candidate) = &cell.candidate_name else {
                continue;
            };
            let glyph = match cell.attribute_flag {
                Some(true) => "◆",
                Some(false) => "◇",
                None => "·",
            };
            let name = match &cell.resolved_entity {
                Some(entity) => entity.canonical_name.clone(),
                None => format!("{}?", candidate),
            };
            let icon = cell
                .resolved_entity
                .as_ref()
                .and_then(|e| e.icon.as_deref())
                .map(|icon| format!("{} ", icon))
                .unwrap_or_default();
            let rating = cell.rating.as_deref().unwrap_or("-");
            let _ = writeln!(out, "{} {}{} {}", glyph, icon, name, rating);
        }
        out
    }
}

/// High-level function: merged labels → grid of placed names and ratings.
///
/// Returns an empty grid when no rating or no name/rating pair is found.
pub fn estimate(labels: &[OcrToken], image_width: u32, config: &GridConfig) -> Grid {
    let header_boundary = classify::find_header_boundary(labels, &config.banner_keyword);
    if let Some(y) = header_boundary {
        crate::log(&format!("Grid: header boundary at y={:.0}", y));
    }

    let roster_labels = classify::discard_above(labels, header_boundary);
    let classified = classify::classify(&roster_labels);
    crate::log(&format!(
        "Grid: {} rating tokens, {} name candidates",
        classified.ratings.len(),
        classified.names.len()
    ));

    if classified.ratings.is_empty() {
        return Grid::empty(header_boundary);
    }

    let pairs = pairing::pair_names_with_ratings(&classified.names, &classified.ratings, config);
    crate::log(&format!("Grid: {} name/rating pairs", pairs.len()));

    if pairs.is_empty() {
        return Grid::empty(header_boundary);
    }

    let grid = layout::build_grid(&pairs, image_width, header_boundary, config);
    crate::log(&format!(
        "Grid: {} rows, {} populated cells",
        grid.rows().len(),
        grid.cells().filter(|(_, c)| !c.is_placeholder()).count()
    ));
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str) -> EntityRef {
        EntityRef {
            id: id.to_string(),
            canonical_name: name.to_string(),
            short_name: name.to_string(),
            icon: None,
        }
    }

    fn label(text: &str, left: f32, top: f32, width: f32) -> OcrToken {
        OcrToken::new(text, Quad::from_rect(left, top, width, 16.0))
    }

    #[test]
    fn test_resolve_is_set_once() {
        let mut cell = GridCell::new(Quad::from_rect(0.0, 0.0, 10.0, 10.0));
        assert!(cell.resolve(entity("a", "HULK")));
        assert!(!cell.resolve(entity("b", "THOR")));
        assert_eq!(cell.resolved_entity().unwrap().id, "a");
    }

    #[test]
    fn test_render_text_skips_placeholders() {
        let mut populated = GridCell::new(Quad::from_rect(0.0, 0.0, 10.0, 10.0));
        populated.candidate_name = Some("HULK".to_string());
        populated.rating = Some("12,345".to_string());
        populated.attribute_flag = Some(true);
        populated.resolve(entity("hulk", "Hulk"));

        let mut unresolved = GridCell::new(Quad::from_rect(20.0, 0.0, 10.0, 10.0));
        unresolved.candidate_name = Some("XYZ".to_string());

        let empty = GridCell::new(Quad::from_rect(40.0, 0.0, 10.0, 10.0));
        let grid = Grid::new(vec![vec![populated, unresolved, empty]], None);

        assert_eq!(grid.render_text(), "◆ Hulk 12,345\n· XYZ? -\n");
        assert_eq!(grid.unresolved(), vec![(0, 1)]);
        assert_eq!(grid.resolved_count(), 1);
    }

    #[test]
    fn test_rating_value() {
        let record = CellRecord {
            row: 0,
            column: 0,
            entity: None,
            candidate_name: None,
            rating: Some("12,345".to_string()),
            attribute_flag: None,
        };
        assert_eq!(record.rating_value(), Some(12345));
    }

    #[test]
    fn test_estimate_without_ratings_is_empty() {
        let labels = vec![label("HULK", 100.0, 300.0, 40.0)];
        let grid = estimate(&labels, 800, &GridConfig::default());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_estimate_without_pairs_is_empty() {
        // Rating far away from the only name
        let labels = vec![label("HULK", 100.0, 300.0, 40.0), label("12,345", 600.0, 700.0, 50.0)];
        let grid = estimate(&labels, 800, &GridConfig::default());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_estimate_ignores_labels_above_banner() {
        let labels = vec![
            // Shaped like a name and a rating, but part of the header
            label("THOR", 100.0, 10.0, 40.0),
            label("45,678", 95.0, 30.0, 50.0),
            label("COLLECTION", 300.0, 60.0, 120.0),
            label("HULK", 100.0, 300.0, 40.0),
            label("12,345", 95.0, 320.0, 50.0),
        ];
        let grid = estimate(&labels, 800, &GridConfig::default());
        let names: Vec<_> = grid.cells().filter_map(|(_, c)| c.candidate_name.clone()).collect();
        assert_eq!(names, vec!["HULK".to_string()]);
        assert_eq!(grid.header_boundary, Some(76.0));
    }
}
