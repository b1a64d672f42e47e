//! Grid synthesis from name/rating pairs.
//!
//! Ratings sit at a fixed spot under every portrait, so the bottom-left
//! corners of their boxes trace the grid. Clustering those anchors gives the
//! column and row positions; cells are laid out from the average spacing.

use super::pairing::NamedRating;
use super::{Grid, GridCell};
use crate::config::GridConfig;
use crate::geometry::{Point, Quad};

/// Groups sorted values: a value within `tolerance` of the current cluster's
/// first value joins it. Returns each cluster's mean.
pub fn cluster_positions(values: &[f32], tolerance: f32) -> Vec<f32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for v in sorted {
        match clusters.last_mut() {
            Some(cluster) if v - cluster[0] <= tolerance => cluster.push(v),
            _ => clusters.push(vec![v]),
        }
    }

    clusters
        .iter()
        .map(|c| c.iter().sum::<f32>() / c.len() as f32)
        .collect()
}

/// Average distance between consecutive positions; None for fewer than two.
fn average_spacing(positions: &[f32]) -> Option<f32> {
    if positions.len() < 2 {
        return None;
    }
    let first = positions[0];
    let last = positions[positions.len() - 1];
    Some((last - first) / (positions.len() - 1) as f32)
}

/// Cell for a screenshot with a single portrait, sized from the rating text.
fn single_cell(pair: &NamedRating, config: &GridConfig) -> Grid {
    let rating = &pair.rating_bounds;
    let glyphs = pair.rating.chars().count().max(1) as f32;
    let width = rating.width() / glyphs * config.single_glyph_multiplier;
    let height = width * config.single_aspect_ratio;
    let bottom = rating.bottom().max(pair.name_bounds.bottom());
    let center = Point::new(rating.center().x, bottom - height / 2.0);

    let mut cell = GridCell::new(Quad::centered(center, width, height));
    cell.candidate_name = Some(pair.name.clone());
    cell.rating = Some(pair.rating.clone());
    Grid::new(vec![vec![cell]], None)
}

/// Empty cells for every (row, column) anchor combination.
fn synthesize_cells(
    pairs: &[NamedRating],
    image_width: u32,
    header_boundary: Option<f32>,
    config: &GridConfig,
) -> Vec<Vec<GridCell>> {
    let anchors: Vec<Point> = pairs.iter().map(|p| p.rating_bounds.bottom_left()).collect();
    let xs: Vec<f32> = anchors.iter().map(|a| a.x).collect();
    let ys: Vec<f32> = anchors.iter().map(|a| a.y).collect();

    let columns = cluster_positions(&xs, config.cluster_tolerance);
    let rows = cluster_positions(&ys, config.cluster_tolerance);

    let column_spacing = average_spacing(&columns)
        .unwrap_or(image_width as f32 * config.column_spacing_fallback);
    let row_spacing =
        average_spacing(&rows).unwrap_or(image_width as f32 * config.row_spacing_fallback);

    crate::log(&format!(
        "Grid: {} columns (spacing {:.1}), {} rows (spacing {:.1})",
        columns.len(),
        column_spacing,
        rows.len(),
        row_spacing
    ));

    let width = column_spacing * config.cell_width_fraction;
    let height = row_spacing * config.cell_height_fraction;

    rows.iter()
        .map(|&y| {
            columns
                .iter()
                .map(|&x| {
                    let center = Point::new(
                        x + column_spacing * config.center_offset_x,
                        y - row_spacing * config.center_offset_y,
                    );
                    GridCell::new(Quad::centered(center, width, height))
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| match (header_boundary, row.first()) {
            (Some(boundary), Some(cell)) => cell.bounds().bottom() > boundary,
            _ => true,
        })
        .collect()
}

/// Puts each pair into the cell containing its centroid.
///
/// When several cells contain it, the one with the nearest centre wins; when
/// two pairs land in one cell, the pair nearer the centre keeps it.
fn place_pairs(rows: &mut [Vec<GridCell>], pairs: &[NamedRating]) {
    let mut placed_distance: Vec<Vec<f32>> =
        rows.iter().map(|row| vec![f32::INFINITY; row.len()]).collect();

    for pair in pairs {
        let centroid = pair.centroid();
        let target = rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, cell)| (r, c, cell)))
            .filter(|(_, _, cell)| cell.bounds().contains(&centroid))
            .map(|(r, c, cell)| (r, c, cell.bounds().center().distance(&centroid)))
            .min_by(|a, b| a.2.total_cmp(&b.2));

        let Some((r, c, distance)) = target else {
            crate::log(&format!(
                "Grid: dropped {} {} at ({:.0}, {:.0}): outside every cell",
                pair.name, pair.rating, centroid.x, centroid.y
            ));
            continue;
        };

        if distance >= placed_distance[r][c] {
            crate::log(&format!(
                "Grid: dropped {} {}: cell ({}, {}) already taken",
                pair.name, pair.rating, r, c
            ));
            continue;
        }

        placed_distance[r][c] = distance;
        let cell = &mut rows[r][c];
        if let Some(previous) = &cell.candidate_name {
            crate::log(&format!(
                "Grid: dropped {} {}: cell ({}, {}) taken by nearer {}",
                previous,
                cell.rating.as_deref().unwrap_or("-"),
                r,
                c,
                pair.name
            ));
        }
        cell.candidate_name = Some(pair.name.clone());
        cell.rating = Some(pair.rating.clone());
    }
}

/// Drops empty rows from the bottom, then trailing empty cells of the new
/// last row.
fn trim_last_row(rows: &mut Vec<Vec<GridCell>>) {
    while let Some(last) = rows.last_mut() {
        match last.iter().rposition(|cell| !cell.is_placeholder()) {
            Some(idx) => {
                last.truncate(idx + 1);
                return;
            }
            None => {
                rows.pop();
            }
        }
    }
}

/// Builds the grid for a non-empty list of pairs.
pub fn build_grid(
    pairs: &[NamedRating],
    image_width: u32,
    header_boundary: Option<f32>,
    config: &GridConfig,
) -> Grid {
    match pairs {
        [] => Grid::empty(header_boundary),
        [pair] => {
            let mut grid = single_cell(pair, config);
            grid.header_boundary = header_boundary;
            grid
        }
        _ => {
            let mut rows = synthesize_cells(pairs, image_width, header_boundary, config);
            place_pairs(&mut rows, pairs);
            trim_last_row(&mut rows);
            Grid::new(rows, header_boundary)
        }
    }
}
