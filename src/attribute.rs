//! Glow detection via blue-channel analysis.
//!
//! An activated portrait has a blue glow along its top edge. A thin strip just
//! below the top of the cell is sampled and its mean blue value compared with
//! a threshold.

use image::{ImageBuffer, Rgba};

use crate::config::AttributeConfig;
use crate::geometry::{PixelRect, Quad};
use crate::grid::Grid;
use crate::imaging::crop;

/// Calculates the average blue channel of an image, 0.0-255.0.
pub fn calculate_blue(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> f32 {
    if img.width() == 0 || img.height() == 0 {
        return 0.0;
    }

    let pixel_count = (img.width() as f64) * (img.height() as f64);
    let total: f64 = img.pixels().map(|pixel| pixel[2] as f64).sum();

    (total / pixel_count) as f32
}

/// The sampled strip for a cell, clamped to the image.
pub fn attribute_strip(bounds: &Quad, img_w: u32, img_h: u32, config: &AttributeConfig) -> PixelRect {
    let width = bounds.width() * config.width_fraction;
    let height = bounds.height() * config.height_fraction;
    let left = bounds.center().x - width / 2.0;
    let top = bounds.top() + bounds.height() * config.top_offset;

    PixelRect::from_bounds(left, top, left + width, top + height, img_w, img_h)
}

/// Mean blue of the strip, or None when the strip has no area.
pub fn strip_blue(img: &ImageBuffer<Rgba<u8>, Vec<u8>>, strip: &PixelRect) -> Option<f32> {
    if strip.is_degenerate() {
        return None;
    }
    crop(img, strip).map(|region| calculate_blue(&region))
}

/// True if the strip glows. A strip with no area is never glowing.
pub fn is_activated(blue: Option<f32>, config: &AttributeConfig) -> bool {
    blue.is_some_and(|b| b > config.blue_threshold)
}

/// Sets `attribute_flag` on every resolved cell.
pub fn extract_attributes(
    grid: &mut Grid,
    screenshot: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    config: &AttributeConfig,
) {
    let (img_w, img_h) = screenshot.dimensions();
    let mut activated = 0;

    for ((row, col), cell) in grid.cells_mut() {
        if cell.resolved_entity().is_none() {
            continue;
        }

        let strip = attribute_strip(cell.bounds(), img_w, img_h, config);
        let blue = strip_blue(screenshot, &strip);
        let flag = is_activated(blue, config);
        if flag {
            activated += 1;
        }
        crate::log(&format!(
            "Attribute: ({}, {}) mean blue {:?} -> {}",
            row, col, blue, flag
        ));

        cell.attribute_flag = Some(flag);
        cell.diagnostics.attribute_strip = (!strip.is_degenerate()).then_some(strip);
    }

    crate::log(&format!("Attribute: {} cells activated", activated));
}
