//! Diagnostic overlay rendering.
//!
//! Draws cell bounds, attribute strips, portrait crops, the header boundary
//! and winning reference thumbnails on a copy of the screenshot.

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

use crate::config::DebugConfig;
use crate::geometry::PixelRect;
use crate::grid::Grid;

/// Color constants for debug rendering.
pub const COLOR_CELL: Rgba<u8> = Rgba([0, 255, 0, 255]); // Green
pub const COLOR_CELL_EMPTY: Rgba<u8> = Rgba([128, 128, 128, 255]); // Grey
pub const COLOR_UNRESOLVED: Rgba<u8> = Rgba([255, 0, 0, 255]); // Red
pub const COLOR_STRIP: Rgba<u8> = Rgba([255, 255, 0, 255]); // Yellow
pub const COLOR_CROP_OUTER: Rgba<u8> = Rgba([0, 0, 255, 255]); // Blue
pub const COLOR_CROP_INNER: Rgba<u8> = Rgba([0, 255, 255, 255]); // Cyan
pub const COLOR_HEADER: Rgba<u8> = Rgba([255, 128, 0, 255]); // Orange

/// Renders every diagnostic region recorded on the grid.
pub fn render_debug(
    screenshot: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    grid: &Grid,
    config: &DebugConfig,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let mut img = screenshot.clone();
    let (width, height) = img.dimensions();
    let thickness = config.line_thickness.max(1);

    if let Some(y) = grid.header_boundary {
        draw_hline(&mut img, y.max(0.0).round() as u32, COLOR_HEADER, thickness);
    }

    for (_, cell) in grid.cells() {
        let color = if cell.is_placeholder() {
            COLOR_CELL_EMPTY
        } else if cell.resolved_entity().is_none() {
            COLOR_UNRESOLVED
        } else {
            COLOR_CELL
        };
        draw_region(&mut img, &cell.bounds().to_pixel_rect(width, height), color, thickness);

        let diagnostics = &cell.diagnostics;
        if let Some(strip) = &diagnostics.attribute_strip {
            draw_region(&mut img, strip, COLOR_STRIP, 1);
        }
        if let Some(crop) = &diagnostics.portrait_crop {
            draw_region(&mut img, &crop.outer, COLOR_CROP_OUTER, 1);
            draw_region(&mut img, &crop.inner, COLOR_CROP_INNER, 1);
        }

        // Winning reference in the top-right corner of the cell
        if let Some(thumbnail) = &diagnostics.reference_thumbnail {
            let size = config.thumbnail_size;
            if size > 0 && thumbnail.width() > 0 && thumbnail.height() > 0 {
                let small = imageops::resize(thumbnail.as_ref(), size, size, FilterType::Triangle);
                let x = cell.bounds().right() - size as f32 - thickness as f32;
                let y = cell.bounds().top() + thickness as f32;
                imageops::overlay(&mut img, &small, x.round() as i64, y.round() as i64);
            }
        }
    }

    img
}

/// Encodes an image as PNG bytes.
pub fn encode_png(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("Failed to encode debug image")?;
    Ok(bytes)
}

fn draw_region(img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>, region: &PixelRect, color: Rgba<u8>, thickness: u32) {
    if region.is_degenerate() {
        return;
    }
    draw_rect(img, region.x, region.y, region.width, region.height, color, thickness);
}

/// Draws a rectangle border on an image.
pub fn draw_rect(
    img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    color: Rgba<u8>,
    thickness: u32,
) {
    let (img_w, img_h) = img.dimensions();
    let mut put = |px: u32, py: u32| {
        if px < img_w && py < img_h {
            img.put_pixel(px, py, color);
        }
    };

    // Top and bottom edges
    for dy in 0..thickness.min(h) {
        for dx in 0..w {
            put(x + dx, y + dy);
            put(x + dx, y + h - 1 - dy);
        }
    }

    // Left and right edges
    for dy in 0..h {
        for dx in 0..thickness.min(w) {
            put(x + dx, y + dy);
            put(x + w - 1 - dx, y + dy);
        }
    }
}

/// Draws a full-width horizontal line.
fn draw_hline(img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>, y: u32, color: Rgba<u8>, thickness: u32) {
    let (img_w, img_h) = img.dimensions();
    for py in y..y.saturating_add(thickness).min(img_h) {
        for px in 0..img_w {
            img.put_pixel(px, py, color);
        }
    }
}
