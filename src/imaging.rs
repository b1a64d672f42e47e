//! Image primitives shared by the resolver, attribute extractor and renderer.

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};

use crate::geometry::PixelRect;

/// Decodes PNG/JPEG/etc. bytes into an RGBA buffer.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;
    Ok(img.to_rgba8())
}

/// Crops a sub-region from an image.
///
/// The region is clamped to the image bounds. Returns None when nothing of
/// the region is left to crop.
pub fn crop(img: &ImageBuffer<Rgba<u8>, Vec<u8>>, region: &PixelRect) -> Option<RgbaImage> {
    let (w, h) = img.dimensions();
    let x0 = region.x.min(w);
    let y0 = region.y.min(h);
    let rw = region.width.min(w - x0);
    let rh = region.height.min(h - y0);

    if rw == 0 || rh == 0 {
        return None;
    }

    Some(image::imageops::crop_imm(img, x0, y0, rw, rh).to_image())
}

/// Mean of each RGB channel, 0.0-255.0. None for an empty image.
pub fn average_color(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Option<[f32; 3]> {
    if img.width() == 0 || img.height() == 0 {
        return None;
    }

    let mut totals = [0f64; 3];
    let pixel_count = (img.width() as f64) * (img.height() as f64);

    for pixel in img.pixels() {
        totals[0] += pixel[0] as f64;
        totals[1] += pixel[1] as f64;
        totals[2] += pixel[2] as f64;
    }

    Some([
        (totals[0] / pixel_count) as f32,
        (totals[1] / pixel_count) as f32,
        (totals[2] / pixel_count) as f32,
    ])
}

/// The two nested portrait regions used to compare a cell with reference art.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortraitCrop {
    /// Cell minus the name/rating band and the side margins
    pub outer: PixelRect,
    /// Outer region minus a border on every side
    pub inner: PixelRect,
}

impl PortraitCrop {
    pub fn new(region: PixelRect, bottom: f32, side: f32, inner: f32) -> Self {
        let outer = region.shrink(side, 0.0, side, bottom);
        let inner = outer.shrink(inner, inner, inner, inner);
        Self { outer, inner }
    }
}
