//! Portrait fingerprints: perceptual hash plus average colour.

use anyhow::{anyhow, Result};
use image::RgbaImage;
use img_hash::{HashAlg, HasherConfig};

use crate::imaging::average_color;

/// What two portraits are compared by.
#[derive(Clone, Debug, PartialEq)]
pub struct PortraitSignature {
    /// Perceptual hash as lowercase hex
    pub hash: String,
    /// Mean RGB, 0.0-255.0
    pub color: [f32; 3],
}

/// Computes signatures in memory with a fixed hash size.
#[derive(Clone, Copy, Debug)]
pub struct SignatureHasher {
    hash_size: u32,
}

impl SignatureHasher {
    pub fn new(hash_size: u32) -> Self {
        Self {
            hash_size: hash_size.max(2),
        }
    }

    /// Gradient hash of an image, as hex.
    pub fn hash(&self, img: &RgbaImage) -> Result<String> {
        // img_hash is built on its own copy of the image crate
        let (w, h) = img.dimensions();
        let buffer = img_hash::image::RgbaImage::from_raw(w, h, img.as_raw().clone())
            .ok_or_else(|| anyhow!("Invalid {}x{} buffer for hashing", w, h))?;
        let converted = img_hash::image::DynamicImage::ImageRgba8(buffer);

        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Gradient)
            .hash_size(self.hash_size, self.hash_size)
            .to_hasher();
        let hash = hasher.hash_image(&converted);

        Ok(hash.as_bytes().iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn signature(&self, img: &RgbaImage) -> Result<PortraitSignature> {
        let color = average_color(img).ok_or_else(|| anyhow!("Cannot fingerprint an empty image"))?;
        Ok(PortraitSignature {
            hash: self.hash(img)?,
            color,
        })
    }
}

/// Number of differing bits between two hex hashes of equal length.
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    if a.len() != b.len() {
        return None;
    }
    a.chars()
        .zip(b.chars())
        .map(|(x, y)| Some((x.to_digit(16)? ^ y.to_digit(16)?).count_ones()))
        .sum()
}

/// Hamming distance as a fraction of the hash length in bits.
pub fn normalized_hamming(a: &str, b: &str) -> Option<f32> {
    if a.is_empty() {
        return None;
    }
    let bits = (a.len() * 4) as f32;
    hamming_distance(a, b).map(|d| d as f32 / bits)
}

/// Euclidean RGB distance scaled to 0.0-1.0.
pub fn color_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    sum.sqrt() / (255.0 * 3f32.sqrt())
}
