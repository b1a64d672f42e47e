pub mod engine;
pub mod merge;
pub mod normalize;
pub mod recorded;
pub mod setup;

pub use engine::TesseractOcr;
pub use merge::{is_rating_shaped, merge_tokens};
pub use normalize::normalize_text;
pub use recorded::RecordedOcr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::MergeConfig;
use crate::geometry::Quad;

/// A piece of text found by an OCR detector, with its box in image pixels.
///
/// Merged labels share this shape; their box spans every merged fragment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    pub bounds: Quad,
}

impl OcrToken {
    pub fn new(text: impl Into<String>, bounds: Quad) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}

/// A text detector.
///
/// The first returned token summarizes the whole image; the rest are the
/// individual detections in detector order.
pub trait OcrService {
    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<OcrToken>>;
}

/// High-level function: detector output → corrected, line-merged labels.
///
/// Drops the leading summary token, fixes confusable glyphs in each token,
/// then merges same-line fragments.
pub fn prepare_labels(detections: &[OcrToken], config: &MergeConfig) -> Vec<OcrToken> {
    let tokens: Vec<OcrToken> = detections
        .iter()
        .skip(1)
        .map(|t| OcrToken::new(normalize_text(&t.text, &config.word_corrections), t.bounds))
        .filter(|t| !t.text.is_empty())
        .collect();

    let token_count = tokens.len();
    let labels = merge_tokens(tokens, config);

    crate::log(&format!(
        "OCR: {} tokens merged into {} labels",
        token_count,
        labels.len()
    ));

    labels
}
