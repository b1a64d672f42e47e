//! Pipeline configuration.
//!
//! Every heuristic constant of the pipeline lives here. Loads overrides from
//! a JSON file; sections and fields missing from the file keep their
//! defaults, so a config only needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Complete pipeline configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub merge: MergeConfig,
    pub grid: GridConfig,
    pub resolve: ResolveConfig,
    pub attribute: AttributeConfig,
    pub debug: DebugConfig,
}

/// Token cleanup and same-line merging.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Tokens whose tops differ by at most this many pixels sort as one row
    pub row_tolerance: f32,
    /// Gaps at or above this many pixels never merge
    pub max_gap: f32,
    /// Largest allowed overlap, as a negative gap
    pub min_gap: f32,
    /// Required vertical overlap as a fraction of the next token's height
    pub min_vertical_overlap: f32,
    /// Whole-token corrections, matched case-insensitively
    pub word_corrections: BTreeMap<String, String>,
}

/// Name/rating pairing and grid synthesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Text of the banner that closes the header region
    pub banner_keyword: String,
    /// Largest distance from a name's bottom to its rating's top
    pub pair_max_dy: f32,
    /// Largest horizontal offset between name and rating centres
    pub pair_max_dx: f32,
    /// Anchor coordinates within this many pixels of a cluster start join it
    pub cluster_tolerance: f32,
    /// Cell width as a fraction of column spacing
    pub cell_width_fraction: f32,
    /// Cell height as a fraction of row spacing
    pub cell_height_fraction: f32,
    /// Cell centre right of the rating anchor, as a fraction of column spacing
    pub center_offset_x: f32,
    /// Cell centre above the rating anchor, as a fraction of row spacing
    pub center_offset_y: f32,
    /// Column spacing as a fraction of image width when only one column exists
    pub column_spacing_fallback: f32,
    /// Row spacing as a fraction of image width when only one row exists
    pub row_spacing_fallback: f32,
    /// Single-cell width in rating glyph widths
    pub single_glyph_multiplier: f32,
    /// Single-cell height over width
    pub single_aspect_ratio: f32,
}

/// Catalog matching and portrait disambiguation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Minimum similarity (0.0-1.0) for a fuzzy catalog match
    pub fuzzy_threshold: f32,
    /// Bottom share of a cell reserved for the name and rating lines
    pub portrait_bottom_fraction: f32,
    /// Share removed from each side of the cell for the portrait crop
    pub portrait_side_fraction: f32,
    /// Share removed from every side of the portrait crop for the inner crop
    pub inner_fraction: f32,
    /// Perceptual hash side length (hash_size x hash_size bits)
    pub hash_size: u32,
    /// Weight of normalized Hamming distance in the candidate score
    pub hash_weight: f32,
    /// Weight of normalized average-colour distance in the candidate score
    pub color_weight: f32,
    /// Timeout for a single reference portrait download (milliseconds)
    pub fetch_timeout_ms: u64,
}

/// Glow detection strip.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// Strip top below the cell top, as a fraction of cell height
    pub top_offset: f32,
    /// Strip width as a fraction of cell width, centred
    pub width_fraction: f32,
    /// Strip height as a fraction of cell height
    pub height_fraction: f32,
    /// Mean blue channel above this = activated
    pub blue_threshold: f32,
}

/// Diagnostic overlay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Border thickness in pixels
    pub line_thickness: u32,
    /// Side length of reference thumbnails
    pub thumbnail_size: u32,
}

fn default_word_corrections() -> BTreeMap<String, String> {
    [
        ("0DIN", "ODIN"),
        ("L0KI", "LOKI"),
        ("TH0R", "THOR"),
        ("M0DOK", "MODOK"),
        ("1RONHEART", "IRONHEART"),
        ("V1SION", "VISION"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 10.0,
            max_gap: 30.0,
            min_gap: -5.0,
            min_vertical_overlap: 0.5,
            word_corrections: default_word_corrections(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            banner_keyword: "COLLECTION".to_string(),
            pair_max_dy: 80.0,
            pair_max_dx: 60.0,
            cluster_tolerance: 40.0,
            cell_width_fraction: 0.9,
            cell_height_fraction: 0.92,
            center_offset_x: 0.12,
            center_offset_y: 0.42,
            column_spacing_fallback: 0.18,
            row_spacing_fallback: 0.24,
            single_glyph_multiplier: 11.0,
            single_aspect_ratio: 1.3,
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            portrait_bottom_fraction: 0.28,
            portrait_side_fraction: 0.08,
            inner_fraction: 0.15,
            hash_size: 8,
            hash_weight: 1.0,
            // Colour distance is computed and reported but not scored yet
            color_weight: 0.0,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            top_offset: 0.04,
            width_fraction: 0.5,
            height_fraction: 0.03,
            blue_threshold: 150.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            line_thickness: 2,
            thumbnail_size: 48,
        }
    }
}

impl PipelineConfig {
    /// Loads config from a JSON file, or returns defaults if it is missing or invalid.
    pub fn load(config_path: &Path) -> Self {
        crate::log(&format!("Looking for config at: {}", config_path.display()));

        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(config) => {
                        crate::log(&format!("Config loaded from {}", config_path.display()));
                        return config;
                    }
                    Err(e) => {
                        crate::log(&format!(
                            "Failed to parse {}: {}. Using defaults.",
                            config_path.display(),
                            e
                        ));
                    }
                },
                Err(e) => {
                    crate::log(&format!(
                        "Failed to read {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    ));
                }
            }
        } else {
            crate::log("Config file not found. Using default config.");
        }

        Self::default()
    }

    /// Saves the default config to a file (for reference).
    pub fn save_default(config_path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(config_path, json)?;
        Ok(())
    }
}
