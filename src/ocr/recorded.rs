use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{OcrService, OcrToken};

/// Replays detections saved from an earlier OCR run.
///
/// The file is a JSON array of `{ "text": ..., "bounds": [{x,y} x 4] }`
/// whose first element is the whole-image summary, as any detector returns.
pub struct RecordedOcr {
    path: PathBuf,
}

impl RecordedOcr {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(path: &Path) -> Result<Vec<OcrToken>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read detections from {}", path.display()))?;
        let tokens: Vec<OcrToken> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse detections in {}", path.display()))?;
        Ok(tokens)
    }
}

impl OcrService for RecordedOcr {
    fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<OcrToken>> {
        Self::load(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Quad;
    use tempfile::tempdir;

    #[test]
    fn test_replays_saved_detections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("detections.json");
        let tokens = vec![
            OcrToken::new("HULK 12,345", Quad::from_rect(0.0, 0.0, 500.0, 500.0)),
            OcrToken::new("HULK", Quad::from_rect(10.0, 200.0, 50.0, 18.0)),
            OcrToken::new("12,345", Quad::from_rect(12.0, 225.0, 46.0, 16.0)),
        ];
        fs::write(&path, serde_json::to_string(&tokens).unwrap()).unwrap();

        let replayed = RecordedOcr::new(&path).detect(&[]).unwrap();
        assert_eq!(replayed, tokens);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let ocr = RecordedOcr::new(dir.path().join("missing.json"));
        assert!(ocr.detect(&[]).is_err());
    }

    #[test]
    fn test_reads_documented_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("detections.json");
        fs::write(
            &path,
            r#"[{ "text": "HULK", "bounds": [
                {"x": 10, "y": 20}, {"x": 60, "y": 20}, {"x": 60, "y": 38}, {"x": 10, "y": 38}
            ] }]"#,
        )
        .unwrap();

        let tokens = RecordedOcr::load(&path).unwrap();
        assert_eq!(tokens[0].bounds, Quad::from_rect(10.0, 20.0, 50.0, 18.0));
    }
}
