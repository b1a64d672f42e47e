use anyhow::{anyhow, Context, Result};
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{ensure_tesseract, TesseractPaths};
use super::{OcrService, OcrToken};
use crate::geometry::Quad;

/// OCR backed by the Tesseract CLI.
///
/// Tesseract reports words with axis-aligned boxes; they are returned as
/// tokens after a synthesized whole-image summary token.
pub struct TesseractOcr {
    paths: TesseractPaths,
    /// Page segmentation mode; 11 = sparse text, suits scattered labels
    psm: u8,
}

impl TesseractOcr {
    pub fn new(paths: TesseractPaths) -> Self {
        Self { paths, psm: 11 }
    }

    /// Locates Tesseract on this machine.
    pub fn discover() -> Result<Self> {
        Ok(Self::new(ensure_tesseract()?))
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }
}

impl OcrService for TesseractOcr {
    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<OcrToken>> {
        let img = image::load_from_memory(image_bytes).context("Failed to decode screenshot")?;
        let (width, height) = (img.width() as f32, img.height() as f32);

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        // Create temporary output file (Tesseract adds .tsv extension)
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let output = Command::new(&self.paths.executable)
            .arg(temp_input.path())
            .arg(&output_base)
            .arg("--tessdata-dir")
            .arg(&self.paths.tessdata)
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        let words = parse_tsv_tokens(&tsv_content);
        crate::log(&format!("Tesseract: {} words detected", words.len()));

        if words.is_empty() {
            return Ok(Vec::new());
        }

        let summary_text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let mut tokens = Vec::with_capacity(words.len() + 1);
        tokens.push(OcrToken::new(summary_text, Quad::from_rect(0.0, 0.0, width, height)));
        tokens.extend(words);
        Ok(tokens)
    }
}

/// Parses word rows (level 5) of Tesseract TSV output into tokens.
fn parse_tsv_tokens(tsv: &str) -> Vec<OcrToken> {
    let mut tokens = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        if level != 5 || conf < 0.0 || text.is_empty() {
            continue;
        }

        let parse = |s: &str| s.parse::<f32>().ok();
        let (Some(left), Some(top), Some(w), Some(h)) =
            (parse(fields[6]), parse(fields[7]), parse(fields[8]), parse(fields[9]))
        else {
            continue;
        };

        tokens.push(OcrToken::new(text, Quad::from_rect(left, top, w, h)));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
4\t1\t1\t1\t1\t0\t100\t200\t120\t20\t-1\t
5\t1\t1\t1\t1\t1\t100\t200\t60\t20\t91.5\tIRON
5\t1\t1\t1\t1\t2\t165\t200\t55\t20\t90.1\tMAN
5\t1\t1\t1\t2\t1\t120\t230\t70\t18\t88.0\t12,345
5\t1\t1\t1\t2\t2\t200\t230\t10\t18\t95.0\t ";

    #[test]
    fn test_parse_tsv_words_only() {
        let tokens = parse_tsv_tokens(TSV);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["IRON", "MAN", "12,345"]);
    }

    #[test]
    fn test_parse_tsv_boxes() {
        let tokens = parse_tsv_tokens(TSV);
        let man = &tokens[1];
        assert_eq!(man.bounds.left(), 165.0);
        assert_eq!(man.bounds.top(), 200.0);
        assert_eq!(man.bounds.right(), 220.0);
        assert_eq!(man.bounds.bottom(), 220.0);
    }

    #[test]
    fn test_parse_tsv_skips_short_rows() {
        assert!(parse_tsv_tokens("header\n5\t1\t1").is_empty());
    }
}
