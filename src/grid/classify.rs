use regex::Regex;
use std::sync::LazyLock;

use crate::ocr::OcrToken;

/// Power rating as printed: 12,345 / 1.234 / 987
static RATING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}[,.]\d{3}|\d{3})$").expect("valid rating regex"));

/// Upper-case name line: letters, digits and the punctuation names use
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9 .'&:!\-]*$").expect("valid name regex"));

/// Star/rank badges that OCR reads as text
static STAR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[★☆✩✪✭*+]+$").expect("valid star regex"));

/// Labels split into the two roles the grid is built from.
#[derive(Debug, Default)]
pub struct Classified {
    pub ratings: Vec<OcrToken>,
    pub names: Vec<OcrToken>,
}

pub fn is_rating(text: &str) -> bool {
    RATING_PATTERN.is_match(text)
}

pub fn is_name_candidate(text: &str) -> bool {
    NAME_PATTERN.is_match(text)
        && text.chars().any(|c| c.is_ascii_uppercase())
        && !STAR_RUN.is_match(text)
}

/// Bottom edge of the first label containing the banner keyword.
pub fn find_header_boundary(labels: &[OcrToken], keyword: &str) -> Option<f32> {
    if keyword.is_empty() {
        return None;
    }
    let keyword = keyword.to_uppercase();
    labels
        .iter()
        .find(|label| label.text.to_uppercase().contains(&keyword))
        .map(|label| label.bounds.bottom())
}

/// Keeps labels whose centre lies below the header boundary.
pub fn discard_above(labels: &[OcrToken], boundary: Option<f32>) -> Vec<OcrToken> {
    match boundary {
        Some(y) => labels
            .iter()
            .filter(|label| label.bounds.center().y > y)
            .cloned()
            .collect(),
        None => labels.to_vec(),
    }
}

/// Separates rating tokens from name candidates. Anything else is dropped.
pub fn classify(labels: &[OcrToken]) -> Classified {
    let mut classified = Classified::default();
    for label in labels {
        if is_rating(&label.text) {
            classified.ratings.push(label.clone());
        } else if is_name_candidate(&label.text) {
            classified.names.push(label.clone());
        }
    }
    classified
}
