use regex::Regex;
use std::sync::LazyLock;

use super::OcrToken;
use crate::config::MergeConfig;

/// Digits with optional thousands separators: 123, 1234, 12,345, 1.234
static RATING_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+([,.]\d{3})*$").expect("valid rating regex"));

/// Four digits that read as a year (1900-2099), e.g. a name suffix like "2099"
static YEAR_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(19|20)\d{2}$").expect("valid year regex"));

/// Returns true if the text looks like a power rating and must stay on its own.
///
/// Year-like tokens are exempt so they can merge into the name they belong to.
pub fn is_rating_shaped(text: &str) -> bool {
    RATING_SHAPE.is_match(text) && !YEAR_SHAPE.is_match(text)
}

/// Orders tokens in reading order.
///
/// Tokens whose tops lie within `row_tolerance` of the first token of a row
/// belong to that row; rows are then ordered left to right.
fn reading_order(mut tokens: Vec<OcrToken>, row_tolerance: f32) -> Vec<OcrToken> {
    tokens.sort_by(|a, b| a.bounds.top().total_cmp(&b.bounds.top()));

    let mut rows: Vec<Vec<OcrToken>> = Vec::new();
    let mut row_top = f32::NEG_INFINITY;
    for token in tokens {
        let top = token.bounds.top();
        match rows.last_mut() {
            Some(row) if top - row_top <= row_tolerance => row.push(token),
            _ => {
                row_top = top;
                rows.push(vec![token]);
            }
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|a, b| a.bounds.left().total_cmp(&b.bounds.left()));
            row
        })
        .collect()
}

fn can_merge(current: &OcrToken, next: &OcrToken, config: &MergeConfig) -> bool {
    if is_rating_shaped(&current.text) || is_rating_shaped(&next.text) {
        return false;
    }

    let gap = next.bounds.left() - current.bounds.right();
    if gap < config.min_gap || gap >= config.max_gap {
        return false;
    }

    let overlap = current.bounds.vertical_overlap(&next.bounds);
    overlap > config.min_vertical_overlap * next.bounds.height()
}

fn join_text(left: &str, right: &str) -> String {
    if left.ends_with('-') || right.starts_with('-') {
        format!("{}{}", left, right)
    } else {
        format!("{} {}", left, right)
    }
}

/// Merges horizontally-adjacent tokens on the same line into single labels.
///
/// Ratings never merge with anything; a name split into several detections
/// becomes one label whose box covers all of them.
pub fn merge_tokens(tokens: Vec<OcrToken>, config: &MergeConfig) -> Vec<OcrToken> {
    let mut merged = Vec::new();
    let mut ordered = reading_order(tokens, config.row_tolerance).into_iter();

    let Some(mut current) = ordered.next() else {
        return merged;
    };

    for next in ordered {
        if can_merge(&current, &next, config) {
            current = OcrToken::new(
                join_text(&current.text, &next.text),
                current.bounds.union(&next.bounds),
            );
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }
    merged.push(current);

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Quad;

    fn token(text: &str, left: f32, right: f32, top: f32) -> OcrToken {
        OcrToken::new(text, Quad::from_rect(left, top, right - left, 20.0))
    }

    fn texts(tokens: &[OcrToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_is_rating_shaped() {
        assert!(is_rating_shaped("123"));
        assert!(is_rating_shaped("12,345"));
        assert!(is_rating_shaped("1.234"));
        assert!(is_rating_shaped("98765"));
        assert!(!is_rating_shaped("2099"));
        assert!(!is_rating_shaped("1985"));
        assert!(!is_rating_shaped("ABC"));
        assert!(!is_rating_shaped("12,34"));
    }

    #[test]
    fn test_close_tokens_merge() {
        let tokens = vec![token("ABC", 0.0, 40.0, 100.0), token("DEF", 42.0, 80.0, 100.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["ABC DEF"]);
        assert_eq!(merged[0].bounds.left(), 0.0);
        assert_eq!(merged[0].bounds.right(), 80.0);
    }

    #[test]
    fn test_distant_tokens_do_not_merge() {
        let tokens = vec![token("ABC", 0.0, 40.0, 100.0), token("DEF", 240.0, 280.0, 100.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["ABC", "DEF"]);
    }

    #[test]
    fn test_gap_at_max_does_not_merge() {
        let config = MergeConfig::default();
        let tokens = vec![
            token("ABC", 0.0, 40.0, 100.0),
            token("DEF", 40.0 + config.max_gap, 100.0, 100.0),
        ];
        assert_eq!(merge_tokens(tokens, &config).len(), 2);
    }

    #[test]
    fn test_slight_overlap_merges() {
        let tokens = vec![token("ABC", 0.0, 40.0, 100.0), token("DEF", 37.0, 80.0, 102.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["ABC DEF"]);
    }

    #[test]
    fn test_rating_never_merges_into_name() {
        let tokens = vec![token("HULK", 0.0, 40.0, 100.0), token("1,234", 45.0, 90.0, 100.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["HULK", "1,234"]);
    }

    #[test]
    fn test_year_merges_into_name() {
        let tokens = vec![token("SPIDER-MAN", 0.0, 90.0, 100.0), token("2099", 95.0, 130.0, 100.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["SPIDER-MAN 2099"]);
    }

    #[test]
    fn test_hyphen_joins_without_space() {
        let tokens = vec![
            token("SPIDER", 0.0, 60.0, 100.0),
            token("-", 61.0, 66.0, 100.0),
            token("MAN", 67.0, 100.0, 100.0),
        ];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["SPIDER-MAN"]);
    }

    #[test]
    fn test_separate_lines_do_not_merge() {
        let tokens = vec![token("ABC", 0.0, 40.0, 100.0), token("DEF", 42.0, 80.0, 140.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["ABC", "DEF"]);
    }

    #[test]
    fn test_reading_order_tolerates_jitter() {
        // Second token sits 4px higher but belongs to the same row
        let tokens = vec![token("DEF", 42.0, 80.0, 96.0), token("ABC", 0.0, 40.0, 100.0)];
        let merged = merge_tokens(tokens, &MergeConfig::default());
        assert_eq!(texts(&merged), vec!["ABC DEF"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_tokens(Vec::new(), &MergeConfig::default()).is_empty());
    }
}
