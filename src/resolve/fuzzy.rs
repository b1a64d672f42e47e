use strsim::normalized_levenshtein;

use crate::catalog::CatalogEntry;

/// Upper-cased alphanumeric words of a name.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_uppercase())
        .collect()
}

/// Similarity of two names in 0.0-1.0, insensitive to case, punctuation and
/// word order.
///
/// Takes the better of a sorted-words comparison and an intersection-based
/// comparison. The latter lets "HULK" match "HULK (CLASSIC)" but is scaled
/// down so it never ties an exact match.
pub fn similarity(a: &str, b: &str) -> f32 {
    let mut wa = words(a);
    let mut wb = words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    wa.sort();
    wb.sort();

    let sorted_a = wa.join(" ");
    let sorted_b = wb.join(" ");
    let sort_ratio = normalized_levenshtein(&sorted_a, &sorted_b);

    let common: Vec<&String> = wa.iter().filter(|w| wb.contains(w)).collect();
    if common.is_empty() {
        return sort_ratio as f32;
    }

    let rest = |all: &[String]| -> String {
        let mut parts: Vec<&str> = common.iter().map(|w| w.as_str()).collect();
        parts.extend(all.iter().filter(|w| !common.contains(w)).map(|w| w.as_str()));
        parts.join(" ")
    };
    let intersection = common.iter().map(|w| w.as_str()).collect::<Vec<_>>().join(" ");
    let with_a = rest(&wa);
    let with_b = rest(&wb);
    let set_ratio = normalized_levenshtein(&intersection, &with_a)
        .max(normalized_levenshtein(&intersection, &with_b))
        .max(normalized_levenshtein(&with_a, &with_b));

    sort_ratio.max(0.95 * set_ratio) as f32
}

/// Best catalog entry for an OCR name, compared against both canonical and
/// short names. Ties go to the smaller id. None below `threshold`.
pub fn best_match<'a>(
    candidate: &str,
    entries: &'a [CatalogEntry],
    threshold: f32,
) -> Option<(&'a CatalogEntry, f32)> {
    let mut best: Option<(&CatalogEntry, f32)> = None;

    for entry in entries {
        let score = similarity(candidate, &entry.short_name)
            .max(similarity(candidate, &entry.canonical_name));
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score || (score == current_score && entry.id < current.id)
            }
        };
        if better {
            best = Some((entry, score));
        }
    }

    best.filter(|(_, score)| *score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, canonical: &str, short: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            canonical_name: canonical.to_string(),
            short_name: short.to_string(),
            reference_portrait_url: String::new(),
            icon: None,
        }
    }

    #[test]
    fn test_similarity_exact_and_case() {
        assert_eq!(similarity("IRON MAN", "Iron Man"), 1.0);
        assert_eq!(similarity("SPIDER-MAN", "Spider Man"), 1.0);
    }

    #[test]
    fn test_similarity_word_order() {
        assert_eq!(similarity("AMERICA CAPTAIN", "CAPTAIN AMERICA"), 1.0);
    }

    #[test]
    fn test_similarity_tolerates_ocr_noise() {
        assert!(similarity("CAPTAIN AMERlCA", "CAPTAIN AMERICA") > 0.9);
        assert!(similarity("IRONHEART", "IRON MAN") < 0.8);
    }

    #[test]
    fn test_subset_scores_below_exact() {
        let subset = similarity("HULK", "RED HULK");
        assert!(subset < 1.0);
        assert!(subset >= 0.9);
    }

    #[test]
    fn test_similarity_empty() {
        assert_eq!(similarity("", "HULK"), 0.0);
        assert_eq!(similarity("---", "HULK"), 0.0);
    }

    #[test]
    fn test_best_match_prefers_exact() {
        let entries = vec![
            entry("red-hulk", "Red Hulk", "RED HULK"),
            entry("hulk", "Hulk", "HULK"),
        ];
        let (entry, score) = best_match("HULK", &entries, 0.8).unwrap();
        assert_eq!(entry.id, "hulk");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_best_match_uses_canonical_name() {
        let entries = vec![entry("cap", "Captain America", "CAP")];
        let (entry, _) = best_match("CAPTAIN AMERICA", &entries, 0.8).unwrap();
        assert_eq!(entry.short_name, "CAP");
    }

    #[test]
    fn test_best_match_below_threshold() {
        let entries = vec![entry("hulk", "Hulk", "HULK")];
        assert!(best_match("WOLVERINE", &entries, 0.8).is_none());
    }
}
