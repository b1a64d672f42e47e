use std::collections::BTreeMap;

/// Maps a glyph that OCR emits in place of a Latin letter (Cyrillic and
/// Greek lookalikes) to the intended letter.
fn confusable_to_latin(c: char) -> Option<char> {
    let latin = match c {
        // Cyrillic upper case
        'А' => 'A',
        'В' => 'B',
        'Е' | 'Ё' => 'E',
        'К' => 'K',
        'М' => 'M',
        'Н' => 'H',
        'О' => 'O',
        'Р' => 'P',
        'С' => 'C',
        'Т' => 'T',
        'У' => 'Y',
        'Х' => 'X',
        'І' => 'I',
        'Ј' => 'J',
        'Ѕ' => 'S',
        // Cyrillic lower case
        'а' => 'a',
        'е' => 'e',
        'о' => 'o',
        'р' => 'p',
        'с' => 'c',
        'у' => 'y',
        'х' => 'x',
        'і' => 'i',
        'ј' => 'j',
        'ѕ' => 's',
        // Greek upper case
        'Α' => 'A',
        'Β' => 'B',
        'Ε' => 'E',
        'Ζ' => 'Z',
        'Η' => 'H',
        'Ι' => 'I',
        'Κ' => 'K',
        'Μ' => 'M',
        'Ν' => 'N',
        'Ο' => 'O',
        'Ρ' => 'P',
        'Τ' => 'T',
        'Υ' => 'Y',
        'Χ' => 'X',
        // Greek lower case
        'ο' => 'o',
        'ν' => 'v',
        _ => return None,
    };
    Some(latin)
}

/// Cleans a single OCR token.
///
/// Replaces confusable glyphs, then applies whole-word corrections. A
/// correction matches the raw or the glyph-corrected token exactly, ignoring
/// case, and replaces it entirely.
pub fn normalize_text(text: &str, corrections: &BTreeMap<String, String>) -> String {
    let trimmed = text.trim();
    let fixed: String = trimmed
        .chars()
        .map(|c| confusable_to_latin(c).unwrap_or(c))
        .collect();

    let raw_upper = trimmed.to_uppercase();
    let fixed_upper = fixed.to_uppercase();
    for (wrong, right) in corrections {
        let wrong_upper = wrong.to_uppercase();
        if wrong_upper == fixed_upper || wrong_upper == raw_upper {
            return right.clone();
        }
    }

    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeConfig;

    fn corrections() -> BTreeMap<String, String> {
        MergeConfig::default().word_corrections
    }

    #[test]
    fn test_cyrillic_lookalikes_become_latin() {
        // "НЕСТОR" written with Cyrillic Н, Е, С, Т, О
        let text = "\u{041D}\u{0415}\u{0421}\u{0422}\u{041E}R";
        assert_eq!(normalize_text(text, &corrections()), "HECTOR");
    }

    #[test]
    fn test_greek_lookalikes_become_latin() {
        assert_eq!(normalize_text("\u{039A}\u{0391}NG", &corrections()), "KANG");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(normalize_text("  IRON MAN ", &corrections()), "IRON MAN");
        assert_eq!(normalize_text("12,345", &corrections()), "12,345");
    }

    #[test]
    fn test_word_correction_is_case_insensitive() {
        assert_eq!(normalize_text("l0ki", &corrections()), "LOKI");
        assert_eq!(normalize_text("L0KI", &corrections()), "LOKI");
    }

    #[test]
    fn test_word_correction_after_glyph_fix() {
        // Cyrillic Т and Н in "TH0R"
        assert_eq!(normalize_text("\u{0422}\u{041D}0R", &corrections()), "THOR");
    }

    #[test]
    fn test_word_correction_needs_exact_match() {
        assert_eq!(normalize_text("L0KIS", &corrections()), "L0KIS");
    }

    #[test]
    fn test_letters_never_become_digits() {
        // Cyrillic З resembles a digit, not a Latin letter
        assert_eq!(normalize_text("\u{0417}EMO", &BTreeMap::new()), "\u{0417}EMO");
    }
}
