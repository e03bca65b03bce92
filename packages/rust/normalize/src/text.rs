//! Shared text pre-normalization and word-level matching helpers.
//!
//! Every classifier runs its input through [`prenormalize`] first, so the
//! lexicon tables only need to list one canonical spelling per phrase
//! (lower-case, single spaces, punctuation replaced by spaces).

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Apostrophe look-alikes typed by different keyboard layouts.
const APOSTROPHES: &[char] = &[
    'ʼ', '’', '‘', 'ʹ', '′', '`', '´', 'ʽ', 'ꞌ', 'ʻ',
];

/// Unify apostrophes, apply NFKC, collapse NBSP and lower-case.
///
/// Punctuation and symbols survive this step, so icon glyphs can still be
/// detected on the result.
pub fn fold(s: &str) -> String {
    let unified: String = s
        .chars()
        .map(|c| if APOSTROPHES.contains(&c) { '\'' } else { c })
        .collect();
    unified
        .nfkc()
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Full pre-normalization: [`fold`], then non-word characters become spaces
/// and whitespace runs collapse to one space.
pub fn prenormalize(s: &str) -> String {
    static NON_WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\w\s]+").expect("valid regex"));

    let folded = fold(s);
    let spaced = NON_WORD_RE.replace_all(&folded, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `phrase` occurs in `text` as whole words.
pub(crate) fn has_phrase(text: &str, phrase: &str) -> bool {
    format!(" {text} ").contains(&format!(" {phrase} "))
}

/// True if any word of `text` starts with `stem`.
pub(crate) fn has_word_starting(text: &str, stem: &str) -> bool {
    text.split(' ').any(|w| w.starts_with(stem))
}

/// First char upper-case, the rest lower-case.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prenormalize_unifies_apostrophes_and_punctuation() {
        assert_eq!(prenormalize("Ta’mirtalab!"), "ta mirtalab");
        assert_eq!(prenormalize("taʼmirtalab"), "ta mirtalab");
        assert_eq!(prenormalize("  Ишлайди,\u{00A0}\u{00A0}  яроқли "), "ишлайди яроқли");
        assert_eq!(prenormalize("---"), "");
    }

    #[test]
    fn fold_keeps_symbols() {
        assert_eq!(fold("✅ OK"), "✅ ok");
        assert_eq!(fold("ＧＰＳ"), "gps");
    }

    #[test]
    fn phrase_matching_respects_word_boundaries() {
        assert!(has_phrase("is active now", "active"));
        assert!(!has_phrase("inactive", "active"));
        assert!(has_phrase("out of order", "out of order"));
        assert!(has_word_starting("не исправен", "исправ"));
        assert!(!has_word_starting("неисправен", "исправ"));
    }

    #[test]
    fn capitalize_uppercases_first_and_lowercases_rest() {
        assert_eq!(capitalize("ЭКСКАВАТОР jcb"), "Экскаватор jcb");
        assert_eq!(capitalize("motor grader"), "Motor grader");
        assert_eq!(capitalize(""), "");
    }
}
