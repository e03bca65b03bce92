//! Tracker (GPS) presence parsing.

use crate::text::{has_phrase, prenormalize};

/// Phrases stating the tracker is absent. Checked before [`PRESENT_PHRASES`]
/// because "мавжуд эмас" contains "мавжуд".
const ABSENT_PHRASES: &[&str] = &[
    "мавжуд эмас",
    "mavjud emas",
    "мавжуд эмес",
    "не установлен",
    "не подключен",
    "отсутствует",
    "not available",
    "unavailable",
    "not installed",
];

const PRESENT_PHRASES: &[&str] = &[
    "мавжуд",
    "mavjud",
    "установлен",
    "подключен",
    "available",
    "installed",
];

/// Whole-cell answers meaning "no".
const NO_TOKENS: &[&str] = &[
    "no", "нет", "yo q", "yoq", "йўқ", "йук", "йуқ", "yuk", "false", "n", "н", "0",
];

/// Whole-cell answers meaning "yes".
const YES_TOKENS: &[&str] = &[
    "yes", "да", "ha", "xa", "ҳа", "ха", "bor", "бор", "есть", "true", "y", "д",
];

const TRACKER_WORDS: &[&str] = &["gps", "трекер", "tracker", "glonass", "глонасс"];

const NEGATIONS: &[&str] = &["не", "нет", "no", "not", "yo q", "yoq", "йўқ", "эмас", "emas"];

/// Interpret a tracker cell as present/absent.
///
/// Numbers count as present when positive; everything unrecognized is absent.
pub fn parse_tracker(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }

    if let Ok(n) = trimmed.replace(',', ".").parse::<f64>() {
        if n.is_finite() {
            return n > 0.0;
        }
    }

    let text = prenormalize(trimmed);
    if text.is_empty() {
        return false;
    }

    if ABSENT_PHRASES.iter().any(|p| text.contains(p)) {
        return false;
    }
    if PRESENT_PHRASES.iter().any(|p| text.contains(p)) {
        return true;
    }
    if NO_TOKENS.contains(&text.as_str()) {
        return false;
    }
    if YES_TOKENS.contains(&text.as_str()) {
        return true;
    }

    TRACKER_WORDS.iter().any(|w| text.contains(w))
        && !NEGATIONS.iter().any(|n| has_phrase(&text, n))
}
