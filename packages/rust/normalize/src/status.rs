//! Free-text status classification into the four canonical states.
//!
//! Rules are evaluated top to bottom; the first matching rule decides.
//! Order:
//!
//! 1. icon shortcuts (working, then broken, then repair),
//! 2. operational lexicon, skipped when the text negates a serviceable term,
//! 3. non-operational lexicon, including the negation override,
//! 4. repair/maintenance lexicon,
//! 5. otherwise [`Status::Unknown`].
//!
//! So a text that carries both a "serviceable" word and a negation word
//! ("не исправен", "yaroqli emas", "not working") is NonOperational.

use std::sync::LazyLock;

use fleettally_shared::Status;
use regex::Regex;

use crate::text::{fold, has_phrase, has_word_starting, prenormalize};

/// How a rule recognizes its state.
#[derive(Debug)]
pub enum Matcher {
    /// Glyphs looked up in the folded text (before punctuation stripping).
    Icon(&'static [&'static str]),
    /// Substrings of the pre-normalized text.
    Contains(&'static [&'static str]),
    /// Whole words or word sequences of the pre-normalized text.
    Words(&'static [&'static str]),
    /// Word stems: some word of the pre-normalized text starts with one.
    Stems(&'static [&'static str]),
    /// Regex over the pre-normalized text.
    Pattern(&'static LazyLock<Regex>),
    /// A serviceable term together with a negation word.
    NegatedServiceable,
}

/// One row of the status rule table.
#[derive(Debug)]
pub struct StatusRule {
    pub status: Status,
    pub any_of: &'static [Matcher],
    /// Skip this rule when the negation override applies.
    pub yields_to_negation: bool,
}

static IN_WORKING_CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bв\s*рабоч(ем|ее)?\s*состояни(и|е)\b").expect("valid regex")
});

static IN_REPAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bв\s*ремонтн").expect("valid regex"));

/// Words meaning "serviceable/working" that a negation flips.
pub static SERVICEABLE_STEMS: &[&str] = &[
    "исправ",
    "яроқли",
    "ярокли",
    "yaroqli",
    "yarokli",
    "serviceable",
    "operational",
    "working",
    "работает",
    "работают",
    "рабоч",
    "ишла",
    "ishla",
    "эксплуатац",
    "ekspluatats",
    "фойдаланиш",
    "foydalanish",
    "service",
    "active",
    "ready",
    "good",
    "soz",
    "faol",
];

/// Stand-alone negation words.
pub static NEGATION_WORDS: &[&str] = &["не", "нет", "not", "no", "non", "emas", "эмас"];

/// The status rule table, in evaluation order.
pub static STATUS_RULES: &[StatusRule] = &[
    StatusRule {
        status: Status::Operational,
        any_of: &[
            Matcher::Icon(&["✅", "🟢", "🟩", "✔"]),
            Matcher::Words(&["ok", "green"]),
        ],
        yields_to_negation: false,
    },
    StatusRule {
        status: Status::NonOperational,
        any_of: &[Matcher::Icon(&["⛔", "🛑", "🔴", "❌", "🟥"])],
        yields_to_negation: false,
    },
    StatusRule {
        status: Status::NeedsRepair,
        any_of: &[Matcher::Icon(&["🛠", "🔧", "🟡", "🟨", "⚠"])],
        yields_to_negation: false,
    },
    StatusRule {
        status: Status::Operational,
        any_of: &[
            Matcher::Contains(&[
                "яроқли",
                "ярокли",
                "yaroqli",
                "yarokli",
                "ишлайди",
                "ишламоқда",
                "ишлаб турибди",
                "ishlaydi",
                "ishlamoqda",
                "ishlab turibdi",
                "эксплуатацияда",
                "фойдаланишда",
                "foydalanishda",
                "ekspluatatsiyada",
                "в эксплуатации",
                "in service",
                "working",
            ]),
            Matcher::Words(&[
                "operational",
                "ready",
                "good",
                "active",
                "serviceable",
                "работает",
                "работают",
                "soz",
                "faol",
            ]),
            Matcher::Stems(&["исправ"]),
            Matcher::Pattern(&IN_WORKING_CONDITION),
        ],
        yields_to_negation: true,
    },
    StatusRule {
        status: Status::NonOperational,
        any_of: &[
            Matcher::Contains(&[
                "яроқсиз",
                "яроксиз",
                "yaroqsiz",
                "yaroksiz",
                "ишламаяпти",
                "ишламайди",
                "ишламаган",
                "ishlamayapti",
                "ishlamaydi",
                "ishlamagan",
                "ишдан чиққан",
                "ишдан чиккан",
                "ishdan chiqqan",
                "тизимдан ташқари",
                "tizimdan tashqari",
                "не работает",
                "в не исправн",
                "вне исправн",
                "неисправ",
                "broken",
                "inactive",
                "out of order",
                "out of service",
                "nonoperational",
                "қисман ишламайди",
                "qisman ishlamaydi",
                "частично не работает",
            ]),
            Matcher::Words(&["nosoz", "nofaol"]),
            Matcher::NegatedServiceable,
        ],
        yields_to_negation: false,
    },
    StatusRule {
        status: Status::NeedsRepair,
        any_of: &[
            Matcher::Contains(&[
                "таъмирталаб",
                "тамирталаб",
                "ta mirtalab",
                "tamirtalab",
                "таъмирда",
                "тамирда",
                "ta mirda",
                "tamirda",
                "ремонт",
                "remont",
                "обслуживан",
                "техобслуж",
                "maintenance",
                "repair",
            ]),
            Matcher::Pattern(&IN_REPAIR),
        ],
        yields_to_negation: false,
    },
];

/// True if the text pairs a serviceable term with a negation word.
pub fn negates_serviceable(normalized: &str) -> bool {
    SERVICEABLE_STEMS
        .iter()
        .any(|s| has_word_starting(normalized, s))
        && NEGATION_WORDS.iter().any(|n| has_phrase(normalized, n))
}

impl Matcher {
    fn matches(&self, folded: &str, normalized: &str) -> bool {
        match self {
            Matcher::Icon(glyphs) => glyphs.iter().any(|g| folded.contains(g)),
            Matcher::Contains(keys) => keys.iter().any(|k| normalized.contains(k)),
            Matcher::Words(words) => words.iter().any(|w| has_phrase(normalized, w)),
            Matcher::Stems(stems) => stems.iter().any(|s| has_word_starting(normalized, s)),
            Matcher::Pattern(re) => re.is_match(normalized),
            Matcher::NegatedServiceable => negates_serviceable(normalized),
        }
    }
}

impl StatusRule {
    fn matches(&self, folded: &str, normalized: &str) -> bool {
        if self.yields_to_negation && negates_serviceable(normalized) {
            return false;
        }
        self.any_of.iter().any(|m| m.matches(folded, normalized))
    }
}

/// Classify a free-text status cell. Never fails: unrecognized text is
/// [`Status::Unknown`].
pub fn classify_status(raw: &str) -> Status {
    if raw.trim().is_empty() {
        return Status::Unknown;
    }

    let folded = fold(raw);
    let normalized = prenormalize(raw);

    STATUS_RULES
        .iter()
        .find(|rule| rule.matches(&folded, &normalized))
        .map(|rule| rule.status)
        .unwrap_or(Status::Unknown)
}
