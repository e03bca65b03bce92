//! Text normalization and classification of free-text spreadsheet cells.
//!
//! - [`classify_type`] maps equipment names onto canonical type labels.
//! - [`classify_status`] maps status text onto [`Status`](fleettally_shared::Status).
//! - [`parse_tracker`] reads tracker presence.
//!
//! All classifiers are pure and total: unrecognized input yields a
//! fallback value, never an error.

mod equipment;
mod status;
mod text;
mod tracker;

pub use equipment::{
    EQUIPMENT_KEYWORDS, SUMMARY_MARKERS, TYPE_LEXICON, classify_type, is_equipment,
};
pub use status::{
    Matcher, NEGATION_WORDS, SERVICEABLE_STEMS, STATUS_RULES, StatusRule, classify_status,
    negates_serviceable,
};
pub use text::{fold, prenormalize};
pub use tracker::parse_tracker;
