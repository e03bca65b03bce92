//! Core domain types for fleettally datasets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel key for the whole-republic dataset.
pub const ALL_KEY: &str = "ALL";

// ---------------------------------------------------------------------------
// SourceKey
// ---------------------------------------------------------------------------

/// Identifies a cached dataset: one region's feed, or every feed combined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    /// All configured sources combined.
    All,
    /// A single region's source, by region name.
    Region(String),
}

impl SourceKey {
    /// Parse a user-supplied key. `"ALL"` (any case) maps to [`SourceKey::All`].
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(ALL_KEY) {
            Self::All
        } else {
            Self::Region(trimmed.to_string())
        }
    }

    /// Region name, if this key names a single region.
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Region(name) => Some(name),
        }
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str(ALL_KEY),
            Self::Region(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// RawRow
// ---------------------------------------------------------------------------

/// One upstream row: ordered `(header, value)` cells, exactly as delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    /// Build a row from header/value string pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            cells: pairs
                .into_iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Value under `header` (compared against the trimmed column name).
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h.trim() == header)
            .map(|(_, v)| v.as_str())
    }

    /// Headers in column order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    /// True if every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Canonical operating state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Operational,
    NonOperational,
    NeedsRepair,
    Unknown,
}

impl Status {
    /// All states in report order (working, broken, repair, unknown).
    pub const ALL: [Status; 4] = [
        Status::Operational,
        Status::NonOperational,
        Status::NeedsRepair,
        Status::Unknown,
    ];

    /// Display label used in reports. Feeding it back through the status
    /// classifier yields the same state.
    pub fn label(self) -> &'static str {
        match self {
            Status::Operational => "Ярокли",
            Status::NonOperational => "Яроксиз",
            Status::NeedsRepair => "Таъмирталаб",
            Status::Unknown => "Холати номаълум",
        }
    }

    /// Colored marker for compact report lines.
    pub fn marker(self) -> &'static str {
        match self {
            Status::Operational => "🟩",
            Status::NonOperational => "🟥",
            Status::NeedsRepair => "🟨",
            Status::Unknown => "⬛",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CanonicalRecord
// ---------------------------------------------------------------------------

/// One normalized upstream row.
///
/// `kind` is never empty and `quantity` is always at least 1; the row
/// pipeline guarantees both before constructing a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Owning region (the source's name).
    pub region_name: String,
    /// City or district inside the region; the region name when the row left it blank.
    pub city_district: String,
    /// Canonical equipment/vehicle type label.
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
    pub quantity: u32,
    pub has_tracker: bool,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// An immutable snapshot of canonical records for one [`SourceKey`].
///
/// Cloning is cheap and shares the underlying records; nothing can mutate
/// them after construction, so a clone is as good as a defensive copy.
#[derive(Debug, Clone)]
pub struct Dataset {
    key: SourceKey,
    fetched_at: DateTime<Utc>,
    records: Arc<[CanonicalRecord]>,
}

impl Dataset {
    pub fn new(key: SourceKey, fetched_at: DateTime<Utc>, records: Vec<CanonicalRecord>) -> Self {
        Self {
            key,
            fetched_at,
            records: records.into(),
        }
    }

    /// A dataset with no records.
    pub fn empty(key: SourceKey, fetched_at: DateTime<Utc>) -> Self {
        Self::new(key, fetched_at, Vec::new())
    }

    /// Concatenate several per-source datasets under a new key.
    pub fn combine(
        key: SourceKey,
        fetched_at: DateTime<Utc>,
        parts: impl IntoIterator<Item = Dataset>,
    ) -> Self {
        let records: Vec<CanonicalRecord> = parts
            .into_iter()
            .flat_map(|d| d.records.iter().cloned().collect::<Vec<_>>())
            .collect();
        Self::new(key, fetched_at, records)
    }

    pub fn key(&self) -> &SourceKey {
        &self.key
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of `quantity` over all records.
    pub fn total_units(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.quantity)).sum()
    }

    /// Records matching `pred`, copied out for further slicing.
    pub fn filter(&self, pred: impl Fn(&CanonicalRecord) -> bool) -> Vec<CanonicalRecord> {
        self.records.iter().filter(|r| pred(r)).cloned().collect()
    }
}
