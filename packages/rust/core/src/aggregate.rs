//! Aggregation engine: grouped sums over canonical records.
//!
//! Every function is pure and accepts any slice of records, including an
//! empty one. Ranked outputs are sorted by units descending, ties broken by
//! case-insensitive key ascending, so input order never shows through.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use fleettally_normalize::{classify_type, is_equipment};
use fleettally_shared::{CanonicalRecord, Status};

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Dimension a record can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Region,
    District,
    Type,
    Status,
}

impl GroupKey {
    fn value(self, record: &CanonicalRecord) -> String {
        match self {
            GroupKey::Region => record.region_name.clone(),
            GroupKey::District => record.city_district.clone(),
            GroupKey::Type => record.kind.clone(),
            GroupKey::Status => record.status.label().to_string(),
        }
    }
}

/// One row of a ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub key: String,
    pub units: u64,
}

/// One row of a two-key ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked2 {
    pub first: String,
    pub second: String,
    pub units: u64,
}

/// Units per canonical status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub operational: u64,
    pub non_operational: u64,
    pub needs_repair: u64,
    pub unknown: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: Status, units: u64) {
        *self.slot(status) += units;
    }

    pub fn get(&self, status: Status) -> u64 {
        match status {
            Status::Operational => self.operational,
            Status::NonOperational => self.non_operational,
            Status::NeedsRepair => self.needs_repair,
            Status::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        self.operational + self.non_operational + self.needs_repair + self.unknown
    }

    /// Statuses with a non-zero count, in [`Status::ALL`] order.
    pub fn nonzero(&self) -> Vec<(Status, u64)> {
        Status::ALL
            .into_iter()
            .map(|s| (s, self.get(s)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    fn slot(&mut self, status: Status) -> &mut u64 {
        match status {
            Status::Operational => &mut self.operational,
            Status::NonOperational => &mut self.non_operational,
            Status::NeedsRepair => &mut self.needs_repair,
            Status::Unknown => &mut self.unknown,
        }
    }
}

fn cmp_ci(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn rank(totals: HashMap<String, u64>) -> Vec<Ranked> {
    let mut rows: Vec<Ranked> = totals
        .into_iter()
        .map(|(key, units)| Ranked { key, units })
        .collect();
    rows.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| cmp_ci(&a.key, &b.key)));
    rows
}

// ---------------------------------------------------------------------------
// Category split
// ---------------------------------------------------------------------------

/// Coarse split of canonical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vehicle,
    Equipment,
}

impl Category {
    pub fn of(type_label: &str) -> Self {
        if is_equipment(type_label) {
            Category::Equipment
        } else {
            Category::Vehicle
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Vehicle => "Автотранспорт",
            Category::Equipment => "Прочая техника и оборудование",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub units: u64,
    pub statuses: StatusCounts,
}

/// Vehicle vs equipment totals, each with its status distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorySplit {
    pub vehicles: CategoryTotals,
    pub equipment: CategoryTotals,
}

impl CategorySplit {
    pub fn total(&self) -> u64 {
        self.vehicles.units + self.equipment.units
    }

    pub fn get(&self, category: Category) -> &CategoryTotals {
        match category {
            Category::Vehicle => &self.vehicles,
            Category::Equipment => &self.equipment,
        }
    }
}

pub fn category_split(records: &[CanonicalRecord]) -> CategorySplit {
    let mut split = CategorySplit::default();
    for r in records {
        let bucket = match Category::of(&r.kind) {
            Category::Vehicle => &mut split.vehicles,
            Category::Equipment => &mut split.equipment,
        };
        let units = u64::from(r.quantity);
        bucket.units += units;
        bucket.statuses.add(r.status, units);
    }
    split
}

// ---------------------------------------------------------------------------
// Group-and-sum
// ---------------------------------------------------------------------------

/// Sum units per value of `by`, ranked.
pub fn group_sum(records: &[CanonicalRecord], by: GroupKey) -> Vec<Ranked> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for r in records {
        *totals.entry(by.value(r)).or_default() += u64::from(r.quantity);
    }
    rank(totals)
}

/// Sum units per `(first, second)` pair, ranked.
pub fn group_sum2(records: &[CanonicalRecord], first: GroupKey, second: GroupKey) -> Vec<Ranked2> {
    let mut totals: HashMap<(String, String), u64> = HashMap::new();
    for r in records {
        *totals
            .entry((first.value(r), second.value(r)))
            .or_default() += u64::from(r.quantity);
    }

    let mut rows: Vec<Ranked2> = totals
        .into_iter()
        .map(|((first, second), units)| Ranked2 {
            first,
            second,
            units,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.units
            .cmp(&a.units)
            .then_with(|| cmp_ci(&a.first, &b.first))
            .then_with(|| cmp_ci(&a.second, &b.second))
    });
    rows
}

/// Per-type totals with their status breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStatusRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub units: u64,
    pub statuses: StatusCounts,
}

/// Types ranked by units, each with its status counts.
pub fn type_status_matrix(records: &[CanonicalRecord]) -> Vec<TypeStatusRow> {
    let mut by_type: HashMap<&str, StatusCounts> = HashMap::new();
    for r in records {
        by_type
            .entry(r.kind.as_str())
            .or_default()
            .add(r.status, u64::from(r.quantity));
    }

    let mut rows: Vec<TypeStatusRow> = by_type
        .into_iter()
        .map(|(kind, statuses)| TypeStatusRow {
            kind: kind.to_string(),
            units: statuses.total(),
            statuses,
        })
        .collect();
    rows.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| cmp_ci(&a.kind, &b.kind)));
    rows
}

/// Units per status, ranked, zero statuses omitted.
pub fn status_distribution(records: &[CanonicalRecord]) -> Vec<(Status, u64)> {
    let mut counts = StatusCounts::default();
    for r in records {
        counts.add(r.status, u64::from(r.quantity));
    }
    let mut rows = counts.nonzero();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| cmp_ci(a.0.label(), b.0.label())));
    rows
}

// ---------------------------------------------------------------------------
// Per-location breakdown
// ---------------------------------------------------------------------------

/// Status counts of one district for a `(type, region)` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRow {
    pub district: String,
    pub units: u64,
    /// Only statuses with a non-zero count.
    pub statuses: BTreeMap<Status, u64>,
}

impl LocationRow {
    pub fn count(&self, status: Status) -> u64 {
        self.statuses.get(&status).copied().unwrap_or(0)
    }
}

/// Districts of `region` holding units of `type_query`, worst condition first.
///
/// `type_query` is classified first, so raw spellings work. Ordering:
/// NonOperational descending, then NeedsRepair descending, then district
/// name ascending (case-insensitive).
pub fn location_breakdown(
    records: &[CanonicalRecord],
    type_query: &str,
    region: &str,
) -> Vec<LocationRow> {
    let Some(kind) = classify_type(type_query) else {
        return Vec::new();
    };

    let mut by_district: HashMap<&str, StatusCounts> = HashMap::new();
    for r in records
        .iter()
        .filter(|r| r.region_name == region && r.kind == kind)
    {
        by_district
            .entry(r.city_district.as_str())
            .or_default()
            .add(r.status, u64::from(r.quantity));
    }

    let mut rows: Vec<LocationRow> = by_district
        .into_iter()
        .filter(|(_, counts)| counts.total() > 0)
        .map(|(district, counts)| LocationRow {
            district: district.to_string(),
            units: counts.total(),
            statuses: counts.nonzero().into_iter().collect(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.count(Status::NonOperational)
            .cmp(&a.count(Status::NonOperational))
            .then_with(|| b.count(Status::NeedsRepair).cmp(&a.count(Status::NeedsRepair)))
            .then_with(|| cmp_ci(&a.district, &b.district))
    });
    rows
}

// ---------------------------------------------------------------------------
// Region-level summaries
// ---------------------------------------------------------------------------

/// Tracker-equipped units per region, ranked. Regions without any are absent.
pub fn tracker_summary(records: &[CanonicalRecord]) -> Vec<Ranked> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for r in records.iter().filter(|r| r.has_tracker) {
        *totals.entry(r.region_name.clone()).or_default() += u64::from(r.quantity);
    }
    rank(totals)
}

fn zero_filled<'a>(
    records: impl Iterator<Item = &'a CanonicalRecord>,
    regions: &[String],
) -> Vec<Ranked> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for r in records {
        *totals.entry(r.region_name.as_str()).or_default() += u64::from(r.quantity);
    }
    regions
        .iter()
        .map(|region| Ranked {
            key: region.clone(),
            units: totals.get(region.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

/// Units per configured region, in configured order, zero when absent.
pub fn region_totals(records: &[CanonicalRecord], regions: &[String]) -> Vec<Ranked> {
    zero_filled(records.iter(), regions)
}

/// Tracker-equipped units per configured region, in configured order.
pub fn tracker_totals(records: &[CanonicalRecord], regions: &[String]) -> Vec<Ranked> {
    zero_filled(records.iter().filter(|r| r.has_tracker), regions)
}

/// Units of one type per region, ranked. The query is classified first, so
/// "ekskavator" and "Экскаватор" give the same answer.
pub fn count_type_per_region(records: &[CanonicalRecord], type_query: &str) -> Vec<Ranked> {
    let Some(kind) = classify_type(type_query) else {
        return Vec::new();
    };
    let subset: Vec<CanonicalRecord> = records.iter().filter(|r| r.kind == kind).cloned().collect();
    group_sum(&subset, GroupKey::Region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(region: &str, district: &str, kind: &str, status: Status, qty: u32) -> CanonicalRecord {
        CanonicalRecord {
            region_name: region.into(),
            city_district: district.into(),
            kind: kind.into(),
            status,
            quantity: qty,
            has_tracker: false,
        }
    }

    fn scenario() -> Vec<CanonicalRecord> {
        let mut records = Vec::new();
        for _ in 0..3 {
            records.push(rec("R", "R", "Экскаватор", Status::Operational, 1));
        }
        for _ in 0..2 {
            records.push(rec("R", "R", "Прицеп", Status::NeedsRepair, 1));
        }
        records
    }

    #[test]
    fn scenario_category_split() {
        let split = category_split(&scenario());
        assert_eq!(split.vehicles.units, 3);
        assert_eq!(split.vehicles.statuses.operational, 3);
        assert_eq!(split.equipment.units, 2);
        assert_eq!(split.equipment.statuses.needs_repair, 2);
        assert_eq!(split.total(), 5);
    }

    #[test]
    fn empty_input_gives_empty_results() {
        assert_eq!(category_split(&[]), CategorySplit::default());
        assert!(group_sum(&[], GroupKey::Type).is_empty());
        assert!(group_sum2(&[], GroupKey::Region, GroupKey::Type).is_empty());
        assert!(type_status_matrix(&[]).is_empty());
        assert!(status_distribution(&[]).is_empty());
        assert!(location_breakdown(&[], "Камаз", "R").is_empty());
        assert!(tracker_summary(&[]).is_empty());
        assert!(count_type_per_region(&[], "Камаз").is_empty());
    }

    #[test]
    fn ranking_breaks_ties_case_insensitively() {
        let records = vec![
            rec("R", "R", "бульдозер", Status::Unknown, 2),
            rec("R", "R", "Автокран", Status::Unknown, 2),
            rec("R", "R", "Камаз", Status::Unknown, 5),
        ];
        let keys: Vec<_> = group_sum(&records, GroupKey::Type)
            .into_iter()
            .map(|r| (r.key, r.units))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Камаз".to_string(), 5),
                ("Автокран".to_string(), 2),
                ("бульдозер".to_string(), 2),
            ]
        );
    }

    #[test]
    fn totals_ignore_order_and_record_splitting() {
        let records = vec![
            rec("A", "a1", "Камаз", Status::Operational, 4),
            rec("B", "b1", "ЗИЛ", Status::NeedsRepair, 2),
            rec("A", "a2", "ЗИЛ", Status::Operational, 1),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let mut split = records.clone();
        split[0].quantity = 1;
        split.push(rec("A", "a1", "Камаз", Status::Operational, 3));

        for by in [GroupKey::Region, GroupKey::District, GroupKey::Type, GroupKey::Status] {
            let base = group_sum(&records, by);
            assert_eq!(group_sum(&reversed, by), base);
            assert_eq!(group_sum(&split, by), base);
        }
        assert_eq!(
            group_sum2(&split, GroupKey::Region, GroupKey::Type),
            group_sum2(&records, GroupKey::Region, GroupKey::Type)
        );
        assert_eq!(category_split(&split), category_split(&records));
    }

    #[test]
    fn group_sum2_pairs() {
        let records = vec![
            rec("A", "a", "Камаз", Status::Operational, 2),
            rec("A", "a", "Камаз", Status::Operational, 1),
            rec("B", "b", "Камаз", Status::Operational, 1),
        ];
        let rows = group_sum2(&records, GroupKey::Region, GroupKey::Type);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].first.as_str(), rows[0].units), ("A", 3));
        assert_eq!((rows[1].first.as_str(), rows[1].units), ("B", 1));
    }

    #[test]
    fn type_status_matrix_counts_statuses() {
        let records = vec![
            rec("R", "R", "Камаз", Status::Operational, 2),
            rec("R", "R", "Камаз", Status::NonOperational, 1),
            rec("R", "R", "ЗИЛ", Status::Unknown, 1),
        ];
        let rows = type_status_matrix(&records);
        assert_eq!(rows[0].kind, "Камаз");
        assert_eq!(rows[0].units, 3);
        assert_eq!(rows[0].statuses.operational, 2);
        assert_eq!(rows[0].statuses.non_operational, 1);
        assert_eq!(rows[1].statuses.unknown, 1);
    }

    #[test]
    fn location_breakdown_surfaces_worst_first() {
        let records = vec![
            rec("R", "Бета", "Камаз", Status::Operational, 9),
            rec("R", "альфа", "Камаз", Status::NeedsRepair, 1),
            rec("R", "Альфа2", "Камаз", Status::NeedsRepair, 1),
            rec("R", "Гамма", "Камаз", Status::NonOperational, 1),
            rec("R", "Гамма", "Камаз", Status::NeedsRepair, 1),
            rec("R", "Дельта", "Камаз", Status::NonOperational, 1),
            rec("R", "Дельта", "ЗИЛ", Status::NonOperational, 5),
            rec("Q", "Бета", "Камаз", Status::NonOperational, 5),
        ];
        let rows = location_breakdown(&records, "камаз", "R");
        let order: Vec<&str> = rows.iter().map(|r| r.district.as_str()).collect();
        assert_eq!(order, vec!["Гамма", "Дельта", "альфа", "Альфа2", "Бета"]);

        let beta = rows.last().unwrap();
        assert_eq!(beta.units, 9);
        assert_eq!(beta.statuses.len(), 1);
        assert_eq!(beta.count(Status::NeedsRepair), 0);
    }

    #[test]
    fn location_breakdown_rejects_summary_query() {
        let records = vec![rec("R", "R", "Камаз", Status::Operational, 1)];
        assert!(location_breakdown(&records, "Итого", "R").is_empty());
    }

    #[test]
    fn tracker_views() {
        let mut records = vec![
            rec("A", "a", "Камаз", Status::Operational, 2),
            rec("B", "b", "Камаз", Status::Operational, 3),
            rec("B", "b", "ЗИЛ", Status::Operational, 4),
        ];
        records[0].has_tracker = true;
        records[1].has_tracker = true;

        let ranked = tracker_summary(&records);
        assert_eq!(
            ranked,
            vec![
                Ranked { key: "B".into(), units: 3 },
                Ranked { key: "A".into(), units: 2 },
            ]
        );

        let regions = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let filled: Vec<u64> = tracker_totals(&records, &regions)
            .into_iter()
            .map(|r| r.units)
            .collect();
        assert_eq!(filled, vec![2, 3, 0]);
    }

    #[test]
    fn region_totals_keep_configured_order() {
        let records = vec![
            rec("B", "b", "Камаз", Status::Operational, 7),
            rec("A", "a", "Камаз", Status::Operational, 1),
        ];
        let regions = vec!["C".to_string(), "A".to_string(), "B".to_string()];
        let rows = region_totals(&records, &regions);
        let pairs: Vec<(&str, u64)> = rows.iter().map(|r| (r.key.as_str(), r.units)).collect();
        assert_eq!(pairs, vec![("C", 0), ("A", 1), ("B", 7)]);
    }

    #[test]
    fn count_type_per_region_normalizes_query() {
        let records = vec![
            rec("A", "a", "Экскаватор", Status::Operational, 2),
            rec("B", "b", "Экскаватор", Status::Operational, 5),
            rec("B", "b", "Камаз", Status::Operational, 9),
        ];
        let rows = count_type_per_region(&records, "ekskavator");
        assert_eq!(
            rows,
            vec![
                Ranked { key: "B".into(), units: 5 },
                Ranked { key: "A".into(), units: 2 },
            ]
        );
    }

    #[test]
    fn views_serialize_for_json_output() {
        let rows = location_breakdown(
            &[rec("R", "a", "Камаз", Status::NeedsRepair, 2)],
            "Камаз",
            "R",
        );
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["district"], "a");
        assert_eq!(json[0]["statuses"]["needs_repair"], 2);

        let matrix = serde_json::to_value(type_status_matrix(&scenario())).unwrap();
        assert_eq!(matrix[0]["type"], "Экскаватор");
    }

    #[test]
    fn status_distribution_is_ranked() {
        let records = vec![
            rec("A", "a", "Камаз", Status::Operational, 1),
            rec("A", "a", "Камаз", Status::NeedsRepair, 3),
        ];
        assert_eq!(
            status_distribution(&records),
            vec![(Status::NeedsRepair, 3), (Status::Operational, 1)]
        );
    }

    #[test]
    fn status_distribution_ties_follow_label_order() {
        let records = vec![
            rec("A", "a", "Камаз", Status::Operational, 2),
            rec("A", "a", "Камаз", Status::NeedsRepair, 2),
        ];
        let by_status: Vec<_> = status_distribution(&records)
            .into_iter()
            .map(|(s, units)| (s.label().to_string(), units))
            .collect();
        let grouped: Vec<_> = group_sum(&records, GroupKey::Status)
            .into_iter()
            .map(|r| (r.key, r.units))
            .collect();
        assert_eq!(by_status, grouped);
        assert_eq!(by_status[0].0, "Таъмирталаб");
    }
}
