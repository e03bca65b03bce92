//! Report views and their plain-text rendering.
//!
//! Every view is `Serialize` so `--json` can print it as is; the text form
//! is a fixed-width table per section.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fleettally_core::{Category, CategorySplit, LocationRow, Ranked, StatusCounts, TypeStatusRow};
use fleettally_shared::Status;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Ranked list with a title, e.g. units per region.
#[derive(Debug, Serialize)]
pub(crate) struct RankedView {
    pub title: String,
    pub fetched_at: DateTime<Utc>,
    pub rows: Vec<Ranked>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegionView {
    pub region: String,
    pub fetched_at: DateTime<Utc>,
    pub units: u64,
    pub categories: CategorySplit,
    pub statuses: Vec<(Status, u64)>,
    pub districts: Vec<Ranked>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TypesView {
    pub scope: String,
    pub fetched_at: DateTime<Utc>,
    pub types: Vec<TypeStatusRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LocationView {
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub fetched_at: DateTime<Utc>,
    pub districts: Vec<LocationRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatsView {
    pub fetched_at: DateTime<Utc>,
    pub records: usize,
    pub units: u64,
    pub cache_entries: usize,
    pub all_expires_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn width(s: &str) -> usize {
    s.chars().count()
}

/// Left-align the first column, right-align the rest.
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(width(cell));
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let mut out = String::new();
        for (i, cell) in cells.iter().enumerate() {
            let pad = widths.get(i).copied().unwrap_or(0).saturating_sub(width(cell));
            if i > 0 {
                out.push_str("  ");
            }
            if i == 0 {
                out.push_str(cell);
                out.push_str(&" ".repeat(pad));
            } else {
                out.push_str(&" ".repeat(pad));
                out.push_str(cell);
            }
        }
        out.trim_end().to_string()
    };

    let mut out = line(headers.to_vec());
    out.push('\n');
    let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn stamp(at: DateTime<Utc>) -> String {
    format!("(data as of {})", at.format("%Y-%m-%d %H:%M UTC"))
}

fn status_cells(counts: &StatusCounts) -> Vec<String> {
    Status::ALL.iter().map(|s| counts.get(*s).to_string()).collect()
}

fn status_headers() -> Vec<String> {
    Status::ALL
        .iter()
        .map(|s| format!("{} {}", s.marker(), s.label()))
        .collect()
}

pub(crate) fn render_ranked(view: &RankedView) -> String {
    let total: u64 = view.rows.iter().map(|r| r.units).sum();
    let mut rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|r| vec![r.key.clone(), r.units.to_string()])
        .collect();
    rows.push(vec!["Total".into(), total.to_string()]);

    format!(
        "{} {}\n\n{}",
        view.title,
        stamp(view.fetched_at),
        table(&["", "Units"], &rows)
    )
}

pub(crate) fn render_region(view: &RegionView) -> String {
    let mut out = format!(
        "{}: {} units {}\n\n",
        view.region,
        view.units,
        stamp(view.fetched_at)
    );

    let headers = status_headers();
    let mut header_refs: Vec<&str> = vec!["Category", "Units"];
    header_refs.extend(headers.iter().map(String::as_str));
    let rows: Vec<Vec<String>> = [Category::Vehicle, Category::Equipment]
        .iter()
        .map(|c| {
            let totals = view.categories.get(*c);
            let mut row = vec![c.label().to_string(), totals.units.to_string()];
            row.extend(status_cells(&totals.statuses));
            row
        })
        .collect();
    out.push_str(&table(&header_refs, &rows));

    if !view.districts.is_empty() {
        out.push('\n');
        let rows: Vec<Vec<String>> = view
            .districts
            .iter()
            .map(|r| vec![r.key.clone(), r.units.to_string()])
            .collect();
        out.push_str(&table(&["District", "Units"], &rows));
    }
    out
}

pub(crate) fn render_types(view: &TypesView) -> String {
    let headers = status_headers();
    let mut header_refs: Vec<&str> = vec!["Type", "Units"];
    header_refs.extend(headers.iter().map(String::as_str));

    let rows: Vec<Vec<String>> = view
        .types
        .iter()
        .map(|t| {
            let mut row = vec![t.kind.clone(), t.units.to_string()];
            row.extend(status_cells(&t.statuses));
            row
        })
        .collect();

    format!(
        "Types in {} {}\n\n{}",
        view.scope,
        stamp(view.fetched_at),
        table(&header_refs, &rows)
    )
}

pub(crate) fn render_location(view: &LocationView) -> String {
    if view.districts.is_empty() {
        return format!("No {} units in {}.\n", view.kind, view.region);
    }

    let headers = status_headers();
    let mut header_refs: Vec<&str> = vec!["District", "Units"];
    header_refs.extend(headers.iter().map(String::as_str));

    let rows: Vec<Vec<String>> = view
        .districts
        .iter()
        .map(|d| {
            let mut row = vec![d.district.clone(), d.units.to_string()];
            row.extend(Status::ALL.iter().map(|s| d.count(*s).to_string()));
            row
        })
        .collect();

    format!(
        "{} in {} {}\n\n{}",
        view.kind,
        view.region,
        stamp(view.fetched_at),
        table(&header_refs, &rows)
    )
}

pub(crate) fn render_stats(view: &StatsView) -> String {
    let expires = view
        .all_expires_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "Records:       {}\nUnits:         {}\nFetched at:    {}\nCache entries: {}\nALL expires:   {}\n",
        view.records,
        view.units,
        view.fetched_at.format("%Y-%m-%d %H:%M UTC"),
        view.cache_entries,
        expires
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn table_aligns_columns_by_char_count() {
        let out = table(
            &["Region", "Units"],
            &[
                vec!["Навоий".into(), "12".into()],
                vec!["Жиззах".into(), "3".into()],
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Region  Units");
        assert_eq!(lines[1], "-------------");
        assert_eq!(lines[2], "Навоий     12");
        assert_eq!(lines[3], "Жиззах      3");
    }

    #[test]
    fn ranked_view_ends_with_total() {
        let view = RankedView {
            title: "Units per region".into(),
            fetched_at: at(),
            rows: vec![
                Ranked { key: "A".into(), units: 4 },
                Ranked { key: "B".into(), units: 0 },
            ],
        };
        let out = render_ranked(&view);
        assert!(out.starts_with("Units per region (data as of 2024-05-01 08:00 UTC)"));
        assert!(out.trim_end().ends_with("Total      4"));
    }

    #[test]
    fn empty_location_says_so() {
        let view = LocationView {
            region: "R".into(),
            kind: "Экскаватор".into(),
            fetched_at: at(),
            districts: Vec::new(),
        };
        assert_eq!(render_location(&view), "No Экскаватор units in R.\n");
    }

    #[test]
    fn location_view_serializes_type_field() {
        let view = LocationView {
            region: "R".into(),
            kind: "Экскаватор".into(),
            fetched_at: at(),
            districts: Vec::new(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "Экскаватор");
        assert!(json["districts"].as_array().unwrap().is_empty());
    }
}
