//! Row pipeline: raw rows of one source → canonical records.
//!
//! Columns are resolved from scratch on every call. Degradations are
//! reported in [`PipelineStats`] and logged; nothing here fails.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use fleettally_normalize::{classify_status, classify_type, parse_tracker};
use fleettally_schema::{ResolvedSchema, Role, collect_headers};
use fleettally_shared::{CanonicalRecord, RawRow, Status};

/// How many distinct raw status values to log per source.
const RAW_STATUS_SAMPLE: usize = 15;

/// Per-source outcome of [`process_rows`].
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Rows handed to the pipeline.
    pub rows_in: usize,
    /// Rows dropped because no type could be derived (blank, summary rows).
    pub dropped_type: usize,
    /// Sum of quantities over emitted records.
    pub units: u64,
    /// Columns used for each role.
    pub schema: ResolvedSchema,
}

impl PipelineStats {
    /// True if the source had no usable type column.
    pub fn type_unresolved(&self) -> bool {
        self.schema.kind.is_none()
    }
}

/// Parse a quantity cell. Anything missing, non-numeric or below one is 1.
pub fn parse_quantity(raw: &str) -> u32 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 1.0 => n.trunc().min(f64::from(u32::MAX)) as u32,
        _ => 1,
    }
}

fn district_or_region(raw: Option<&str>, region: &str) -> String {
    match raw.map(str::trim) {
        Some(d) if !d.is_empty() && !d.eq_ignore_ascii_case("nan") => d.to_string(),
        _ => region.to_string(),
    }
}

/// Turn the rows of one source into canonical records.
///
/// - no type column: nothing can be classified, the source yields no records;
/// - no status column: every record gets [`Status::Unknown`];
/// - no quantity column: every record counts as one unit;
/// - no district column or blank cell: the region name is used;
/// - no tracker column: no record has a tracker.
pub fn process_rows(region: &str, rows: &[RawRow]) -> (Vec<CanonicalRecord>, PipelineStats) {
    let headers = collect_headers(rows);
    let schema = ResolvedSchema::resolve(&headers);
    let missing: Vec<&str> = schema.missing().iter().map(|r| r.name()).collect();

    let mut stats = PipelineStats {
        rows_in: rows.len(),
        ..Default::default()
    };

    let Some(type_col) = schema.header(Role::Type).map(str::to_owned) else {
        warn!(source = region, ?headers, ?missing, "no type column, source skipped");
        stats.schema = schema;
        return (Vec::new(), stats);
    };

    let status_col = schema.header(Role::Status).map(str::to_owned);
    if status_col.is_none() {
        warn!(source = region, "no status column, statuses default to unknown");
    }
    let district_col = schema.header(Role::District).map(str::to_owned);
    let quantity_col = schema.header(Role::Quantity).map(str::to_owned);
    let tracker_col = schema.header(Role::Tracker).map(str::to_owned);

    debug!(
        source = region,
        type_column = %type_col,
        status_column = ?status_col,
        district_column = ?district_col,
        quantity_column = ?quantity_col,
        tracker_column = ?tracker_col,
        ?missing,
        "resolved columns"
    );

    let mut raw_statuses: HashMap<String, usize> = HashMap::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(kind) = row.get(&type_col).and_then(classify_type) else {
            stats.dropped_type += 1;
            continue;
        };

        let status = match status_col.as_deref() {
            Some(col) => {
                let raw = row.get(col).unwrap_or_default();
                *raw_statuses.entry(raw.trim().to_string()).or_default() += 1;
                classify_status(raw)
            }
            None => Status::Unknown,
        };

        let quantity = quantity_col
            .as_deref()
            .and_then(|col| row.get(col))
            .map_or(1, parse_quantity);

        let has_tracker = tracker_col
            .as_deref()
            .and_then(|col| row.get(col))
            .is_some_and(parse_tracker);

        let city_district =
            district_or_region(district_col.as_deref().and_then(|col| row.get(col)), region);

        stats.units += u64::from(quantity);
        records.push(CanonicalRecord {
            region_name: region.to_string(),
            city_district,
            kind,
            status,
            quantity,
            has_tracker,
        });
    }

    log_status_sample(region, &raw_statuses, &records);

    info!(
        source = region,
        rows = stats.rows_in,
        records = records.len(),
        dropped = stats.dropped_type,
        units = stats.units,
        "source processed"
    );

    stats.schema = schema;
    (records, stats)
}

fn log_status_sample(region: &str, raw: &HashMap<String, usize>, records: &[CanonicalRecord]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let mut top: Vec<(&String, &usize)> = raw.iter().collect();
    top.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    top.truncate(RAW_STATUS_SAMPLE);
    debug!(source = region, top = ?top, "raw status values");

    let mut by_status: HashMap<Status, u64> = HashMap::new();
    for r in records {
        *by_status.entry(r.status).or_default() += u64::from(r.quantity);
    }
    debug!(source = region, distribution = ?by_status, "normalized statuses");
}
