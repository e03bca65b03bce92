//! Core of fleettally: the row pipeline, the aggregation engine and the
//! dataset cache.
//!
//! - [`pipeline`] turns the raw rows of one source into canonical records
//! - [`aggregate`] computes ranked views over any set of records
//! - [`cache`] keeps datasets fresh behind a TTL, serving stale data on error

pub mod aggregate;
pub mod cache;
pub mod pipeline;

pub use aggregate::{
    Category, CategorySplit, CategoryTotals, GroupKey, LocationRow, Ranked, Ranked2,
    StatusCounts, TypeStatusRow, category_split, count_type_per_region, group_sum, group_sum2,
    location_breakdown, region_totals, status_distribution, tracker_summary, tracker_totals,
    type_status_matrix,
};
pub use cache::{CacheStats, DatasetCache, DatasetFetcher};
pub use pipeline::{PipelineStats, parse_quantity, process_rows};
