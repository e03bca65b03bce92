//! Upstream access for fleettally.
//!
//! This crate provides:
//! - [`RowSource`] with the HTTP spreadsheet-export and local CSV implementations
//! - [`PacingGate`], the shared minimum-interval gate for upstream calls
//! - [`FetchScheduler`], the bounded-concurrency refresh across all sources

pub mod pacing;
pub mod scheduler;
pub mod source;

pub use pacing::PacingGate;
pub use scheduler::{FetchScheduler, SourceOutcome};
pub use source::{CsvDirSource, RowSource, SheetCsvSource, parse_csv};
