//! Shared types, error model, and configuration for fleettally.
//!
//! This crate is the foundation depended on by all other fleettally crates.
//! It provides:
//! - [`FleetError`], the unified error type
//! - Domain types ([`CanonicalRecord`], [`Status`], [`Dataset`], [`SourceKey`], [`RawRow`])
//! - Configuration ([`AppConfig`], [`FetchPolicy`], [`CachePolicy`], config loading)
//! - An injectable [`Clock`]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AppConfig, CacheConfig, CachePolicy, DEFAULT_URL_TEMPLATE, FetchConfig, FetchPolicy,
    RegionEntry, SourceConfig, SourceKind, SourceSpec, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{FleetError, Result};
pub use types::{ALL_KEY, CanonicalRecord, Dataset, RawRow, SourceKey, Status};
