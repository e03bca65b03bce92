//! Application configuration for fleettally.
//!
//! User config lives at `~/.fleettally/fleettally.toml`.
//! CLI flags override config file values, which override defaults.
//! Sheet ids are secrets: the file names the env var holding each id.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FleetError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "fleettally.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".fleettally";

/// Google Sheets CSV export endpoint; `{sheet_id}` is substituted per source.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv";

/// Default region registry and the env vars holding their sheet ids.
const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("Андижон", "SHEET_ANDIJON"),
    ("Фарғона", "SHEET_FARGONA"),
    ("Наманган", "SHEET_NAMANGAN"),
    ("Тошкент шаҳри", "SHEET_TASHKENT"),
    ("Тошкент вил.", "SHEET_TASHKENT_VIL"),
    ("Самарқанд", "SHEET_SAMARKAND"),
    ("Жиззах", "SHEET_JIZZAKH"),
    ("Сирдарё", "SHEET_SIRDARYO"),
    ("Қашқадарё", "SHEET_QASHQADARYO"),
    ("Сурхондарё", "SHEET_SURXONDARYO"),
    ("Бухоро", "SHEET_BUKHARA"),
    ("Навоий", "SHEET_NAVOIY"),
    ("Хоразм", "SHEET_XORAZM"),
    ("Қорақалпоғистон", "SHEET_QORAQALPOG"),
    ("Дамхужа", "SHEET_DAMXOJA"),
    ("Мусаффо", "SHEET_MUSAFFO"),
    ("Чимган-Чарбоғ", "SHEET_CHIMGAN"),
    ("Сувўлчагичхизмати", "SHEET_SUVULCHAGICH"),
];

// ---------------------------------------------------------------------------
// Config structs (matching fleettally.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream fetch pacing and concurrency.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Where raw rows come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Registered regions, in report order.
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            source: SourceConfig::default(),
            regions: default_regions(),
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a cached dataset stays fresh.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    30 * 60
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum simultaneous upstream fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Minimum ms between two upstream calls.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,

    /// Upper bound of random extra delay added to each paced call.
    #[serde(default = "default_jitter")]
    pub jitter_ms: u64,

    /// Wait before the single retry after a throttling response.
    #[serde(default = "default_cooldown")]
    pub throttle_cooldown_secs: u64,

    /// Per-request timeout for HTTP sources.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            min_interval_ms: default_min_interval(),
            jitter_ms: default_jitter(),
            throttle_cooldown_secs: default_cooldown(),
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_concurrency() -> u32 {
    4
}
fn default_min_interval() -> u64 {
    2000
}
fn default_jitter() -> u64 {
    400
}
fn default_cooldown() -> u64 {
    10
}
fn default_timeout() -> u64 {
    30
}

/// Kind of upstream row source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// CSV export of a hosted spreadsheet, over HTTP.
    Sheets,
    /// Local `<sheet_id>.csv` files in `data_dir`.
    CsvDir,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_kind")]
    pub kind: SourceKind,

    /// Export URL with a `{sheet_id}` placeholder.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Directory for the `csv_dir` kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            url_template: default_url_template(),
            data_dir: None,
        }
    }
}

fn default_kind() -> SourceKind {
    SourceKind::Sheets
}
fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.into()
}

/// `[[regions]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionEntry {
    /// Region display name; also the dataset key.
    pub name: String,
    /// Literal sheet id (takes precedence over `sheet_id_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,
    /// Env var holding the sheet id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id_env: Option<String>,
}

fn default_regions() -> Vec<RegionEntry> {
    DEFAULT_REGIONS
        .iter()
        .map(|(name, env)| RegionEntry {
            name: (*name).into(),
            sheet_id: None,
            sheet_id_env: Some((*env).into()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Runtime configs (derived from AppConfig)
// ---------------------------------------------------------------------------

/// One upstream source with its id resolved from config/env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Region name.
    pub region: String,
    /// Upstream id; `None` when neither the file nor the env provided one.
    pub sheet_id: Option<String>,
}

impl SourceSpec {
    pub fn new(region: impl Into<String>, sheet_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            sheet_id: Some(sheet_id.into()),
        }
    }
}

impl RegionEntry {
    /// Resolve the sheet id: literal value first, then the env var.
    pub fn resolve(&self) -> SourceSpec {
        let sheet_id = self
            .sheet_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.sheet_id_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|s| !s.trim().is_empty())
            });
        SourceSpec {
            region: self.name.clone(),
            sheet_id,
        }
    }
}

impl AppConfig {
    /// All configured sources with ids resolved, in registry order.
    ///
    /// With the `csv_dir` kind a region without an id reads `<region>.csv`.
    pub fn source_specs(&self) -> Vec<SourceSpec> {
        self.regions
            .iter()
            .map(|entry| {
                let mut spec = entry.resolve();
                if self.source.kind == SourceKind::CsvDir && spec.sheet_id.is_none() {
                    spec.sheet_id = Some(entry.name.clone());
                }
                spec
            })
            .collect()
    }

    /// Region names in registry order.
    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    /// Reject configs that can't drive a refresh.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(FleetError::config("fetch.concurrency must be at least 1"));
        }
        if self.source.kind == SourceKind::Sheets && !self.source.url_template.contains("{sheet_id}")
        {
            return Err(FleetError::config(
                "source.url_template must contain a {sheet_id} placeholder",
            ));
        }
        if self.source.kind == SourceKind::CsvDir && self.source.data_dir.is_none() {
            return Err(FleetError::config("source.data_dir is required for csv_dir"));
        }
        let mut seen = std::collections::HashSet::new();
        for region in &self.regions {
            if region.name.trim().is_empty() {
                return Err(FleetError::config("region name must not be empty"));
            }
            if !seen.insert(region.name.as_str()) {
                return Err(FleetError::config(format!(
                    "duplicate region '{}'",
                    region.name
                )));
            }
        }
        Ok(())
    }
}

/// Runtime fetch policy, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub concurrency: usize,
    pub min_interval: Duration,
    pub jitter: Duration,
    pub throttle_cooldown: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1) as usize,
            min_interval: Duration::from_millis(config.min_interval_ms),
            jitter: Duration::from_millis(config.jitter_ms),
            throttle_cooldown: Duration::from_secs(config.throttle_cooldown_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl From<&AppConfig> for FetchPolicy {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.fetch)
    }
}

/// Runtime cache policy.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }
}

impl From<&AppConfig> for CachePolicy {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.cache)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.fleettally/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FleetError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.fleettally/fleettally.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FleetError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| FleetError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FleetError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FleetError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FleetError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("ttl_secs"));
        assert!(toml_str.contains("SHEET_ANDIJON"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.cache.ttl_secs, 1800);
        assert_eq!(parsed.regions.len(), 18);
        assert_eq!(parsed.regions[0].name, "Андижон");
    }

    #[test]
    fn config_with_regions() {
        let toml_str = r#"
[fetch]
concurrency = 2

[source]
kind = "csv_dir"
data_dir = "/tmp/sheets"

[[regions]]
name = "R"
sheet_id = "abc"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.source.kind, SourceKind::CsvDir);
        assert_eq!(config.source_specs(), vec![SourceSpec::new("R", "abc")]);
        assert_eq!(FetchPolicy::from(&config).concurrency, 2);
    }

    #[test]
    fn policies_from_defaults() {
        let app = AppConfig::default();
        let fetch = FetchPolicy::from(&app);
        assert_eq!(fetch.concurrency, 4);
        assert_eq!(fetch.min_interval, Duration::from_secs(2));
        assert_eq!(fetch.throttle_cooldown, Duration::from_secs(10));
        assert_eq!(CachePolicy::from(&app).ttl, Duration::from_secs(1800));
    }

    #[test]
    fn region_resolves_id_from_env() {
        let entry = RegionEntry {
            name: "R".into(),
            sheet_id: None,
            // Unique name so parallel tests don't collide.
            sheet_id_env: Some("FT_TEST_NONEXISTENT_SHEET_98765".into()),
        };
        assert_eq!(entry.resolve().sheet_id, None);

        let literal = RegionEntry {
            name: "R".into(),
            sheet_id: Some("lit".into()),
            sheet_id_env: Some("FT_TEST_NONEXISTENT_SHEET_98765".into()),
        };
        assert_eq!(literal.resolve().sheet_id.as_deref(), Some("lit"));
    }

    #[test]
    fn csv_dir_falls_back_to_region_file() {
        let toml_str = r#"
[source]
kind = "csv_dir"
data_dir = "/tmp/sheets"

[[regions]]
name = "Навоий"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let specs = config.source_specs();
        assert_eq!(specs[0].sheet_id.as_deref(), Some("Навоий"));
    }

    #[test]
    fn validation_rejects_bad_configs() {
        let mut config = AppConfig::default();
        config.fetch.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.url_template = "https://example.com/export".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.regions.push(config.regions[0].clone());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate region"));
    }
}
