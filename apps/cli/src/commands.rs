//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use fleettally_core::{
    DatasetCache, GroupKey, category_split, count_type_per_region, group_sum, location_breakdown,
    region_totals, status_distribution, tracker_totals, type_status_matrix,
};
use fleettally_fetch::{CsvDirSource, FetchScheduler, RowSource, SheetCsvSource};
use fleettally_normalize::classify_type;
use fleettally_shared::{
    AppConfig, CachePolicy, Dataset, FetchPolicy, SourceKey, SourceKind, SystemClock, init_config,
    load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::report::{
    LocationView, RankedView, RegionView, StatsView, TypesView, render_location, render_ranked,
    render_region, render_stats, render_types,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// fleettally: census of regional vehicle and equipment fleets.
#[derive(Parser)]
#[command(
    name = "fleettally",
    version,
    about = "Count and rank fleet units across regional spreadsheets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ignore cached data and refetch from upstream.
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Print JSON instead of text tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Units per configured region, in configured order.
    Regions,

    /// Category split and district ranking for one region (or ALL).
    Region {
        /// Region name as configured, or ALL.
        name: String,
    },

    /// Units per type with their status breakdown.
    Types {
        /// Limit to one region (defaults to ALL).
        #[arg(long)]
        region: Option<String>,
    },

    /// Units of one type per region. Raw spellings are accepted.
    Type {
        /// Type name, e.g. "ekskavator" or "Экскаватор".
        name: String,
    },

    /// Districts of a region holding a type, worst condition first.
    Location {
        /// Type name.
        #[arg(long = "type")]
        kind: String,

        /// Region name.
        #[arg(long)]
        region: String,
    },

    /// Tracker-equipped units per configured region.
    Trackers,

    /// Dataset and cache statistics.
    Stats,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so `--json`
/// output stays parseable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "fleettally=info",
        1 => "fleettally=debug",
        _ => "fleettally=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let out = Output { json: cli.json };
    let refresh = cli.refresh;
    let session = || Session::open(refresh);
    match cli.command {
        Command::Regions => cmd_regions(&session()?, out).await,
        Command::Region { name } => cmd_region(&session()?, out, &name).await,
        Command::Types { region } => cmd_types(&session()?, out, region.as_deref()).await,
        Command::Type { name } => cmd_type(&session()?, out, &name).await,
        Command::Location { kind, region } => {
            cmd_location(&session()?, out, &kind, &region).await
        }
        Command::Trackers => cmd_trackers(&session()?, out).await,
        Command::Stats => cmd_stats(&session()?, out).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(self, view: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(view)?);
        } else {
            print!("{}", text(view));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session: config + source + scheduler + cache
// ---------------------------------------------------------------------------

struct Session {
    config: AppConfig,
    cache: DatasetCache,
    refresh: bool,
}

impl Session {
    fn open(refresh: bool) -> Result<Self> {
        let config = load_config()?;
        let policy = FetchPolicy::from(&config);

        let source: Arc<dyn RowSource> = match config.source.kind {
            SourceKind::Sheets => Arc::new(SheetCsvSource::new(
                config.source.url_template.clone(),
                policy.request_timeout,
            )?),
            SourceKind::CsvDir => {
                let dir = config
                    .source
                    .data_dir
                    .as_deref()
                    .ok_or_else(|| eyre!("source.data_dir is required for csv_dir"))?;
                Arc::new(CsvDirSource::new(dir))
            }
        };

        let clock = Arc::new(SystemClock);
        let specs = config.source_specs();
        let configured = specs.iter().filter(|s| s.sheet_id.is_some()).count();
        info!(
            kind = ?config.source.kind,
            regions = specs.len(),
            configured,
            "session opened"
        );

        let scheduler = Arc::new(FetchScheduler::new(source, specs, policy, clock.clone()));
        let cache = DatasetCache::new(scheduler, &CachePolicy::from(&config), clock);

        Ok(Self {
            config,
            cache,
            refresh,
        })
    }

    /// Map a user-supplied region name to its configured key.
    fn key_for(&self, name: &str) -> Result<SourceKey> {
        match SourceKey::parse(name) {
            SourceKey::All => Ok(SourceKey::All),
            SourceKey::Region(wanted) => self
                .config
                .regions
                .iter()
                .find(|r| r.name == wanted)
                .or_else(|| {
                    let wanted = wanted.to_lowercase();
                    self.config
                        .regions
                        .iter()
                        .find(|r| r.name.to_lowercase() == wanted)
                })
                .map(|r| SourceKey::Region(r.name.clone()))
                .ok_or_else(|| {
                    eyre!(
                        "unknown region '{wanted}'. Configured: {}",
                        self.config.region_names().join(", ")
                    )
                }),
        }
    }

    async fn dataset(&self, key: &SourceKey) -> Result<Dataset> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.set_message(format!("Loading {key}"));
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));

        let dataset = self.cache.get(key, self.refresh).await;
        spinner.finish_and_clear();

        if dataset.is_empty() {
            warn!(%key, "no records available");
        }
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_regions(session: &Session, out: Output) -> Result<()> {
    let dataset = session.dataset(&SourceKey::All).await?;
    let view = RankedView {
        title: "Units per region".into(),
        fetched_at: dataset.fetched_at(),
        rows: region_totals(dataset.records(), &session.config.region_names()),
    };
    out.emit(&view, render_ranked)
}

async fn cmd_region(session: &Session, out: Output, name: &str) -> Result<()> {
    let key = session.key_for(name)?;
    let dataset = session.dataset(&key).await?;
    let records = dataset.records();

    let view = RegionView {
        region: key.to_string(),
        fetched_at: dataset.fetched_at(),
        units: dataset.total_units(),
        categories: category_split(records),
        statuses: status_distribution(records),
        districts: group_sum(records, GroupKey::District),
    };
    out.emit(&view, render_region)
}

async fn cmd_types(session: &Session, out: Output, region: Option<&str>) -> Result<()> {
    let key = match region {
        Some(name) => session.key_for(name)?,
        None => SourceKey::All,
    };
    let dataset = session.dataset(&key).await?;

    let view = TypesView {
        scope: key.to_string(),
        fetched_at: dataset.fetched_at(),
        types: type_status_matrix(dataset.records()),
    };
    out.emit(&view, render_types)
}

async fn cmd_type(session: &Session, out: Output, name: &str) -> Result<()> {
    let kind = classify_type(name).ok_or_else(|| eyre!("'{name}' is not a recognized type"))?;
    let dataset = session.dataset(&SourceKey::All).await?;

    let view = RankedView {
        title: format!("{kind} per region"),
        fetched_at: dataset.fetched_at(),
        rows: count_type_per_region(dataset.records(), name),
    };
    out.emit(&view, render_ranked)
}

async fn cmd_location(session: &Session, out: Output, kind: &str, region: &str) -> Result<()> {
    let label = classify_type(kind).ok_or_else(|| eyre!("'{kind}' is not a recognized type"))?;
    let key = session.key_for(region)?;
    let region = key
        .region()
        .ok_or_else(|| eyre!("location needs a single region, not ALL"))?
        .to_string();
    let dataset = session.dataset(&key).await?;

    let view = LocationView {
        districts: location_breakdown(dataset.records(), kind, &region),
        region,
        kind: label,
        fetched_at: dataset.fetched_at(),
    };
    out.emit(&view, render_location)
}

async fn cmd_trackers(session: &Session, out: Output) -> Result<()> {
    let dataset = session.dataset(&SourceKey::All).await?;
    let view = RankedView {
        title: "Units with trackers per region".into(),
        fetched_at: dataset.fetched_at(),
        rows: tracker_totals(dataset.records(), &session.config.region_names()),
    };
    out.emit(&view, render_ranked)
}

async fn cmd_stats(session: &Session, out: Output) -> Result<()> {
    let dataset = session.dataset(&SourceKey::All).await?;
    let cache = session.cache.stats().await;

    let view = StatsView {
        fetched_at: dataset.fetched_at(),
        records: dataset.len(),
        units: dataset.total_units(),
        cache_entries: cache.entries,
        all_expires_at: cache.all_expires_at,
    };
    out.emit(&view, render_stats)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
