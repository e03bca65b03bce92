//! Bounded-concurrency, paced refresh across independent sources.
//!
//! A combined refresh fans out one task per source. Each task holds a
//! semaphore permit for its whole lifetime, waits on the shared
//! [`PacingGate`] before every upstream call, retries once after a
//! cooldown when throttled, and runs the row pipeline on what it got.
//! One source failing never aborts the others.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use fleettally_core::{DatasetFetcher, PipelineStats, process_rows};
use fleettally_shared::{
    CanonicalRecord, Clock, Dataset, FetchPolicy, FleetError, RawRow, Result, SourceKey,
    SourceSpec,
};

use crate::pacing::PacingGate;
use crate::source::RowSource;

/// Result of loading one source during a combined refresh.
#[derive(Debug)]
pub enum SourceOutcome {
    Loaded {
        region: String,
        records: Vec<CanonicalRecord>,
        stats: PipelineStats,
    },
    Failed {
        region: String,
        error: FleetError,
    },
    /// No upstream id configured; not attempted.
    Skipped { region: String },
}

impl SourceOutcome {
    pub fn region(&self) -> &str {
        match self {
            SourceOutcome::Loaded { region, .. }
            | SourceOutcome::Failed { region, .. }
            | SourceOutcome::Skipped { region } => region,
        }
    }
}

/// Everything a fetch task needs, cheap to clone into `tokio::spawn`.
#[derive(Clone)]
struct TaskContext {
    source: Arc<dyn RowSource>,
    gate: Arc<PacingGate>,
    semaphore: Arc<Semaphore>,
    policy: FetchPolicy,
}

impl TaskContext {
    async fn paced_fetch(&self, spec: &SourceSpec) -> Result<Vec<RawRow>> {
        self.gate.wait().await;
        self.source.fetch(spec).await
    }

    /// Fetch with one retry on throttling.
    async fn fetch_rows(&self, spec: &SourceSpec) -> Result<Vec<RawRow>> {
        match self.paced_fetch(spec).await {
            Err(e) if e.is_throttle() => {
                warn!(
                    source = %spec.region,
                    cooldown_ms = self.policy.throttle_cooldown.as_millis(),
                    "throttled, retrying once after cooldown"
                );
                tokio::time::sleep(self.policy.throttle_cooldown).await;
                self.paced_fetch(spec).await.map_err(|e| {
                    if e.is_throttle() {
                        FleetError::unavailable(&spec.region, "still throttled after retry")
                    } else {
                        e
                    }
                })
            }
            other => other,
        }
    }

    async fn load(&self, spec: &SourceSpec) -> Result<(Vec<CanonicalRecord>, PipelineStats)> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FleetError::unavailable(&spec.region, "scheduler shut down"))?;

        let rows = self.fetch_rows(spec).await?;
        Ok(process_rows(&spec.region, &rows))
    }
}

/// Orchestrates refreshes of the configured sources.
pub struct FetchScheduler {
    ctx: TaskContext,
    specs: Vec<SourceSpec>,
    clock: Arc<dyn Clock>,
}

impl FetchScheduler {
    pub fn new(
        source: Arc<dyn RowSource>,
        specs: Vec<SourceSpec>,
        policy: FetchPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ctx = TaskContext {
            source,
            gate: Arc::new(PacingGate::new(policy.min_interval, policy.jitter)),
            semaphore: Arc::new(Semaphore::new(policy.concurrency.max(1))),
            policy,
        };
        Self { ctx, specs, clock }
    }

    /// Configured sources in registry order.
    pub fn specs(&self) -> &[SourceSpec] {
        &self.specs
    }

    /// Refresh one region.
    ///
    /// A region without an upstream id yields an empty dataset; a name that
    /// is not configured is an error.
    #[instrument(skip_all, fields(region = %region))]
    pub async fn fetch_region(&self, region: &str) -> Result<Dataset> {
        let spec = self
            .specs
            .iter()
            .find(|s| s.region == region)
            .ok_or_else(|| FleetError::UnknownSource(region.to_string()))?;

        let key = SourceKey::Region(spec.region.clone());
        if spec.sheet_id.is_none() {
            warn!("no sheet id configured, returning empty dataset");
            return Ok(Dataset::empty(key, self.clock.now()));
        }

        let (records, _stats) = self.ctx.load(spec).await?;
        Ok(Dataset::new(key, self.clock.now(), records))
    }

    /// Load every configured source concurrently, one outcome per source in
    /// registry order.
    #[instrument(skip_all, fields(sources = self.specs.len()))]
    pub async fn load_all(&self) -> Vec<SourceOutcome> {
        let mut handles = Vec::new();
        let mut outcomes: Vec<Option<SourceOutcome>> = Vec::with_capacity(self.specs.len());

        for (idx, spec) in self.specs.iter().enumerate() {
            if spec.sheet_id.is_none() {
                warn!(source = %spec.region, "no sheet id configured, skipping");
                outcomes.push(Some(SourceOutcome::Skipped {
                    region: spec.region.clone(),
                }));
                continue;
            }
            outcomes.push(None);

            let ctx = self.ctx.clone();
            let spec = spec.clone();
            handles.push((
                idx,
                tokio::spawn(async move {
                    let result = ctx.load(&spec).await;
                    (spec.region, result)
                }),
            ));
        }

        for (idx, handle) in handles {
            let outcome = match handle.await {
                Ok((region, Ok((records, stats)))) => SourceOutcome::Loaded {
                    region,
                    records,
                    stats,
                },
                Ok((region, Err(error))) => {
                    warn!(source = %region, error = %error, "source failed");
                    SourceOutcome::Failed { region, error }
                }
                Err(e) => {
                    let region = self.specs[idx].region.clone();
                    warn!(source = %region, error = %e, "fetch task failed");
                    SourceOutcome::Failed {
                        error: FleetError::unavailable(&region, e.to_string()),
                        region,
                    }
                }
            };
            outcomes[idx] = Some(outcome);
        }

        outcomes.into_iter().flatten().collect()
    }

    /// Refresh all sources and combine the successes into one dataset.
    ///
    /// Fails only if every attempted source failed.
    pub async fn fetch_all(&self) -> Result<Dataset> {
        let start = Instant::now();
        let outcomes = self.load_all().await;

        let attempted = outcomes
            .iter()
            .filter(|o| !matches!(o, SourceOutcome::Skipped { .. }))
            .count();
        let mut failed = 0usize;
        let mut records = Vec::new();
        for outcome in outcomes {
            match outcome {
                SourceOutcome::Loaded { records: part, .. } => records.extend(part),
                SourceOutcome::Failed { .. } => failed += 1,
                SourceOutcome::Skipped { .. } => {}
            }
        }

        if attempted > 0 && failed == attempted {
            return Err(FleetError::AllSourcesFailed { attempted });
        }

        let dataset = Dataset::new(SourceKey::All, self.clock.now(), records);
        info!(
            attempted,
            failed,
            records = dataset.len(),
            units = dataset.total_units(),
            duration_ms = start.elapsed().as_millis(),
            "combined refresh completed"
        );
        Ok(dataset)
    }

    /// Refresh whatever `key` names.
    pub async fn fetch(&self, key: &SourceKey) -> Result<Dataset> {
        match key {
            SourceKey::All => self.fetch_all().await,
            SourceKey::Region(region) => self.fetch_region(region).await,
        }
    }
}

#[async_trait]
impl DatasetFetcher for FetchScheduler {
    async fn fetch(&self, key: &SourceKey) -> Result<Dataset> {
        FetchScheduler::fetch(self, key).await
    }
}
