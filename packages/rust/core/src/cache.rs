//! TTL cache of datasets, keyed by source.
//!
//! One [`DatasetCache`] is built per process and shared by reference. The
//! entry map lock is never held across a fetch, so refreshing one key does
//! not block reads of another.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use fleettally_shared::{CachePolicy, Clock, Dataset, Result, SourceKey};

/// Produces a fresh dataset for a key. Implemented by the fetch scheduler.
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    async fn fetch(&self, key: &SourceKey) -> Result<Dataset>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    dataset: Dataset,
    expires_at: DateTime<Utc>,
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    /// Expiry of the combined `ALL` entry, if cached.
    pub all_expires_at: Option<DateTime<Utc>>,
}

pub struct DatasetCache {
    fetcher: Arc<dyn DatasetFetcher>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<SourceKey, CacheEntry>>,
}

impl DatasetCache {
    pub fn new(fetcher: Arc<dyn DatasetFetcher>, policy: &CachePolicy, clock: Arc<dyn Clock>) -> Self {
        let ttl = chrono::Duration::from_std(policy.ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            fetcher,
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Dataset for `key`, fetching when missing, expired or forced.
    ///
    /// Never fails: when the fetch fails the previous entry is served
    /// regardless of its age, or an empty dataset if there is none.
    #[instrument(skip_all, fields(key = %key, force_refresh))]
    pub async fn get(&self, key: &SourceKey, force_refresh: bool) -> Dataset {
        let now = self.clock.now();

        if !force_refresh {
            if let Some(entry) = self.entries.read().await.get(key) {
                if entry.expires_at > now {
                    debug!("cache hit");
                    return entry.dataset.clone();
                }
            }
        }

        match self.fetcher.fetch(key).await {
            Ok(dataset) => {
                let expires_at = self
                    .clock
                    .now()
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                info!(records = dataset.len(), units = dataset.total_units(), %expires_at, "cached");
                self.entries.write().await.insert(
                    key.clone(),
                    CacheEntry {
                        dataset: dataset.clone(),
                        expires_at,
                    },
                );
                dataset
            }
            Err(e) => match self.entries.read().await.get(key) {
                Some(stale) => {
                    warn!(error = %e, fetched_at = %stale.dataset.fetched_at(), "refresh failed, serving stale data");
                    stale.dataset.clone()
                }
                None => {
                    warn!(error = %e, "refresh failed, nothing cached");
                    Dataset::empty(key.clone(), now)
                }
            },
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "cache cleared");
    }

    /// Drop the entry for `key`, if any.
    pub async fn invalidate(&self, key: &SourceKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            entries: entries.len(),
            all_expires_at: entries.get(&SourceKey::All).map(|e| e.expires_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use fleettally_shared::{CanonicalRecord, FleetError, ManualClock, Status};

    use super::*;

    /// Answers fetches from a script; repeats the last answer once exhausted.
    struct ScriptedFetcher {
        calls: AtomicUsize,
        script: Mutex<VecDeque<std::result::Result<usize, &'static str>>>,
        clock: Arc<ManualClock>,
    }

    impl ScriptedFetcher {
        fn new(clock: Arc<ManualClock>, script: Vec<std::result::Result<usize, &'static str>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
                clock,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DatasetFetcher for ScriptedFetcher {
        async fn fetch(&self, key: &SourceKey) -> Result<Dataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.pop_front().unwrap()
                } else {
                    *script.front().unwrap()
                }
            };
            match next {
                Ok(n) => {
                    let records = (0..n)
                        .map(|_| CanonicalRecord {
                            region_name: key.to_string(),
                            city_district: key.to_string(),
                            kind: "Камаз".into(),
                            status: Status::Operational,
                            quantity: 1,
                            has_tracker: false,
                        })
                        .collect();
                    Ok(Dataset::new(key.clone(), self.clock.now(), records))
                }
                Err(msg) => Err(FleetError::unavailable(key.to_string(), msg)),
            }
        }
    }

    fn setup(
        script: Vec<std::result::Result<usize, &'static str>>,
    ) -> (Arc<ManualClock>, Arc<ScriptedFetcher>, DatasetCache) {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let fetcher = Arc::new(ScriptedFetcher::new(clock.clone(), script));
        let policy = CachePolicy {
            ttl: std::time::Duration::from_secs(1800),
        };
        let cache = DatasetCache::new(fetcher.clone(), &policy, clock.clone());
        (clock, fetcher, cache)
    }

    fn region(name: &str) -> SourceKey {
        SourceKey::Region(name.into())
    }

    #[tokio::test]
    async fn second_get_within_ttl_is_served_from_cache() {
        let (clock, fetcher, cache) = setup(vec![Ok(3)]);
        let first = cache.get(&region("R"), false).await;
        clock.advance(chrono::Duration::minutes(29));
        let second = cache.get(&region("R"), false).await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(first.len(), 3);
        assert_eq!(second.fetched_at(), first.fetched_at());
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let (clock, fetcher, cache) = setup(vec![Ok(1), Ok(2)]);
        cache.get(&region("R"), false).await;
        clock.advance(chrono::Duration::minutes(30));
        let refreshed = cache.get(&region("R"), false).await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(refreshed.len(), 2);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_ttl() {
        let (_clock, fetcher, cache) = setup(vec![Ok(1), Ok(4)]);
        cache.get(&region("R"), false).await;
        let forced = cache.get(&region("R"), true).await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(forced.len(), 4);
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_entry() {
        let (clock, fetcher, cache) = setup(vec![Ok(5), Err("boom")]);
        let fresh = cache.get(&region("R"), false).await;
        clock.advance(chrono::Duration::hours(2));
        let stale = cache.get(&region("R"), false).await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(stale.len(), 5);
        assert_eq!(stale.fetched_at(), fresh.fetched_at());
    }

    #[tokio::test]
    async fn failure_without_entry_yields_empty_dataset() {
        let (_clock, _fetcher, cache) = setup(vec![Err("down")]);
        let dataset = cache.get(&region("X"), false).await;

        assert!(dataset.is_empty());
        assert_eq!(dataset.key(), &region("X"));
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn keys_are_cached_independently() {
        let (_clock, fetcher, cache) = setup(vec![Ok(1)]);
        cache.get(&region("A"), false).await;
        cache.get(&region("B"), false).await;
        cache.get(&region("A"), false).await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.stats().await.entries, 2);
    }

    #[tokio::test]
    async fn clear_forces_fresh_fetch() {
        let (_clock, fetcher, cache) = setup(vec![Ok(1)]);
        cache.get(&SourceKey::All, false).await;
        assert!(cache.stats().await.all_expires_at.is_some());

        cache.clear().await;
        assert_eq!(cache.stats().await, CacheStats { entries: 0, all_expires_at: None });

        cache.get(&SourceKey::All, false).await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_drops_one_key() {
        let (_clock, fetcher, cache) = setup(vec![Ok(1)]);
        cache.get(&region("A"), false).await;
        cache.get(&region("B"), false).await;

        assert!(cache.invalidate(&region("A")).await);
        assert!(!cache.invalidate(&region("A")).await);
        cache.get(&region("B"), false).await;
        cache.get(&region("A"), false).await;
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn expiry_follows_ttl() {
        let (clock, _fetcher, cache) = setup(vec![Ok(1)]);
        cache.get(&SourceKey::All, false).await;
        let stats = cache.stats().await;
        assert_eq!(
            stats.all_expires_at,
            Some(clock.now() + chrono::Duration::minutes(30))
        );
    }
}
