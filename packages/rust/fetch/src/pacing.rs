//! Shared pacing gate spacing out calls to the upstream row source.

use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out call slots at least `min_interval` (plus jitter) apart.
///
/// Reserving a slot is a single read-modify-write under the lock; the wait
/// for the slot happens outside it, so waiting tasks don't serialize on
/// the mutex.
#[derive(Debug)]
pub struct PacingGate {
    min_interval: Duration,
    jitter: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl PacingGate {
    pub fn new(min_interval: Duration, jitter: Duration) -> Self {
        Self {
            min_interval,
            jitter,
            next_slot: Mutex::new(None),
        }
    }

    fn jitter_sample(&self) -> Duration {
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Reserve the next free slot and return when it arrives.
    pub async fn wait(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.min_interval + self.jitter_sample());
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}
