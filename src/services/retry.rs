//! Retry Policy
//!
//! Exponential backoff for callers that wrap a sync cycle. Neither the
//! fetcher nor the sync engine retries on its own.

use std::time::Duration;

use crate::domain::config::RetryConfig;
use crate::domain::resource::EntityKind;
use crate::error::{Error, Result};
use crate::services::fetcher::CollectionFetcher;
use crate::services::surface::MapSurface;
use crate::services::sync::{GeofenceSync, SyncReport};

/// Backoff schedule derived from [`RetryConfig`]
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Jitter factor (0.0 - 1.0) to randomize delays
    pub jitter: f64,
    /// Retries allowed after the first attempt
    pub max_attempts: u32,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier.max(1.0),
            jitter: config.jitter.clamp(0.0, 1.0),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), `None` once exhausted
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let base_delay = self.initial_delay.as_millis() as f64
            * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let jitter_range = capped_delay * self.jitter;
        let jitter = (rand_jitter() * 2.0 - 1.0) * jitter_range;
        let final_delay = (capped_delay + jitter).max(0.0) as u64;

        Some(Duration::from_millis(final_delay))
    }
}

/// Sync one kind, retrying transport failures according to `policy`
///
/// Only [`Error::Fetch`] is retried; anything else is returned at once.
/// Between attempts the previous index and overlays stay in place.
pub async fn sync_with_retry<F, S>(
    sync: &mut GeofenceSync<F, S>,
    kind: EntityKind,
    policy: &RetryPolicy,
) -> Result<SyncReport>
where
    F: CollectionFetcher,
    S: MapSurface,
{
    let mut attempt = 0;
    loop {
        match sync.sync_kind(kind).await {
            Err(e @ Error::Fetch { .. }) => {
                attempt += 1;
                let Some(delay) = policy.next_delay(attempt) else {
                    return Err(e);
                };
                tracing::info!(
                    "{kind}: retrying in {}ms (attempt {attempt}/{}): {e}",
                    delay.as_millis(),
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

/// Simple pseudo-random jitter (0.0 - 1.0)
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}
