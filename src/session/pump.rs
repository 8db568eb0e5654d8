//! Submission pump.
//!
//! Background loop that periodically drains the pending cache and submits it
//! to the coordination server. Submission failures are non-fatal: the batch
//! is spliced back into the cache and retried on the next cycle, giving
//! at-least-once delivery. The server is the deduplication authority if it
//! cares about exactly-once.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::protocol::Coordinator;
use crate::session::cache::PendingCache;

/// Counters for monitoring; logged per successful cycle.
#[derive(Debug, Clone, Default)]
pub struct PumpStats {
    pub batches_submitted: u64,
    pub points_submitted: u64,
    pub failed_attempts: u64,
    pub last_success: Option<DateTime<Utc>>,
}

pub struct SubmissionPump<C: Coordinator> {
    problem_id: String,
    coordinator: Arc<C>,
    cache: Arc<PendingCache>,
    threshold: usize,
    stats: Mutex<PumpStats>,
}

impl<C: Coordinator> SubmissionPump<C> {
    pub fn new(
        problem_id: String,
        coordinator: Arc<C>,
        cache: Arc<PendingCache>,
        threshold: usize,
    ) -> Self {
        Self {
            problem_id,
            coordinator,
            cache,
            threshold,
            stats: Mutex::new(PumpStats::default()),
        }
    }

    /// One pump cycle. Submits only when the cache has reached the
    /// configured threshold; returns whether a successful submission
    /// happened.
    pub async fn run_cycle(&self) -> bool {
        let Some(batch) = self.cache.take_batch(self.threshold) else {
            debug!(
                "{} points pending, below threshold {}",
                self.cache.len(),
                self.threshold
            );
            return false;
        };

        info!("Sending {} points to server", batch.len());
        match self
            .coordinator
            .submit_points(&self.problem_id, &batch)
            .await
        {
            Ok(()) => {
                let mut stats = self.lock_stats();
                stats.batches_submitted += 1;
                stats.points_submitted += batch.len() as u64;
                stats.last_success = Some(Utc::now());
                info!(
                    "Submission accepted ({} batches, {} points total)",
                    stats.batches_submitted, stats.points_submitted
                );
                true
            }
            Err(e) => {
                warn!("Error sending points to server: {}. Will try again later", e);
                self.cache.restore(batch);
                let mut stats = self.lock_stats();
                stats.failed_attempts += 1;
                false
            }
        }
    }

    /// Pump loop: one cycle per period until shutdown is signalled, then a
    /// final flush of anything still queued.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>, period_secs: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(period_secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.final_flush().await;
        debug!("Submission pump exiting");
    }

    /// Shutdown path: submit whatever is queued even below the threshold so
    /// found points are not abandoned. A failure here still restores the
    /// cache, but no further retry follows.
    async fn final_flush(&self) {
        let batch = self.cache.take_all();
        if batch.is_empty() {
            return;
        }

        info!("Final flush: sending {} remaining points", batch.len());
        if let Err(e) = self
            .coordinator
            .submit_points(&self.problem_id, &batch)
            .await
        {
            warn!("Final flush failed: {}", e);
            self.cache.restore(batch);
        }
    }

    pub fn stats(&self) -> PumpStats {
        self.lock_stats().clone()
    }

    // Counters are always internally consistent; recover a poisoned guard.
    fn lock_stats(&self) -> std::sync::MutexGuard<'_, PumpStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}
