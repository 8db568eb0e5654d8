//! Pending-submission cache and result verifier.
//!
//! The cache is the only shared mutable resource in the client: engine
//! results enter through [`Verifier::on_candidate`] (producer side) and leave
//! through the submission pump (consumer side), serialized by one mutex.
//! Only verified points ever enter the cache.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::curve::Curve;
use crate::engine::CandidateResult;
use crate::protocol::{DistinguishedPoint, ProblemParameters};
use std::sync::Arc;

/// Ordered collection of verified distinguished points awaiting submission.
#[derive(Debug, Default)]
pub struct PendingCache {
    points: Mutex<Vec<DistinguishedPoint>>,
}

impl PendingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, point: DistinguishedPoint) {
        self.lock().push(point);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything when the cache has reached `threshold`, leaving it
    /// empty. Below the threshold nothing is taken and `None` is returned.
    pub fn take_batch(&self, threshold: usize) -> Option<Vec<DistinguishedPoint>> {
        let mut points = self.lock();
        if points.len() < threshold {
            return None;
        }
        Some(std::mem::take(&mut *points))
    }

    /// Take everything regardless of the threshold. Shutdown path only.
    pub fn take_all(&self) -> Vec<DistinguishedPoint> {
        std::mem::take(&mut *self.lock())
    }

    /// Splice a failed batch back in front of anything appended since it was
    /// taken, restoring the original order. Nothing is lost on submission
    /// failure.
    pub fn restore(&self, mut batch: Vec<DistinguishedPoint>) {
        let mut points = self.lock();
        batch.append(&mut points);
        *points = batch;
    }

    /// Copy of the current contents, in order.
    pub fn snapshot(&self) -> Vec<DistinguishedPoint> {
        self.lock().clone()
    }

    // The list stays consistent even when a holder panicked mid-append, so a
    // poisoned guard is recovered rather than propagated.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DistinguishedPoint>> {
        self.points.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Validates engine results against the curve before they reach the cache.
pub struct Verifier {
    curve: Curve,
    cache: Arc<PendingCache>,
}

impl Verifier {
    pub fn new(params: &ProblemParameters, cache: Arc<PendingCache>) -> Self {
        Self {
            curve: params.curve(),
            cache,
        }
    }

    /// Handle one candidate from the engine. Invalid candidates are logged
    /// with full diagnostics and discarded; valid ones are appended to the
    /// pending cache. No deduplication is performed.
    pub fn on_candidate(&self, candidate: CandidateResult) -> bool {
        if !self.curve.is_on_curve(&candidate.x, &candidate.y) {
            warn!("Invalid point reported by engine, discarding");
            warn!("  a: {}", candidate.a.to_str_radix(16));
            warn!("  b: {}", candidate.b.to_str_radix(16));
            warn!("  x: {}", candidate.x.to_str_radix(16));
            warn!("  y: {}", candidate.y.to_str_radix(16));
            warn!("  length: {}", candidate.length);
            return false;
        }

        self.cache.push(DistinguishedPoint {
            a: candidate.a,
            b: candidate.b,
            x: candidate.x,
            y: candidate.y,
            length: candidate.length,
        });
        debug!("Distinguished point cached ({} pending)", self.cache.len());
        true
    }

    /// Drain the engine's result channel until every sender is gone.
    pub async fn run(&self, mut results: mpsc::Receiver<CandidateResult>) {
        while let Some(candidate) = results.recv().await {
            self.on_candidate(candidate);
        }
        debug!("Result channel closed, verifier exiting");
    }
}
