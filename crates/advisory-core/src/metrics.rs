//! Atomic counters for one engagement.
//!
//! The scheduler creates a fresh [`Metrics`] per engagement and increments
//! it silently from the phase loop. Call [`Metrics::flush`] to emit the
//! values as a single `tracing::info!` event when the engagement ends.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lightweight atomic counters, no allocations and no locking.
#[derive(Debug)]
pub struct Metrics {
    agents_completed: AtomicU64,
    agents_failed: AtomicU64,
    artifacts_saved: AtomicU64,
}

/// Point-in-time copy of [`Metrics`], recorded on the engagement result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub agents_completed: u64,
    pub agents_failed: u64,
    pub artifacts_saved: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            agents_completed: AtomicU64::new(0),
            agents_failed: AtomicU64::new(0),
            artifacts_saved: AtomicU64::new(0),
        }
    }

    pub fn inc_agents_completed(&self) {
        self.agents_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agents_completed", "counter incremented");
    }

    pub fn inc_agents_failed(&self) {
        self.agents_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agents_failed", "counter incremented");
    }

    pub fn inc_artifacts_saved(&self) {
        self.artifacts_saved.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "artifacts_saved", "counter incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            agents_completed: self.agents_completed.load(Ordering::Relaxed),
            agents_failed: self.agents_failed.load(Ordering::Relaxed),
            artifacts_saved: self.artifacts_saved.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self, engagement_id: &str) {
        let snapshot = self.snapshot();
        tracing::info!(
            metric = "flush",
            engagement_id = %engagement_id,
            agents_completed = snapshot.agents_completed,
            agents_failed = snapshot.agents_failed,
            artifacts_saved = snapshot.artifacts_saved,
        );
    }
}
