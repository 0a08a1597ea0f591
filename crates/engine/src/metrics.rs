use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking engine outcomes.
///
/// All counters use relaxed ordering for maximum throughput. For a
/// consistent point-in-time view, call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total verification requests handled.
    pub verifications: AtomicU64,
    /// Verifications that matched a locally-known batch.
    pub verified: AtomicU64,
    /// Verifications of fingerprints unknown to the store.
    pub unknown: AtomicU64,
    /// Verified batches that had passed their expiry date.
    pub expired: AtomicU64,
    /// Ledger cross-checks that could not be completed.
    pub ledger_check_failures: AtomicU64,
    /// Batches registered.
    pub registrations: AtomicU64,
}

impl EngineMetrics {
    /// Increment the verifications counter.
    pub fn increment_verifications(&self) {
        self.verifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the verified counter.
    pub fn increment_verified(&self) {
        self.verified.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the unknown counter.
    pub fn increment_unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the expired counter.
    pub fn increment_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the ledger-check-failure counter.
    pub fn increment_ledger_check_failures(&self) {
        self.ledger_check_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the registrations counter.
    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            verifications: self.verifications.load(Ordering::Relaxed),
            verified: self.verified.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            ledger_check_failures: self.ledger_check_failures.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`EngineMetrics`] at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    /// Total verification requests handled.
    pub verifications: u64,
    /// Verifications that matched a locally-known batch.
    pub verified: u64,
    /// Verifications of fingerprints unknown to the store.
    pub unknown: u64,
    /// Verified batches that had passed their expiry date.
    pub expired: u64,
    /// Ledger cross-checks that could not be completed.
    pub ledger_check_failures: u64,
    /// Batches registered.
    pub registrations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = EngineMetrics::default();
        let snap = m.snapshot();
        assert_eq!(snap.verifications, 0);
        assert_eq!(snap.verified, 0);
        assert_eq!(snap.unknown, 0);
        assert_eq!(snap.expired, 0);
        assert_eq!(snap.ledger_check_failures, 0);
        assert_eq!(snap.registrations, 0);
    }

    #[test]
    fn increments_are_visible_in_snapshot() {
        let m = EngineMetrics::default();
        m.increment_verifications();
        m.increment_verifications();
        m.increment_verified();
        m.increment_ledger_check_failures();

        let snap = m.snapshot();
        assert_eq!(snap.verifications, 2);
        assert_eq!(snap.verified, 1);
        assert_eq!(snap.ledger_check_failures, 1);
    }
}
