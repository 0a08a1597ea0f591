use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use puremeds_core::{Fingerprint, LedgerRecord};

use crate::client::{LedgerClient, LedgerReceipt};
use crate::error::LedgerError;

#[derive(Debug, Clone)]
struct Entry {
    batch_code: String,
    registered_at: DateTime<Utc>,
}

/// In-process ledger for tests and single-node development.
///
/// Append-only like the real thing: entries can be added but never
/// mutated or removed. An outage can be simulated with
/// [`set_available`](Self::set_available) to exercise the engine's
/// soft-failure policy.
#[derive(Debug)]
pub struct MemoryLedger {
    entries: DashMap<String, Entry>,
    available: AtomicBool,
    tx_counter: AtomicU64,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    /// Create an empty, available ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            available: AtomicBool::new(true),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Toggle simulated availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of registered fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no fingerprints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("simulated outage".into()))
        }
    }
}

impl LedgerClient for MemoryLedger {
    fn name(&self) -> &str {
        "memory"
    }

    async fn register(
        &self,
        fingerprint: &Fingerprint,
        batch_code: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.check_available()?;

        let digest = fingerprint.to_ledger_digest();
        match self.entries.entry(digest) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(LedgerError::AlreadyRegistered),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Entry {
                    batch_code: batch_code.to_owned(),
                    registered_at: Utc::now(),
                });
                let tx = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(LedgerReceipt {
                    tx_reference: format!("0x{tx:064x}"),
                    block_reference: tx.to_string(),
                })
            }
        }
    }

    async fn query(&self, fingerprint: &Fingerprint) -> Result<LedgerRecord, LedgerError> {
        self.check_available()?;

        let digest = fingerprint.to_ledger_digest();
        Ok(match self.entries.get(&digest) {
            Some(entry) => LedgerRecord {
                is_valid: true,
                batch_code: entry.batch_code.clone(),
                registered_at: Some(entry.registered_at),
            },
            None => LedgerRecord {
                is_valid: false,
                batch_code: String::new(),
                registered_at: None,
            },
        })
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        self.check_available()
    }
}
