use std::sync::Arc;

use puremeds_ledger::DynLedgerClient;
use puremeds_store::ProductStore;

use crate::engine::VerificationEngine;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;

/// Fluent builder for constructing a [`VerificationEngine`].
///
/// A product store and a ledger client must both be supplied; the engine
/// has no other state.
pub struct EngineBuilder {
    store: Option<Arc<dyn ProductStore>>,
    ledger: Option<Arc<dyn DynLedgerClient>>,
}

impl EngineBuilder {
    /// Create a new builder with no collaborators set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            ledger: None,
        }
    }

    /// Set the product store implementation.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ProductStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the ledger client implementation.
    #[must_use]
    pub fn ledger(mut self, ledger: Arc<dyn DynLedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Consume the builder and produce a configured [`VerificationEngine`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the store or ledger has
    /// not been set.
    pub fn build(self) -> Result<VerificationEngine, EngineError> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Configuration("product store is required".into()))?;
        let ledger = self
            .ledger
            .ok_or_else(|| EngineError::Configuration("ledger client is required".into()))?;

        Ok(VerificationEngine::new(store, ledger, Arc::new(EngineMetrics::default())))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
