use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use puremeds_core::{Fingerprint, LedgerRecord};

use crate::error::LedgerError;

/// Receipt returned by a successful ledger registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// Transaction reference on the ledger.
    pub tx_reference: String,

    /// Block (or equivalent commit unit) reference.
    pub block_reference: String,
}

/// Strongly-typed ledger client trait with native `async fn`.
///
/// This trait is **not** object-safe because it uses native `async fn`
/// methods. For dynamic dispatch, use [`DynLedgerClient`] -- every
/// `LedgerClient` implements it via a blanket implementation.
pub trait LedgerClient: Send + Sync {
    /// Returns the unique name of this client implementation.
    fn name(&self) -> &str;

    /// Record a `fingerprint -> batch_code` fact on the ledger.
    ///
    /// Fails with [`LedgerError::AlreadyRegistered`] when the fingerprint
    /// exists, and [`LedgerError::Unavailable`] on connectivity failure.
    fn register(
        &self,
        fingerprint: &Fingerprint,
        batch_code: &str,
    ) -> impl std::future::Future<Output = Result<LedgerReceipt, LedgerError>> + Send;

    /// Look up a fingerprint. Read-only: must not mutate ledger state.
    ///
    /// Unknown fingerprints yield a record with `is_valid = false` rather
    /// than an error; [`LedgerError::Unavailable`] is reserved for the
    /// ledger being unreachable.
    fn query(
        &self,
        fingerprint: &Fingerprint,
    ) -> impl std::future::Future<Output = Result<LedgerRecord, LedgerError>> + Send;

    /// Verify the ledger endpoint is reachable.
    fn health_check(&self) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;
}

/// Object-safe ledger client trait for use behind `Arc<dyn DynLedgerClient>`.
///
/// You generally should not implement this trait directly -- implement
/// [`LedgerClient`] and rely on the blanket implementation.
#[async_trait]
pub trait DynLedgerClient: Send + Sync {
    /// Returns the unique name of this client implementation.
    fn name(&self) -> &str;

    /// Record a `fingerprint -> batch_code` fact on the ledger.
    async fn register(
        &self,
        fingerprint: &Fingerprint,
        batch_code: &str,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// Look up a fingerprint. Read-only.
    async fn query(&self, fingerprint: &Fingerprint) -> Result<LedgerRecord, LedgerError>;

    /// Verify the ledger endpoint is reachable.
    async fn health_check(&self) -> Result<(), LedgerError>;
}

/// Blanket implementation bridging the static and dynamic dispatch worlds.
#[async_trait]
impl<T: LedgerClient + Sync> DynLedgerClient for T {
    fn name(&self) -> &str {
        LedgerClient::name(self)
    }

    async fn register(
        &self,
        fingerprint: &Fingerprint,
        batch_code: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        LedgerClient::register(self, fingerprint, batch_code).await
    }

    async fn query(&self, fingerprint: &Fingerprint) -> Result<LedgerRecord, LedgerError> {
        LedgerClient::query(self, fingerprint).await
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        LedgerClient::health_check(self).await
    }
}
