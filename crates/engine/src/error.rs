use thiserror::Error;

use puremeds_core::CoreError;
use puremeds_ledger::LedgerError;
use puremeds_qr::QrError;
use puremeds_store::StoreError;

/// Errors surfaced by the verification engine.
///
/// Ledger errors only appear here for registration; during verification
/// they are absorbed into the verdict instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Input(#[from] CoreError),

    #[error("qr error: {0}")]
    Qr(#[from] QrError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("configuration error: {0}")]
    Configuration(String),
}
