use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::product::ProductSummary;

/// A fingerprint-to-batch fact as recorded on the external ledger.
///
/// Read-only from this system's perspective; the ledger owns these rows
/// and only answers existence/validity queries about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LedgerRecord {
    /// Whether the fingerprint is known and valid on the ledger.
    pub is_valid: bool,

    /// The batch code the ledger associates with the fingerprint.
    pub batch_code: String,

    /// Block time at which the fingerprint was registered.
    pub registered_at: Option<DateTime<Utc>>,
}

/// The outcome of the ledger cross-check attached to a verdict.
///
/// Absent entirely when the ledger could not be reached; the verdict's
/// message then carries a note instead of the request failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LedgerCheck {
    /// Whether the ledger confirmed the fingerprint.
    pub is_valid: bool,

    /// Batch code as recorded on the ledger.
    pub batch_code: String,

    /// Ledger registration time.
    pub registered_at: Option<DateTime<Utc>>,
}

impl From<LedgerRecord> for LedgerCheck {
    fn from(record: LedgerRecord) -> Self {
        Self {
            is_valid: record.is_valid,
            batch_code: record.batch_code,
            registered_at: record.registered_at,
        }
    }
}

/// The synthesized result of one verification request.
///
/// Constructed fresh per call and never persisted. An unrecognized
/// fingerprint produces a verdict with `is_valid = false` -- that is a
/// normal business outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VerificationVerdict {
    /// Overall verdict: the item is a genuine platform-distributed batch.
    pub is_valid: bool,

    /// Whether the fingerprint matched a record in the local store.
    pub is_known_to_store: bool,

    /// Whether the batch has passed its expiry date.
    pub is_expired: bool,

    /// Whole days until expiry (0 when expired).
    pub days_until_expiry: i64,

    /// Product metadata for recognized batches.
    pub product: Option<ProductSummary>,

    /// Ledger cross-check result; `None` when the ledger was unreachable.
    pub ledger_check: Option<LedgerCheck>,

    /// The fingerprint that was checked.
    pub fingerprint: String,

    /// Batch code from the scanned payload, when one was supplied.
    pub batch_code: Option<String>,

    /// Human-readable summary for direct display.
    pub message: String,

    /// When the verification was performed.
    pub verified_at: DateTime<Utc>,
}
