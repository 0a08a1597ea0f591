use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use puremeds_core::ProductRecord;
use puremeds_engine::MetricsSnapshot;

/// Generic error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error description.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Current engine metrics snapshot.
    pub metrics: MetricsResponse,
}

/// Engine metrics counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Total verification requests handled.
    #[schema(example = 42)]
    pub verifications: u64,
    /// Verifications that matched a locally-known batch.
    #[schema(example = 40)]
    pub verified: u64,
    /// Verifications of fingerprints unknown to the store.
    #[schema(example = 2)]
    pub unknown: u64,
    /// Verified batches that had passed their expiry date.
    #[schema(example = 1)]
    pub expired: u64,
    /// Ledger cross-checks that could not be completed.
    #[schema(example = 0)]
    pub ledger_check_failures: u64,
    /// Batches registered.
    #[schema(example = 12)]
    pub registrations: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            verifications: snap.verifications,
            verified: snap.verified,
            unknown: snap.unknown,
            expired: snap.expired,
            ledger_check_failures: snap.ledger_check_failures,
            registrations: snap.registrations,
        }
    }
}

/// Request body for fingerprint verification.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyFingerprintRequest {
    /// The fingerprint to verify (64 hex characters, `0x` prefix allowed).
    #[serde(alias = "hash")]
    pub fingerprint: String,
}

/// Response for a successful batch registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterProductResponse {
    /// The persisted product record, including its QR artifact.
    pub product: ProductRecord,
    /// Ledger transaction reference.
    pub tx_reference: String,
    /// Ledger block reference.
    pub block_reference: String,
}

/// Query parameters for catalog listings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 15).
    pub limit: Option<u32>,
    /// Exact category filter.
    pub category: Option<String>,
    /// Case-insensitive product-name search.
    pub search: Option<String>,
}

/// One page of catalog results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    /// Products on this page, newest first.
    pub products: Vec<ProductRecord>,
    /// Total records matching the filter.
    pub total: u64,
    /// The page that was returned.
    pub page: u32,
    /// Total number of pages for the filter.
    pub total_pages: u32,
}

/// Request body for stock consumption.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsumeStockRequest {
    /// Units to deduct from the remaining stock.
    pub quantity: i64,
}

/// Response for a product deletion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteProductResponse {
    /// Whether a product was deleted.
    pub deleted: bool,
}
