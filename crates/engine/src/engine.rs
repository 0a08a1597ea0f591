use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use puremeds_core::{
    Fingerprint, LedgerCheck, NewProduct, ProductRecord, QrPayload, SupplyChainRecord,
    VerificationVerdict, derive_fingerprint,
};
use puremeds_ledger::{DynLedgerClient, LedgerReceipt};
use puremeds_store::{ProductStore, StoreError};

use crate::error::EngineError;
use crate::metrics::EngineMetrics;

/// Days-to-expiry threshold under which verdicts carry a warning.
const NEAR_EXPIRY_DAYS: i64 = 30;

/// The result of registering a new batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredBatch {
    /// The persisted product record (including the QR artifact).
    pub product: ProductRecord,

    /// The ledger registration receipt.
    pub receipt: LedgerReceipt,
}

/// Orchestrates verification and registration over injected collaborators.
///
/// Stateless between calls: each verification is an independent pipeline
/// of reads, and no lock is held across the ledger round-trip. The store
/// and ledger are constructed once at startup and shared.
pub struct VerificationEngine {
    store: Arc<dyn ProductStore>,
    ledger: Arc<dyn DynLedgerClient>,
    metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for VerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationEngine").finish_non_exhaustive()
    }
}

impl VerificationEngine {
    /// Assemble an engine from its collaborators. Prefer
    /// [`EngineBuilder`](crate::builder::EngineBuilder).
    #[must_use]
    pub fn new(
        store: Arc<dyn ProductStore>,
        ledger: Arc<dyn DynLedgerClient>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            ledger,
            metrics,
        }
    }

    /// Engine metrics handle.
    #[must_use]
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// The underlying product store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }

    /// Verify a medicine from a photographed QR image on disk.
    ///
    /// Decode failures propagate as request errors; everything after a
    /// successful decode behaves exactly like
    /// [`verify_fingerprint`](Self::verify_fingerprint).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Qr`] for unreadable images and malformed or
    /// incomplete payloads, [`EngineError::Store`] when the store fails.
    #[instrument(skip(self, image))]
    pub async fn verify_image(&self, image: &Path) -> Result<VerificationVerdict, EngineError> {
        let payload = puremeds_qr::decode_file(image)?;
        debug!(batch_code = %payload.batch_code, "decoded QR payload");
        self.verify_payload(payload).await
    }

    /// Verify a decoded QR payload.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] when the payload digest is not a
    /// well-formed fingerprint.
    pub async fn verify_payload(
        &self,
        payload: QrPayload,
    ) -> Result<VerificationVerdict, EngineError> {
        let fingerprint = Fingerprint::parse(&payload.fingerprint)?;
        self.verify(&fingerprint, Some(payload.batch_code)).await
    }

    /// Verify a medicine directly by fingerprint, skipping QR decode.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] when `raw` is not a well-formed
    /// digest, [`EngineError::Store`] when the store fails. An unknown
    /// fingerprint is NOT an error: it yields a verdict with
    /// `is_valid = false`.
    #[instrument(skip(self, raw))]
    pub async fn verify_fingerprint(&self, raw: &str) -> Result<VerificationVerdict, EngineError> {
        let fingerprint = Fingerprint::parse(raw)?;
        self.verify(&fingerprint, None).await
    }

    /// The shared verification pipeline: local lookup, best-effort ledger
    /// cross-check, expiry evaluation, verdict synthesis.
    async fn verify(
        &self,
        fingerprint: &Fingerprint,
        scanned_batch_code: Option<String>,
    ) -> Result<VerificationVerdict, EngineError> {
        self.metrics.increment_verifications();
        let now = Utc::now();

        let Some(product) = self.store.find_by_fingerprint(fingerprint).await? else {
            self.metrics.increment_unknown();
            info!(fingerprint = %fingerprint, "fingerprint not known to store");
            return Ok(Self::unknown_verdict(
                fingerprint,
                scanned_batch_code,
                now,
            ));
        };

        // Best-effort ledger cross-check. The ledger is a slow, remote,
        // independently-failing collaborator: any failure here degrades
        // the verdict, it never fails the request.
        let ledger_check = match self.ledger.query(fingerprint).await {
            Ok(record) => Some(LedgerCheck::from(record)),
            Err(e) => {
                self.metrics.increment_ledger_check_failures();
                warn!(error = %e, fingerprint = %fingerprint, "ledger cross-check failed");
                None
            }
        };

        let (is_expired, days_until_expiry) = evaluate_expiry(product.expiry_date, now);

        self.metrics.increment_verified();
        if is_expired {
            self.metrics.increment_expired();
        }

        let message = build_message(is_expired, days_until_expiry, ledger_check.as_ref());

        Ok(VerificationVerdict {
            is_valid: true,
            is_known_to_store: true,
            is_expired,
            days_until_expiry,
            product: Some(product.summary()),
            ledger_check,
            fingerprint: fingerprint.as_str().to_owned(),
            batch_code: scanned_batch_code.or(Some(product.batch_code)),
            message,
            verified_at: now,
        })
    }

    /// Verdict for a fingerprint the platform never distributed.
    fn unknown_verdict(
        fingerprint: &Fingerprint,
        scanned_batch_code: Option<String>,
        now: DateTime<Utc>,
    ) -> VerificationVerdict {
        let source = if scanned_batch_code.is_some() {
            "QR code"
        } else {
            "hash"
        };
        VerificationVerdict {
            is_valid: false,
            is_known_to_store: false,
            is_expired: false,
            days_until_expiry: 0,
            product: None,
            ledger_check: None,
            fingerprint: fingerprint.as_str().to_owned(),
            batch_code: scanned_batch_code,
            message: format!(
                "This medicine is not distributed by PureMeds. The {source} does not match \
                 any registered medicine in our system."
            ),
            verified_at: now,
        }
    }

    /// Register a new product batch end to end.
    ///
    /// Derives the fingerprint, records it on the ledger, renders the QR
    /// artifact, and persists the product with its default supply chain.
    /// Unlike verification, registration requires the ledger: a batch must
    /// exist on it before its QR code goes out into the world.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Input`] for invalid identity fields or an expiry
    ///   date that is not in the future.
    /// - [`EngineError::Store`] with [`StoreError::Duplicate`] for reused
    ///   batch codes or fingerprints.
    /// - [`EngineError::Ledger`] when the ledger rejects the fingerprint
    ///   or cannot be reached.
    #[instrument(skip(self, new_product), fields(batch_code = %new_product.batch_code))]
    pub async fn register_batch(
        &self,
        new_product: NewProduct,
    ) -> Result<RegisteredBatch, EngineError> {
        let identity = new_product.identity()?;
        let now = Utc::now();

        if identity.expiry_date <= now {
            return Err(EngineError::Input(puremeds_core::CoreError::InvalidInput(
                "expiry date must be in the future".into(),
            )));
        }

        let fingerprint = derive_fingerprint(&identity)?;

        // Check uniqueness before touching the ledger: the ledger is
        // append-only, so a store conflict discovered afterwards could
        // not be rolled back.
        if self
            .store
            .find_by_batch_code(&identity.batch_code)
            .await?
            .is_some()
        {
            return Err(EngineError::Store(StoreError::Duplicate {
                field: "batch_code".into(),
            }));
        }
        if self
            .store
            .find_by_fingerprint(&fingerprint)
            .await?
            .is_some()
        {
            return Err(EngineError::Store(StoreError::Duplicate {
                field: "fingerprint".into(),
            }));
        }

        let receipt = self
            .ledger
            .register(&fingerprint, &identity.batch_code)
            .await?;
        info!(
            fingerprint = %fingerprint,
            tx = %receipt.tx_reference,
            "batch registered on ledger"
        );

        let qr_png = puremeds_qr::encode(&fingerprint, &identity.batch_code)?;

        let product = ProductRecord {
            product_name: new_product.product_name,
            chemical_name: new_product.chemical_name,
            manufacturer: new_product.manufacturer,
            price: new_product.price,
            purpose: new_product.purpose,
            side_effects: new_product.side_effects,
            category: new_product.category,
            product_image: new_product.product_image,
            available_stock: new_product.available_stock,
            batch_code: new_product.batch_code,
            expiry_date: new_product.expiry_date,
            fingerprint,
            qr_png: B64.encode(&qr_png),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_product(product.clone()).await?;
        self.store
            .insert_supply_chain(SupplyChainRecord::for_registration(
                product.batch_code.clone(),
                product.manufacturer.clone(),
                product.expiry_date,
                product.available_stock,
            ))
            .await?;

        self.metrics.increment_registrations();

        Ok(RegisteredBatch { product, receipt })
    }
}

/// Classify expiry against `now`.
///
/// A batch expiring exactly at `now` counts as expired. For live batches
/// the day count rounds up, so anything short of a full day still reads
/// "1 day".
fn evaluate_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> (bool, i64) {
    if expiry <= now {
        return (true, 0);
    }
    let seconds = (expiry - now).num_seconds();
    let days = seconds / 86_400 + i64::from(seconds % 86_400 > 0);
    (false, days)
}

/// Compose the user-facing message for a recognized batch.
fn build_message(is_expired: bool, days_until_expiry: i64, ledger_check: Option<&LedgerCheck>) -> String {
    let mut message = if is_expired {
        "Medicine verified but has expired. Do not use this medicine.".to_owned()
    } else if days_until_expiry <= NEAR_EXPIRY_DAYS {
        format!("Medicine verified. Warning: Expires in {days_until_expiry} days.")
    } else {
        "Medicine verified successfully!".to_owned()
    };

    if !ledger_check.is_some_and(|check| check.is_valid) {
        message.push_str(" Note: Blockchain verification unavailable.");
    }

    message
}
