use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Pattern every batch code must match: `PM-` followed by digits.
static BATCH_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PM-\d+$").expect("batch code regex is valid"));

/// Returns `true` if `code` is a well-formed batch code (`PM-<digits>`).
#[must_use]
pub fn is_valid_batch_code(code: &str) -> bool {
    BATCH_CODE_RE.is_match(code)
}

/// The immutable identity of a manufactured batch.
///
/// These four fields are the only inputs to fingerprint derivation; once a
/// batch is registered they never change. The batch code is globally unique
/// across the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchIdentity {
    /// Unique batch code in the form `PM-<digits>`, e.g. `PM-12345`.
    pub batch_code: String,

    /// Manufacturer name.
    pub manufacturer: String,

    /// Product name.
    pub product_name: String,

    /// Expiry date shared by every unit in the batch.
    pub expiry_date: DateTime<Utc>,
}

impl BatchIdentity {
    /// Create a batch identity, validating all fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if any field is empty or the
    /// batch code does not match `PM-<digits>`.
    pub fn new(
        batch_code: impl Into<String>,
        manufacturer: impl Into<String>,
        product_name: impl Into<String>,
        expiry_date: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let identity = Self {
            batch_code: batch_code.into(),
            manufacturer: manufacturer.into(),
            product_name: product_name.into(),
            expiry_date,
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Validate field presence and the batch code pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] naming the offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch_code.trim().is_empty() {
            return Err(CoreError::InvalidInput("batch code is required".into()));
        }
        if self.manufacturer.trim().is_empty() {
            return Err(CoreError::InvalidInput("manufacturer is required".into()));
        }
        if self.product_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("product name is required".into()));
        }
        if !is_valid_batch_code(&self.batch_code) {
            return Err(CoreError::InvalidInput(format!(
                "invalid batch code {:?}: expected PM-<number> (e.g. PM-12345)",
                self.batch_code
            )));
        }
        Ok(())
    }
}
