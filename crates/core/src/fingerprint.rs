//! Fingerprint derivation for batch authenticity.
//!
//! A fingerprint is the canonical authenticity key of a batch: a SHA-256
//! digest over the batch's identity fields, rendered as lowercase hex. The
//! same identity always yields the same fingerprint, so a QR code printed
//! at registration time can be matched years later against both the local
//! store and the external ledger.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::batch::BatchIdentity;
use crate::error::CoreError;

/// Separator between identity fields in the hash input.
const FIELD_SEPARATOR: &str = "-";

/// A 64-character lowercase hex SHA-256 digest identifying a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String))]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse and normalize a digest string into a fingerprint.
    ///
    /// Accepts an optional `0x` prefix and uppercase hex; the stored form
    /// is always 64 lowercase hex characters without a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedHash`] when the length or character
    /// set is wrong.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if bare.len() != 64 {
            return Err(CoreError::MalformedHash(format!(
                "expected 64 hex characters, got {}",
                bare.len()
            )));
        }
        if !bare.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::MalformedHash(
                "digest contains non-hex characters".into(),
            ));
        }

        Ok(Self(bare.to_ascii_lowercase()))
    }

    /// Return the bare 64-character lowercase hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the fixed-width `0x`-prefixed form sent to the ledger
    /// (a 32-byte word, 66 characters total).
    #[must_use]
    pub fn to_ledger_digest(&self) -> String {
        format!("0x{}", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render the canonical expiry string included in the hash input.
///
/// The canonical form is RFC 3339 UTC with millisecond precision and a `Z`
/// suffix (e.g. `2026-01-01T00:00:00.000Z`). Any change to this format
/// silently changes every derived fingerprint, so it is fixed here and
/// nowhere else.
#[must_use]
pub fn canonical_expiry(expiry: DateTime<Utc>) -> String {
    expiry.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an expiry date from its common textual forms.
///
/// Accepts RFC 3339 timestamps in any offset (normalized to UTC) and plain
/// `YYYY-MM-DD` dates (interpreted as midnight UTC).
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] for anything else.
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("expiry date is required".into()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(midnight.and_utc());
    }

    Err(CoreError::InvalidInput(format!(
        "unparseable expiry date {trimmed:?}: expected RFC 3339 or YYYY-MM-DD"
    )))
}

/// Derive the fingerprint of a batch from its identity fields.
///
/// Concatenates batch code, manufacturer, canonical expiry, and product
/// name (in that order, `-`-separated), hashes the UTF-8 bytes with
/// SHA-256, and renders lowercase hex. Pure and deterministic: equal
/// identities always produce equal fingerprints, even when the expiry was
/// originally supplied in different textual forms.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] if any identity field fails
/// validation.
pub fn derive_fingerprint(identity: &BatchIdentity) -> Result<Fingerprint, CoreError> {
    identity.validate()?;

    let input = [
        identity.batch_code.as_str(),
        identity.manufacturer.as_str(),
        &canonical_expiry(identity.expiry_date),
        identity.product_name.as_str(),
    ]
    .join(FIELD_SEPARATOR);

    let digest = Sha256::digest(input.as_bytes());
    Ok(Fingerprint(hex::encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> BatchIdentity {
        BatchIdentity {
            batch_code: "PM-12345".into(),
            manufacturer: "Acme".into(),
            product_name: "Paracetamol".into(),
            expiry_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn deterministic() {
        let a = derive_fingerprint(&identity()).unwrap();
        let b = derive_fingerprint(&identity()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn equivalent_expiry_forms_agree() {
        let from_date = parse_expiry("2026-01-01").unwrap();
        let from_rfc3339 = parse_expiry("2026-01-01T00:00:00Z").unwrap();
        let from_offset = parse_expiry("2026-01-01T05:30:00+05:30").unwrap();
        assert_eq!(from_date, from_rfc3339);
        assert_eq!(from_rfc3339, from_offset);

        let mut id = identity();
        id.expiry_date = from_date;
        let a = derive_fingerprint(&id).unwrap();
        id.expiry_date = from_offset;
        let b = derive_fingerprint(&id).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sensitive_to_every_field() {
        let base = derive_fingerprint(&identity()).unwrap();

        let mut changed = identity();
        changed.batch_code = "PM-12346".into();
        assert_ne!(base, derive_fingerprint(&changed).unwrap());

        let mut changed = identity();
        changed.manufacturer = "Acme Labs".into();
        assert_ne!(base, derive_fingerprint(&changed).unwrap());

        let mut changed = identity();
        changed.product_name = "Ibuprofen".into();
        assert_ne!(base, derive_fingerprint(&changed).unwrap());

        let mut changed = identity();
        changed.expiry_date = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        assert_ne!(base, derive_fingerprint(&changed).unwrap());
    }

    #[test]
    fn invalid_identity_rejected() {
        let mut id = identity();
        id.manufacturer = String::new();
        assert!(matches!(
            derive_fingerprint(&id),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn canonical_expiry_format() {
        let expiry = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(canonical_expiry(expiry), "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn parse_digest_normalizes() {
        let fp = derive_fingerprint(&identity()).unwrap();
        let upper = fp.as_str().to_ascii_uppercase();
        let reparsed = Fingerprint::parse(&format!("0x{upper}")).unwrap();
        assert_eq!(fp, reparsed);
        assert_eq!(reparsed.to_ledger_digest().len(), 66);
        assert!(reparsed.to_ledger_digest().starts_with("0x"));
    }

    #[test]
    fn parse_digest_rejects_bad_input() {
        assert!(matches!(
            Fingerprint::parse("abc123"),
            Err(CoreError::MalformedHash(_))
        ));
        let not_hex = "g".repeat(64);
        assert!(matches!(
            Fingerprint::parse(&not_hex),
            Err(CoreError::MalformedHash(_))
        ));
    }

    #[test]
    fn parse_expiry_rejects_garbage() {
        assert!(parse_expiry("").is_err());
        assert!(parse_expiry("next tuesday").is_err());
        assert!(parse_expiry("01/01/2026").is_err());
    }
}
