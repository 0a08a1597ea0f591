use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::batch::BatchIdentity;
use crate::error::CoreError;
use crate::fingerprint::{Fingerprint, parse_expiry};

/// Input for registering a new product batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewProduct {
    /// Product name, e.g. `Paracetamol`.
    pub product_name: String,

    /// Active chemical name, e.g. `Acetaminophen`.
    pub chemical_name: String,

    /// Manufacturer name.
    pub manufacturer: String,

    /// Unit price.
    pub price: f64,

    /// What the medicine is used for.
    pub purpose: String,

    /// Known side effects.
    pub side_effects: Vec<String>,

    /// Catalog category, e.g. `Pain Relief`.
    pub category: String,

    /// Optional product image URL.
    #[serde(default)]
    pub product_image: Option<String>,

    /// Units available for sale.
    pub available_stock: i64,

    /// Unique batch code in the form `PM-<digits>`.
    pub batch_code: String,

    /// Batch expiry date. Accepts RFC 3339 timestamps in any offset or
    /// plain `YYYY-MM-DD` dates.
    #[serde(deserialize_with = "deserialize_expiry")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-01-01"))]
    pub expiry_date: DateTime<Utc>,
}

/// Deserialize an expiry date from its common textual forms.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_expiry(&raw).map_err(serde::de::Error::custom)
}

impl NewProduct {
    /// Extract the immutable batch identity, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if identity fields are missing
    /// or the batch code is malformed, or if catalog fields are empty.
    pub fn identity(&self) -> Result<BatchIdentity, CoreError> {
        if self.chemical_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("chemical name is required".into()));
        }
        if self.purpose.trim().is_empty() {
            return Err(CoreError::InvalidInput("purpose is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::InvalidInput("category is required".into()));
        }
        BatchIdentity::new(
            self.batch_code.clone(),
            self.manufacturer.clone(),
            self.product_name.clone(),
            self.expiry_date,
        )
    }
}

/// A registered product batch as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProductRecord {
    /// Product name.
    pub product_name: String,

    /// Active chemical name.
    pub chemical_name: String,

    /// Manufacturer name.
    pub manufacturer: String,

    /// Unit price.
    pub price: f64,

    /// What the medicine is used for.
    pub purpose: String,

    /// Known side effects.
    pub side_effects: Vec<String>,

    /// Catalog category.
    pub category: String,

    /// Optional product image URL.
    pub product_image: Option<String>,

    /// Units available for sale.
    pub available_stock: i64,

    /// Unique batch code.
    pub batch_code: String,

    /// Batch expiry date.
    pub expiry_date: DateTime<Utc>,

    /// The batch fingerprint (unique).
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub fingerprint: Fingerprint,

    /// The registration QR artifact as a base64-encoded PNG.
    pub qr_png: String,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// The subset of product metadata attached to verification verdicts.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            product_name: self.product_name.clone(),
            chemical_name: self.chemical_name.clone(),
            manufacturer: self.manufacturer.clone(),
            batch_code: self.batch_code.clone(),
            category: self.category.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

/// Product metadata carried on a verification verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProductSummary {
    /// Product name.
    pub product_name: String,

    /// Active chemical name.
    pub chemical_name: String,

    /// Manufacturer name.
    pub manufacturer: String,

    /// Batch code.
    pub batch_code: String,

    /// Catalog category.
    pub category: String,

    /// Batch expiry date.
    pub expiry_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_product() -> NewProduct {
        NewProduct {
            product_name: "Paracetamol".into(),
            chemical_name: "Acetaminophen".into(),
            manufacturer: "Acme".into(),
            price: 4.99,
            purpose: "Pain relief".into(),
            side_effects: vec!["Nausea".into()],
            category: "Pain Relief".into(),
            product_image: None,
            available_stock: 100,
            batch_code: "PM-12345".into(),
            expiry_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn identity_extraction() {
        let identity = new_product().identity().unwrap();
        assert_eq!(identity.batch_code, "PM-12345");
        assert_eq!(identity.manufacturer, "Acme");
        assert_eq!(identity.product_name, "Paracetamol");
    }

    #[test]
    fn expiry_accepts_both_textual_forms() {
        let json = serde_json::json!({
            "product_name": "Paracetamol",
            "chemical_name": "Acetaminophen",
            "manufacturer": "Acme",
            "price": 4.99,
            "purpose": "Pain relief",
            "side_effects": [],
            "category": "Pain Relief",
            "available_stock": 100,
            "batch_code": "PM-12345",
            "expiry_date": "2026-01-01",
        });
        let from_date: NewProduct = serde_json::from_value(json.clone()).unwrap();

        let mut json = json;
        json["expiry_date"] = "2026-01-01T00:00:00Z".into();
        let from_rfc3339: NewProduct = serde_json::from_value(json).unwrap();

        assert_eq!(from_date.expiry_date, from_rfc3339.expiry_date);
        assert_eq!(
            from_date.expiry_date,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn catalog_fields_validated() {
        let mut p = new_product();
        p.chemical_name = " ".into();
        assert!(p.identity().is_err());

        let mut p = new_product();
        p.category = String::new();
        assert!(p.identity().is_err());
    }
}
