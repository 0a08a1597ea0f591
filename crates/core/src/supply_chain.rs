use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One custody stage in a batch's supply chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CustodyEntry {
    /// Whether this stage has been verified.
    pub verified: bool,

    /// Name of the party responsible for the stage.
    pub name: String,
}

impl CustodyEntry {
    /// A verified entry with the given party name.
    #[must_use]
    pub fn verified(name: impl Into<String>) -> Self {
        Self {
            verified: true,
            name: name.into(),
        }
    }
}

/// Custody summary for a registered batch.
///
/// Created with platform defaults when the batch is registered and removed
/// together with its product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SupplyChainRecord {
    /// The batch code this chain belongs to.
    pub batch_code: String,

    /// Manufacturer name.
    pub manufacturer_name: String,

    /// Batch expiry date.
    pub expiry_date: DateTime<Utc>,

    /// Units still held on the platform.
    pub stock_remaining: i64,

    /// Raw-material sourcing stage.
    pub raw_material: CustodyEntry,

    /// Manufacturing stage.
    pub manufacturing: CustodyEntry,

    /// Quality-testing stage.
    pub quality_testing: CustodyEntry,

    /// Platform distribution stage.
    pub platform: CustodyEntry,

    /// Customer delivery stage.
    pub customers: CustodyEntry,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SupplyChainRecord {
    /// Build the default chain recorded at registration time.
    #[must_use]
    pub fn for_registration(
        batch_code: impl Into<String>,
        manufacturer: impl Into<String>,
        expiry_date: DateTime<Utc>,
        stock: i64,
    ) -> Self {
        let manufacturer = manufacturer.into();
        let now = Utc::now();
        Self {
            batch_code: batch_code.into(),
            manufacturer_name: manufacturer.clone(),
            expiry_date,
            stock_remaining: stock,
            raw_material: CustodyEntry::verified("Certified supplier"),
            manufacturing: CustodyEntry::verified(manufacturer),
            quality_testing: CustodyEntry::verified("Quality lab"),
            platform: CustodyEntry::verified("PureMeds"),
            customers: CustodyEntry {
                verified: true,
                name: String::new(),
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Decrement remaining stock by `quantity`, saturating at zero.
    pub fn consume_stock(&mut self, quantity: i64) {
        self.stock_remaining = (self.stock_remaining - quantity).max(0);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_defaults() {
        let chain = SupplyChainRecord::for_registration("PM-7", "Acme", Utc::now(), 50);
        assert_eq!(chain.manufacturing.name, "Acme");
        assert_eq!(chain.platform.name, "PureMeds");
        assert!(chain.raw_material.verified);
        assert_eq!(chain.stock_remaining, 50);
    }

    #[test]
    fn stock_saturates_at_zero() {
        let mut chain = SupplyChainRecord::for_registration("PM-7", "Acme", Utc::now(), 10);
        chain.consume_stock(4);
        assert_eq!(chain.stock_remaining, 6);
        chain.consume_stock(100);
        assert_eq!(chain.stock_remaining, 0);
    }
}
