use async_trait::async_trait;
use dashmap::DashMap;

use puremeds_core::{Fingerprint, ProductRecord, SupplyChainRecord};
use puremeds_store::{ProductFilter, ProductPage, ProductStore, StoreError};

/// In-memory [`ProductStore`] backed by [`DashMap`]s.
///
/// Products are keyed by batch code with a fingerprint index alongside.
/// Uniqueness is enforced through the `entry` API so concurrent inserts of
/// the same key cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: DashMap<String, ProductRecord>,
    fingerprints: DashMap<String, String>,
    supply_chains: DashMap<String, SupplyChainRecord>,
}

impl MemoryProductStore {
    /// Create a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All products matching the filter, newest first.
    fn matching(&self, filter: &ProductFilter) -> Vec<ProductRecord> {
        let mut matched: Vec<ProductRecord> = self
            .products
            .iter()
            .filter(|entry| {
                let product = entry.value();
                if let Some(category) = &filter.category
                    && &product.category != category
                {
                    return false;
                }
                if let Some(search) = &filter.search
                    && !product
                        .product_name
                        .to_lowercase()
                        .contains(&search.to_lowercase())
                {
                    return false;
                }
                true
            })
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert_product(&self, product: ProductRecord) -> Result<(), StoreError> {
        // Claim the fingerprint index first; roll it back if the batch
        // code turns out to be taken.
        let fp_key = product.fingerprint.as_str().to_owned();
        match self.fingerprints.entry(fp_key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(StoreError::Duplicate {
                    field: "fingerprint".into(),
                });
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(product.batch_code.clone());
            }
        }

        match self.products.entry(product.batch_code.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                self.fingerprints.remove(&fp_key);
                Err(StoreError::Duplicate {
                    field: "batch_code".into(),
                })
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(product);
                Ok(())
            }
        }
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let Some(batch_code) = self
            .fingerprints
            .get(fingerprint.as_str())
            .map(|entry| entry.value().clone())
        else {
            return Ok(None);
        };
        Ok(self
            .products
            .get(&batch_code)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_batch_code(
        &self,
        batch_code: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self
            .products
            .get(batch_code)
            .map(|entry| entry.value().clone()))
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage, StoreError> {
        let matched = self.matching(filter);
        let total = matched.len() as u64;

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let products: Vec<ProductRecord> = matched
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect();

        Ok(ProductPage::new(products, total, filter))
    }

    async fn featured_products(&self, limit: u32) -> Result<Vec<ProductRecord>, StoreError> {
        let filter = ProductFilter::default();
        let matched = self.matching(&filter);
        Ok(matched.into_iter().take(limit as usize).collect())
    }

    async fn delete_product(&self, batch_code: &str) -> Result<bool, StoreError> {
        let Some((_, product)) = self.products.remove(batch_code) else {
            return Ok(false);
        };
        self.fingerprints.remove(product.fingerprint.as_str());
        // Supply chain rows cascade with their product.
        self.supply_chains.remove(batch_code);
        Ok(true)
    }

    async fn insert_supply_chain(&self, chain: SupplyChainRecord) -> Result<(), StoreError> {
        match self.supply_chains.entry(chain.batch_code.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::Duplicate {
                field: "batch_code".into(),
            }),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(chain);
                Ok(())
            }
        }
    }

    async fn find_supply_chain(
        &self,
        batch_code: &str,
    ) -> Result<Option<SupplyChainRecord>, StoreError> {
        Ok(self
            .supply_chains
            .get(batch_code)
            .map(|entry| entry.value().clone()))
    }

    async fn consume_stock(
        &self,
        batch_code: &str,
        quantity: i64,
    ) -> Result<SupplyChainRecord, StoreError> {
        let mut entry = self
            .supply_chains
            .get_mut(batch_code)
            .ok_or_else(|| StoreError::NotFound(format!("supply chain for {batch_code}")))?;
        entry.consume_stock(quantity);
        Ok(entry.value().clone())
    }
}
