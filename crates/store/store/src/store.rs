use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use puremeds_core::{Fingerprint, ProductRecord, SupplyChainRecord};

use crate::error::StoreError;

/// Filters and pagination for catalog listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFilter {
    /// 1-based page number.
    pub page: u32,

    /// Page size.
    pub limit: u32,

    /// Exact category match, when set.
    pub category: Option<String>,

    /// Case-insensitive product-name substring match, when set.
    pub search: Option<String>,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 15,
            category: None,
            search: None,
        }
    }
}

impl ProductFilter {
    /// Number of records to skip for the current page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page, newest first.
    pub products: Vec<ProductRecord>,

    /// Total records matching the filter.
    pub total: u64,

    /// The page that was returned.
    pub page: u32,

    /// Total number of pages for the filter.
    pub total_pages: u32,
}

impl ProductPage {
    /// Assemble a page, computing `total_pages` from the filter's limit.
    #[must_use]
    pub fn new(products: Vec<ProductRecord>, total: u64, filter: &ProductFilter) -> Self {
        let limit = u64::from(filter.limit.max(1));
        let total_pages = u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX);
        Self {
            products,
            total,
            page: filter.page,
            total_pages,
        }
    }
}

/// Persistence contract for product batches and their supply chains.
///
/// Written once at registration time; the verification engine only reads.
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Both `batch_code` and `fingerprint` carry unique indexes.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new product record.
    ///
    /// Fails with [`StoreError::Duplicate`] naming the violated field when
    /// the batch code or fingerprint already exists.
    async fn insert_product(&self, product: ProductRecord) -> Result<(), StoreError>;

    /// Fetch a product by fingerprint. Returns `None` when unknown.
    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Fetch a product by batch code. Returns `None` when unknown.
    async fn find_by_batch_code(
        &self,
        batch_code: &str,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Paged catalog listing, newest first, with optional category and
    /// name-search filters.
    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage, StoreError>;

    /// The most recently registered products, up to `limit`.
    async fn featured_products(&self, limit: u32) -> Result<Vec<ProductRecord>, StoreError>;

    /// Delete a product and its supply-chain record.
    /// Returns `true` when the product existed.
    async fn delete_product(&self, batch_code: &str) -> Result<bool, StoreError>;

    /// Persist a supply-chain record for a batch.
    async fn insert_supply_chain(&self, chain: SupplyChainRecord) -> Result<(), StoreError>;

    /// Fetch the supply chain for a batch. Returns `None` when unknown.
    async fn find_supply_chain(
        &self,
        batch_code: &str,
    ) -> Result<Option<SupplyChainRecord>, StoreError>;

    /// Decrement remaining stock for a batch (saturating at zero) and
    /// return the updated record.
    ///
    /// Fails with [`StoreError::NotFound`] when the batch has no chain.
    async fn consume_stock(
        &self,
        batch_code: &str,
        quantity: i64,
    ) -> Result<SupplyChainRecord, StoreError>;
}
