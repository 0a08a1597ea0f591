use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use puremeds_core::{
    CustodyEntry, Fingerprint, ProductRecord, SupplyChainRecord,
};
use puremeds_store::{ProductFilter, ProductPage, ProductStore, StoreError};

use crate::config::PostgresConfig;
use crate::migrations;

/// PostgreSQL-backed implementation of [`ProductStore`].
///
/// Uses `sqlx::PgPool` for connection pooling. Uniqueness of batch codes
/// and fingerprints is enforced by database constraints; unique-violation
/// errors are translated into [`StoreError::Duplicate`] with the violated
/// field name.
pub struct PostgresProductStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresProductStore {
    /// Create a new `PostgresProductStore` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the required tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if pool creation fails, or
    /// [`StoreError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Create a `PostgresProductStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    fn map_insert_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            let field = if db.constraint().is_some_and(|c| c.contains("fingerprint")) {
                "fingerprint"
            } else {
                "batch_code"
            };
            return StoreError::Duplicate {
                field: field.to_owned(),
            };
        }
        StoreError::Backend(e.to_string())
    }

    fn product_from_row(row: &PgRow) -> Result<ProductRecord, StoreError> {
        let fingerprint: String = row
            .try_get("fingerprint")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let side_effects: serde_json::Value = row
            .try_get("side_effects")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(ProductRecord {
            product_name: Self::column(row, "product_name")?,
            chemical_name: Self::column(row, "chemical_name")?,
            manufacturer: Self::column(row, "manufacturer")?,
            price: Self::column(row, "price")?,
            purpose: Self::column(row, "purpose")?,
            side_effects: serde_json::from_value(side_effects)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            category: Self::column(row, "category")?,
            product_image: Self::column(row, "product_image")?,
            available_stock: Self::column(row, "available_stock")?,
            batch_code: Self::column(row, "batch_code")?,
            expiry_date: Self::column(row, "expiry_date")?,
            fingerprint: Fingerprint::parse(&fingerprint)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            qr_png: Self::column(row, "qr_png")?,
            created_at: Self::column(row, "created_at")?,
            updated_at: Self::column(row, "updated_at")?,
        })
    }

    fn chain_from_row(row: &PgRow) -> Result<SupplyChainRecord, StoreError> {
        let custody: serde_json::Value = row
            .try_get("custody")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let custody: CustodyColumns = serde_json::from_value(custody)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(SupplyChainRecord {
            batch_code: Self::column(row, "batch_code")?,
            manufacturer_name: Self::column(row, "manufacturer_name")?,
            expiry_date: Self::column(row, "expiry_date")?,
            stock_remaining: Self::column(row, "stock_remaining")?,
            raw_material: custody.raw_material,
            manufacturing: custody.manufacturing,
            quality_testing: custody.quality_testing,
            platform: custody.platform,
            customers: custody.customers,
            created_at: Self::column(row, "created_at")?,
            updated_at: Self::column(row, "updated_at")?,
        })
    }

    fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get(name)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

/// Custody stages as stored in the JSONB `custody` column.
#[derive(serde::Serialize, serde::Deserialize)]
struct CustodyColumns {
    raw_material: CustodyEntry,
    manufacturing: CustodyEntry,
    quality_testing: CustodyEntry,
    platform: CustodyEntry,
    customers: CustodyEntry,
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn insert_product(&self, product: ProductRecord) -> Result<(), StoreError> {
        let table = self.config.products_table();
        let side_effects = serde_json::to_value(&product.side_effects)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let query = format!(
            "INSERT INTO {table} (batch_code, fingerprint, product_name, chemical_name, \
             manufacturer, price, purpose, side_effects, category, product_image, \
             available_stock, expiry_date, qr_png, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        );

        sqlx::query(&query)
            .bind(&product.batch_code)
            .bind(product.fingerprint.as_str())
            .bind(&product.product_name)
            .bind(&product.chemical_name)
            .bind(&product.manufacturer)
            .bind(product.price)
            .bind(&product.purpose)
            .bind(&side_effects)
            .bind(&product.category)
            .bind(&product.product_image)
            .bind(product.available_stock)
            .bind(product.expiry_date)
            .bind(&product.qr_png)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(Self::map_insert_error)?;

        Ok(())
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let table = self.config.products_table();
        let query = format!("SELECT * FROM {table} WHERE fingerprint = $1");

        let row = sqlx::query(&query)
            .bind(fingerprint.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.as_ref().map(Self::product_from_row).transpose()
    }

    async fn find_by_batch_code(
        &self,
        batch_code: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let table = self.config.products_table();
        let query = format!("SELECT * FROM {table} WHERE batch_code = $1");

        let row = sqlx::query(&query)
            .bind(batch_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.as_ref().map(Self::product_from_row).transpose()
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage, StoreError> {
        let table = self.config.products_table();

        // ILIKE for the case-insensitive name search; NULL parameters
        // disable their filter.
        let list_query = format!(
            "SELECT * FROM {table} \
             WHERE ($1::TEXT IS NULL OR category = $1) \
               AND ($2::TEXT IS NULL OR product_name ILIKE '%' || $2 || '%') \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        );
        let count_query = format!(
            "SELECT COUNT(*) FROM {table} \
             WHERE ($1::TEXT IS NULL OR category = $1) \
               AND ($2::TEXT IS NULL OR product_name ILIKE '%' || $2 || '%')"
        );

        let offset = i64::try_from(filter.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query(&list_query)
            .bind(&filter.category)
            .bind(&filter.search)
            .bind(i64::from(filter.limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let products = rows
            .iter()
            .map(Self::product_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let (total,): (i64,) = sqlx::query_as(&count_query)
            .bind(&filter.category)
            .bind(&filter.search)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(ProductPage::new(
            products,
            u64::try_from(total).unwrap_or(0),
            filter,
        ))
    }

    async fn featured_products(&self, limit: u32) -> Result<Vec<ProductRecord>, StoreError> {
        let table = self.config.products_table();
        let query = format!("SELECT * FROM {table} ORDER BY created_at DESC LIMIT $1");

        let rows = sqlx::query(&query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter().map(Self::product_from_row).collect()
    }

    async fn delete_product(&self, batch_code: &str) -> Result<bool, StoreError> {
        let products = self.config.products_table();
        let chains = self.config.supply_chains_table();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let delete_chain = format!("DELETE FROM {chains} WHERE batch_code = $1");
        sqlx::query(&delete_chain)
            .bind(batch_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let delete_product = format!("DELETE FROM {products} WHERE batch_code = $1");
        let result = sqlx::query(&delete_product)
            .bind(batch_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_supply_chain(&self, chain: SupplyChainRecord) -> Result<(), StoreError> {
        let table = self.config.supply_chains_table();
        let custody = serde_json::to_value(CustodyColumns {
            raw_material: chain.raw_material,
            manufacturing: chain.manufacturing,
            quality_testing: chain.quality_testing,
            platform: chain.platform,
            customers: chain.customers,
        })
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let query = format!(
            "INSERT INTO {table} (batch_code, manufacturer_name, expiry_date, \
             stock_remaining, custody, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );

        sqlx::query(&query)
            .bind(&chain.batch_code)
            .bind(&chain.manufacturer_name)
            .bind(chain.expiry_date)
            .bind(chain.stock_remaining)
            .bind(&custody)
            .bind(chain.created_at)
            .bind(chain.updated_at)
            .execute(&self.pool)
            .await
            .map_err(Self::map_insert_error)?;

        Ok(())
    }

    async fn find_supply_chain(
        &self,
        batch_code: &str,
    ) -> Result<Option<SupplyChainRecord>, StoreError> {
        let table = self.config.supply_chains_table();
        let query = format!("SELECT * FROM {table} WHERE batch_code = $1");

        let row = sqlx::query(&query)
            .bind(batch_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.as_ref().map(Self::chain_from_row).transpose()
    }

    async fn consume_stock(
        &self,
        batch_code: &str,
        quantity: i64,
    ) -> Result<SupplyChainRecord, StoreError> {
        let table = self.config.supply_chains_table();
        let query = format!(
            "UPDATE {table} \
             SET stock_remaining = GREATEST(stock_remaining - $2, 0), updated_at = NOW() \
             WHERE batch_code = $1 \
             RETURNING *"
        );

        let row = sqlx::query(&query)
            .bind(batch_code)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("supply chain for {batch_code}")))?;

        Self::chain_from_row(&row)
    }
}
