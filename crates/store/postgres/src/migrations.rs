use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating required tables if they do not exist.
///
/// Both the batch code (primary key) and the fingerprint (unique index)
/// enforce uniqueness at the database layer; registration relies on these
/// constraints rather than read-then-write checks.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let products_table = config.products_table();
    let supply_chains_table = config.supply_chains_table();

    let create_products = format!(
        "CREATE TABLE IF NOT EXISTS {products_table} (
            batch_code TEXT PRIMARY KEY,
            fingerprint TEXT NOT NULL UNIQUE,
            product_name TEXT NOT NULL,
            chemical_name TEXT NOT NULL,
            manufacturer TEXT NOT NULL,
            price DOUBLE PRECISION NOT NULL,
            purpose TEXT NOT NULL,
            side_effects JSONB NOT NULL DEFAULT '[]',
            category TEXT NOT NULL,
            product_image TEXT,
            available_stock BIGINT NOT NULL,
            expiry_date TIMESTAMPTZ NOT NULL,
            qr_png TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )"
    );

    let create_products_category_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}products_category_idx \
         ON {products_table} (category)",
        config.table_prefix
    );

    let create_products_created_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}products_created_at_idx \
         ON {products_table} (created_at DESC)",
        config.table_prefix
    );

    let create_supply_chains = format!(
        "CREATE TABLE IF NOT EXISTS {supply_chains_table} (
            batch_code TEXT PRIMARY KEY,
            manufacturer_name TEXT NOT NULL,
            expiry_date TIMESTAMPTZ NOT NULL,
            stock_remaining BIGINT NOT NULL DEFAULT 0,
            custody JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )"
    );

    sqlx::query(&create_products).execute(pool).await?;
    sqlx::query(&create_products_category_idx)
        .execute(pool)
        .await?;
    sqlx::query(&create_products_created_idx)
        .execute(pool)
        .await?;
    sqlx::query(&create_supply_chains).execute(pool).await?;

    Ok(())
}
