use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use puremeds_core::{NewProduct, ProductRecord};
use puremeds_engine::EngineError;
use puremeds_store::ProductFilter;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{
    DeleteProductResponse, ProductListQuery, ProductListResponse, RegisterProductResponse,
};

/// Number of products returned by the featured endpoint.
const FEATURED_LIMIT: u32 = 3;

/// `POST /v1/products` -- register a new product batch.
///
/// Runs the full registration pipeline: fingerprint derivation, ledger
/// registration, QR artifact rendering, and persistence of the product
/// with its default supply chain.
#[utoipa::path(
    post,
    path = "/v1/products",
    tag = "Products",
    summary = "Register batch",
    description = "Registers a product batch: derives its fingerprint, records it on the ledger, renders the QR artifact, and persists the record.",
    request_body(content = NewProduct, description = "Batch to register"),
    responses(
        (status = 201, description = "Batch registered", body = RegisterProductResponse),
        (status = 400, description = "Invalid batch fields", body = super::schemas::ErrorResponse),
        (status = 409, description = "Batch code or fingerprint already registered", body = super::schemas::ErrorResponse),
        (status = 502, description = "Ledger unreachable", body = super::schemas::ErrorResponse)
    )
)]
pub async fn register_product(
    State(state): State<AppState>,
    Json(new_product): Json<NewProduct>,
) -> Result<impl IntoResponse, ServerError> {
    let registered = state.engine.register_batch(new_product).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterProductResponse {
            product: registered.product,
            tx_reference: registered.receipt.tx_reference,
            block_reference: registered.receipt.block_reference,
        }),
    ))
}

/// `GET /v1/products` -- paged catalog listing with filters.
#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "Products",
    summary = "List products",
    description = "Paged catalog listing, newest first, with optional category and name-search filters.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "One page of products", body = ProductListResponse)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>, ServerError> {
    let filter = ProductFilter {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(15).clamp(1, 100),
        category: query.category.filter(|c| !c.trim().is_empty()),
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let page = state
        .store
        .list_products(&filter)
        .await
        .map_err(EngineError::Store)?;

    Ok(Json(ProductListResponse {
        products: page.products,
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
    }))
}

/// `GET /v1/products/featured` -- the most recently registered products.
#[utoipa::path(
    get,
    path = "/v1/products/featured",
    tag = "Products",
    summary = "Featured products",
    responses(
        (status = 200, description = "Latest products", body = Vec<ProductRecord>)
    )
)]
pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>, ServerError> {
    let products = state
        .store
        .featured_products(FEATURED_LIMIT)
        .await
        .map_err(EngineError::Store)?;
    Ok(Json(products))
}

/// `GET /v1/products/{batch_code}` -- fetch a single product by batch code.
#[utoipa::path(
    get,
    path = "/v1/products/{batch_code}",
    tag = "Products",
    summary = "Get product",
    params(
        ("batch_code" = String, Path, description = "Batch code, e.g. PM-12345")
    ),
    responses(
        (status = 200, description = "The product", body = ProductRecord),
        (status = 404, description = "Unknown batch code", body = super::schemas::ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> Result<Json<ProductRecord>, ServerError> {
    let product = state
        .store
        .find_by_batch_code(&batch_code)
        .await
        .map_err(EngineError::Store)?
        .ok_or_else(|| ServerError::NotFound(format!("product {batch_code}")))?;
    Ok(Json(product))
}

/// `DELETE /v1/products/{batch_code}` -- remove a product and its supply chain.
#[utoipa::path(
    delete,
    path = "/v1/products/{batch_code}",
    tag = "Products",
    summary = "Delete product",
    params(
        ("batch_code" = String, Path, description = "Batch code, e.g. PM-12345")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeleteProductResponse),
        (status = 404, description = "Unknown batch code", body = super::schemas::ErrorResponse)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> Result<Json<DeleteProductResponse>, ServerError> {
    let deleted = state
        .store
        .delete_product(&batch_code)
        .await
        .map_err(EngineError::Store)?;

    if !deleted {
        return Err(ServerError::NotFound(format!("product {batch_code}")));
    }

    Ok(Json(DeleteProductResponse { deleted: true }))
}
