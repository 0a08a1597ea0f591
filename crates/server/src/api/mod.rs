pub mod health;
pub mod openapi;
pub mod products;
pub mod schemas;
pub mod supply_chain;
pub mod verify;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use puremeds_engine::VerificationEngine;
use puremeds_store::ProductStore;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The verification engine.
    pub engine: Arc<VerificationEngine>,
    /// The product store (also reachable through the engine; kept here for
    /// catalog endpoints that bypass verification logic).
    pub store: Arc<dyn ProductStore>,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let max_upload = state.max_upload_bytes;

    let api = Router::new()
        // Health (always public)
        .route("/health", get(health::health))
        // Verification
        .route("/v1/verify/image", post(verify::verify_image))
        .route("/v1/verify/fingerprint", post(verify::verify_fingerprint))
        // Products
        .route(
            "/v1/products",
            get(products::list_products).post(products::register_product),
        )
        .route("/v1/products/featured", get(products::featured_products))
        .route(
            "/v1/products/{batch_code}",
            get(products::get_product).delete(products::delete_product),
        )
        // Supply chain
        .route(
            "/v1/supply-chain/{batch_code}",
            get(supply_chain::get_supply_chain),
        )
        .route(
            "/v1/supply-chain/{batch_code}/stock",
            post(supply_chain::consume_stock),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    api.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
