use puremeds_core::{
    CustodyEntry, NewProduct, ProductRecord, ProductSummary, QrPayload, SupplyChainRecord,
    verdict::{LedgerCheck, VerificationVerdict},
};

use super::schemas::{
    ConsumeStockRequest, DeleteProductResponse, ErrorResponse, HealthResponse, MetricsResponse,
    ProductListResponse, RegisterProductResponse, VerifyFingerprintRequest,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "PureMeds Verification API",
        version = "0.1.0",
        description = "HTTP API for the PureMeds anti-counterfeiting backend. Register product batches, verify medicines by QR image or fingerprint, and inspect supply chains.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Verification", description = "Medicine authenticity verification"),
        (name = "Products", description = "Batch registration and catalog queries"),
        (name = "Supply chain", description = "Custody records per batch")
    ),
    paths(
        super::health::health,
        super::verify::verify_image,
        super::verify::verify_fingerprint,
        super::products::register_product,
        super::products::list_products,
        super::products::featured_products,
        super::products::get_product,
        super::products::delete_product,
        super::supply_chain::get_supply_chain,
        super::supply_chain::consume_stock,
    ),
    components(schemas(
        NewProduct, ProductRecord, ProductSummary, QrPayload,
        SupplyChainRecord, CustodyEntry,
        VerificationVerdict, LedgerCheck,
        HealthResponse, MetricsResponse, ErrorResponse,
        VerifyFingerprintRequest, RegisterProductResponse,
        ProductListResponse, ConsumeStockRequest, DeleteProductResponse,
    ))
)]
pub struct ApiDoc;
