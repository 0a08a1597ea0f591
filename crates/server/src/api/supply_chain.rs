use axum::Json;
use axum::extract::{Path, State};

use puremeds_core::SupplyChainRecord;
use puremeds_engine::EngineError;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ConsumeStockRequest;

/// `GET /v1/supply-chain/{batch_code}` -- custody record for a batch.
#[utoipa::path(
    get,
    path = "/v1/supply-chain/{batch_code}",
    tag = "Supply chain",
    summary = "Get supply chain",
    params(
        ("batch_code" = String, Path, description = "Batch code, e.g. PM-12345")
    ),
    responses(
        (status = 200, description = "The custody record", body = SupplyChainRecord),
        (status = 404, description = "No supply chain for this batch", body = super::schemas::ErrorResponse)
    )
)]
pub async fn get_supply_chain(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> Result<Json<SupplyChainRecord>, ServerError> {
    let chain = state
        .store
        .find_supply_chain(&batch_code)
        .await
        .map_err(EngineError::Store)?
        .ok_or_else(|| ServerError::NotFound(format!("supply chain for {batch_code}")))?;
    Ok(Json(chain))
}

/// `POST /v1/supply-chain/{batch_code}/stock` -- deduct sold units.
///
/// Called when an order is placed; remaining stock saturates at zero.
#[utoipa::path(
    post,
    path = "/v1/supply-chain/{batch_code}/stock",
    tag = "Supply chain",
    summary = "Consume stock",
    params(
        ("batch_code" = String, Path, description = "Batch code, e.g. PM-12345")
    ),
    request_body(content = ConsumeStockRequest, description = "Units to deduct"),
    responses(
        (status = 200, description = "Updated custody record", body = SupplyChainRecord),
        (status = 400, description = "Invalid quantity", body = super::schemas::ErrorResponse),
        (status = 404, description = "No supply chain for this batch", body = super::schemas::ErrorResponse)
    )
)]
pub async fn consume_stock(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
    Json(request): Json<ConsumeStockRequest>,
) -> Result<Json<SupplyChainRecord>, ServerError> {
    if request.quantity <= 0 {
        return Err(ServerError::BadRequest(
            "quantity must be a positive number".into(),
        ));
    }

    let chain = state
        .store
        .consume_stock(&batch_code, request.quantity)
        .await
        .map_err(EngineError::Store)?;
    Ok(Json(chain))
}
