use axum::Json;
use axum::extract::{Multipart, State};
use tracing::debug;

use puremeds_core::VerificationVerdict;
use puremeds_engine::EngineError;
use puremeds_qr::TempImage;

use crate::error::ServerError;

use super::AppState;
use super::schemas::VerifyFingerprintRequest;

/// Multipart field name carrying the uploaded QR image.
const UPLOAD_FIELD: &str = "qr_image";

/// `POST /v1/verify/image` -- verify a medicine from an uploaded QR photo.
///
/// Expects a multipart body with a `qr_image` file field. The upload is
/// spooled to a temporary file that is removed on every exit path. Returns
/// HTTP 200 with a verdict even when the medicine is not recognized; only
/// an unusable upload produces a 400.
#[utoipa::path(
    post,
    path = "/v1/verify/image",
    tag = "Verification",
    summary = "Verify by QR image",
    description = "Decodes an uploaded QR photo (multipart field `qr_image`) and verifies the embedded fingerprint against the store and the ledger. 'Not recognized' is a 200-class verdict, not an error.",
    responses(
        (status = 200, description = "Verification verdict", body = VerificationVerdict),
        (status = 400, description = "Missing upload or undecodable QR image", body = super::schemas::ErrorResponse)
    )
)]
pub async fn verify_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerificationVerdict>, ServerError> {
    let mut upload: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("failed to read upload: {e}")))?;
            upload = Some(bytes.to_vec());
            break;
        }
    }

    let bytes = upload.ok_or_else(|| {
        ServerError::BadRequest(format!("QR code image is required (field `{UPLOAD_FIELD}`)"))
    })?;
    if bytes.is_empty() {
        return Err(ServerError::BadRequest("uploaded image is empty".into()));
    }
    debug!(bytes = bytes.len(), "received QR upload");

    // The guard deletes the spooled file when it drops, whether the
    // request succeeds, fails to decode, or errors downstream.
    let temp = TempImage::spool(&bytes).map_err(EngineError::Qr)?;
    let verdict = state.engine.verify_image(temp.path()).await?;

    Ok(Json(verdict))
}

/// `POST /v1/verify/fingerprint` -- verify a medicine by raw fingerprint.
///
/// Skips QR decode; otherwise identical to image verification.
#[utoipa::path(
    post,
    path = "/v1/verify/fingerprint",
    tag = "Verification",
    summary = "Verify by fingerprint",
    description = "Verifies a raw fingerprint against the store and the ledger. 'Not recognized' is a 200-class verdict, not an error.",
    request_body(content = VerifyFingerprintRequest, description = "Fingerprint to verify"),
    responses(
        (status = 200, description = "Verification verdict", body = VerificationVerdict),
        (status = 400, description = "Malformed fingerprint", body = super::schemas::ErrorResponse)
    )
)]
pub async fn verify_fingerprint(
    State(state): State<AppState>,
    Json(request): Json<VerifyFingerprintRequest>,
) -> Result<Json<VerificationVerdict>, ServerError> {
    if request.fingerprint.trim().is_empty() {
        return Err(ServerError::BadRequest("fingerprint is required".into()));
    }

    let verdict = state.engine.verify_fingerprint(&request.fingerprint).await?;
    Ok(Json(verdict))
}
