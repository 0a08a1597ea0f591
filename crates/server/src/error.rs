use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use puremeds_engine::EngineError;
use puremeds_ledger::LedgerError;
use puremeds_qr::QrError;
use puremeds_store::StoreError;

/// Errors that can occur when running the PureMeds server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was malformed (bad upload, missing field, bad digest).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An engine-level error surfaced through the API.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ServerError {
    /// Map this error to an HTTP status.
    ///
    /// Decode and input failures are the caller's fault (4xx); duplicates
    /// conflict (409); a ledger that cannot be reached during registration
    /// is a bad gateway (502). A fingerprint unknown to the store never
    /// reaches this mapping -- that is a 200-class verdict, not an error.
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(engine) => match engine {
                EngineError::Input(_) => StatusCode::BAD_REQUEST,
                EngineError::Qr(qr) => match qr {
                    QrError::UnreadableImage(_)
                    | QrError::MalformedPayload(_)
                    | QrError::IncompletePayload(_) => StatusCode::BAD_REQUEST,
                    QrError::Encode(_) | QrError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                },
                EngineError::Store(store) => match store {
                    StoreError::Duplicate { .. } => StatusCode::CONFLICT,
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                },
                EngineError::Ledger(ledger) => match ledger {
                    LedgerError::AlreadyRegistered => StatusCode::CONFLICT,
                    LedgerError::Unavailable(_) | LedgerError::Configuration(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    LedgerError::Malformed(_) => StatusCode::BAD_GATEWAY,
                },
                EngineError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
