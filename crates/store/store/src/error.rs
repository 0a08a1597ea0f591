use thiserror::Error;

/// Errors from product store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate value for unique field {field}")]
    Duplicate {
        /// The unique field that was violated (`batch_code` or `fingerprint`).
        field: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}
