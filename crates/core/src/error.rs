use thiserror::Error;

/// Errors produced by the core domain layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field is missing, empty, or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A digest string is not a well-formed fingerprint.
    #[error("malformed hash: {0}")]
    MalformedHash(String),
}
