use thiserror::Error;

/// Errors from QR encoding, decoding, and temp-file handling.
///
/// The three decode kinds are deliberately distinct: each corresponds to a
/// different user-facing explanation of why a scanned image could not be
/// verified.
#[derive(Debug, Error)]
pub enum QrError {
    /// No QR symbol could be located or decoded in the image.
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    /// A symbol was decoded but its content is not valid structured data.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Structured data was present but required fields are missing.
    #[error("incomplete payload: {0}")]
    IncompletePayload(String),

    /// QR symbol construction or PNG rendering failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Filesystem failure while spooling or reading an image.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
