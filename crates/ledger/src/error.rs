use thiserror::Error;

/// Errors from ledger registration and query operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The fingerprint already exists on the ledger.
    #[error("fingerprint already registered on the ledger")]
    AlreadyRegistered,

    /// The ledger could not be reached or did not answer.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The client was constructed with invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The ledger answered with something this client cannot interpret.
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl LedgerError {
    /// Returns `true` for failures that mean "the ledger could not be
    /// consulted" rather than "the ledger said no". Verification treats
    /// these as soft: the verdict is annotated instead of the request
    /// failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Configuration(_))
    }
}
