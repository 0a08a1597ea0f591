//! The verification engine: the decision core of the backend.
//!
//! Orchestrates QR decode, local-store lookup, ledger cross-check, and
//! expiry evaluation into a single [`VerificationVerdict`] per request,
//! and assembles the registration pipeline (fingerprint -> ledger -> QR
//! artifact -> store) that makes those verdicts possible later.

pub mod builder;
pub mod engine;
pub mod error;
pub mod metrics;

pub use builder::EngineBuilder;
pub use engine::{RegisteredBatch, VerificationEngine};
pub use error::EngineError;
pub use metrics::{EngineMetrics, MetricsSnapshot};
