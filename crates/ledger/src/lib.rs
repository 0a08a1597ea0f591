//! Client for the external append-only batch registry.
//!
//! The registry records `fingerprint -> batch` facts and answers
//! existence/validity queries. It is a remote service with independent
//! failure modes, so this crate exposes it strictly behind a trait: the
//! verification engine never sees transport specifics, and any
//! tamper-evident ledger can substitute for the default HTTP gateway.

pub mod client;
pub mod error;
pub mod memory;

#[cfg(feature = "http")]
pub mod http;

pub use client::{DynLedgerClient, LedgerClient, LedgerReceipt};
pub use error::LedgerError;
pub use memory::MemoryLedger;

#[cfg(feature = "http")]
pub use http::{HttpLedgerClient, HttpLedgerConfig};
