//! HTTP server for the PureMeds verification backend.
//!
//! Thin axum wrappers over the verification engine: upload-and-verify,
//! fingerprint verification, batch registration, catalog queries, and
//! supply-chain lookups. Business decisions live in `puremeds-engine`;
//! this crate only translates between HTTP and engine calls.

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;
