pub mod batch;
pub mod error;
pub mod fingerprint;
pub mod payload;
pub mod product;
pub mod supply_chain;
pub mod verdict;

pub use batch::BatchIdentity;
pub use error::CoreError;
pub use fingerprint::{Fingerprint, derive_fingerprint, parse_expiry};
pub use payload::QrPayload;
pub use product::{NewProduct, ProductRecord, ProductSummary};
pub use supply_chain::{CustodyEntry, SupplyChainRecord};
pub use verdict::{LedgerCheck, LedgerRecord, VerificationVerdict};
