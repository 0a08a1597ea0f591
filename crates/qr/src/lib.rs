//! QR artifact codec for batch fingerprints.
//!
//! Encoding renders a JSON payload (`hash`, `batchId`, `timestamp`) into a
//! PNG QR symbol at error-correction level H, so printed labels survive
//! partial occlusion, noise, and skew under normal phone-camera conditions.
//! Decoding recovers the payload from a photographed image and classifies
//! failures into distinct, user-reportable kinds.

pub mod codec;
pub mod error;
pub mod temp;

pub use codec::{decode, decode_file, encode};
pub use error::QrError;
pub use temp::TempImage;
