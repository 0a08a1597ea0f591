use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use puremeds_core::{Fingerprint, QrPayload};

use crate::error::QrError;

/// Pixels per QR module in the rendered PNG.
const MODULE_SCALE: u32 = 8;

/// Quiet-zone width around the symbol, in modules.
const QUIET_ZONE: u32 = 4;

/// Encode a fingerprint + batch code into a PNG QR image.
///
/// The payload is serialized as JSON (`hash`, `batchId`, `timestamp`) and
/// rendered at error-correction level H, the highest tolerance the format
/// offers.
///
/// # Errors
///
/// Returns [`QrError::Encode`] if symbol construction or PNG serialization
/// fails (e.g. the payload exceeds QR capacity at level H).
pub fn encode(fingerprint: &Fingerprint, batch_code: &str) -> Result<Vec<u8>, QrError> {
    let payload = QrPayload {
        fingerprint: fingerprint.as_str().to_owned(),
        batch_code: batch_code.to_owned(),
        timestamp: Some(Utc::now()),
    };
    let text = serde_json::to_string(&payload)
        .map_err(|e| QrError::Encode(format!("payload serialization: {e}")))?;

    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H)
        .map_err(|e| QrError::Encode(format!("symbol construction: {e}")))?;

    let png = rasterize(&code)?;
    debug!(
        batch_code,
        bytes = png.len(),
        modules = code.width(),
        "encoded QR artifact"
    );
    Ok(png)
}

/// Rasterize a QR symbol into PNG bytes with a quiet zone.
fn rasterize(code: &QrCode) -> Result<Vec<u8>, QrError> {
    let modules = code.to_colors();
    let width = u32::try_from(code.width()).map_err(|_| QrError::Encode("symbol too wide".into()))?;
    let side = (width + 2 * QUIET_ZONE) * MODULE_SCALE;

    let img: GrayImage = image::ImageBuffer::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_SCALE).checked_sub(QUIET_ZONE);
        let my = (y / MODULE_SCALE).checked_sub(QUIET_ZONE);
        let dark = match (mx, my) {
            (Some(mx), Some(my)) if mx < width && my < width => {
                modules[(my * width + mx) as usize] == qrcode::Color::Dark
            }
            _ => false,
        };
        if dark { Luma([0u8]) } else { Luma([255u8]) }
    });

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| QrError::Encode(format!("PNG serialization: {e}")))?;
    Ok(bytes)
}

/// Decode a QR payload from raw image bytes (PNG, JPEG, ...).
///
/// # Errors
///
/// - [`QrError::UnreadableImage`]: the bytes are not a decodable image, or
///   no QR symbol could be located/decoded in them.
/// - [`QrError::MalformedPayload`]: the symbol text is not valid JSON.
/// - [`QrError::IncompletePayload`]: the JSON lacks `hash` or `batchId`.
pub fn decode(bytes: &[u8]) -> Result<QrPayload, QrError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| QrError::UnreadableImage(format!("image decode: {e}")))?
        .to_luma8();

    let text = decode_symbol(&img)?;
    parse_payload(&text)
}

/// Decode a QR payload from an image file on disk.
///
/// # Errors
///
/// As [`decode`], plus [`QrError::Io`] when the file cannot be read.
pub fn decode_file(path: &Path) -> Result<QrPayload, QrError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Locate and decode the first QR symbol in a grayscale image.
fn decode_symbol(img: &GrayImage) -> Result<String, QrError> {
    let (width, height) = img.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );

    let grids = prepared.detect_grids();
    let grid = grids
        .first()
        .ok_or_else(|| QrError::UnreadableImage("no QR symbol found".into()))?;

    let (_meta, text) = grid
        .decode()
        .map_err(|e| QrError::UnreadableImage(format!("symbol decode: {e}")))?;
    Ok(text)
}

/// Parse recovered symbol text into a [`QrPayload`].
///
/// Parsed as a generic JSON value first so that "not JSON" and "JSON but
/// missing fields" stay distinguishable.
fn parse_payload(text: &str) -> Result<QrPayload, QrError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| QrError::MalformedPayload(format!("payload is not valid JSON: {e}")))?;

    let fingerprint = value
        .get("hash")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QrError::IncompletePayload("missing field: hash".into()))?;

    let batch_code = value
        .get("batchId")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QrError::IncompletePayload("missing field: batchId".into()))?;

    let timestamp = value
        .get("timestamp")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(QrPayload {
        fingerprint: fingerprint.to_owned(),
        batch_code: batch_code.to_owned(),
        timestamp,
    })
}
