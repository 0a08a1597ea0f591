use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The structured payload embedded in a QR symbol.
///
/// Serialized as JSON with the wire field names `hash`, `batchId`, and
/// `timestamp`. Only `hash` and `batchId` are consumed by verification;
/// the timestamp records when the artifact was generated and is purely
/// informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QrPayload {
    /// The batch fingerprint (64 lowercase hex characters).
    #[serde(rename = "hash")]
    pub fingerprint: String,

    /// The batch code, e.g. `PM-12345`.
    #[serde(rename = "batchId")]
    pub batch_code: String,

    /// When the QR artifact was generated.
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_field_names() {
        let payload = QrPayload {
            fingerprint: "ab".repeat(32),
            batch_code: "PM-12345".into(),
            timestamp: Some(Utc::now()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("hash").is_some());
        assert!(json.get("batchId").is_some());
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn timestamp_is_optional() {
        let payload: QrPayload =
            serde_json::from_str(r#"{"hash":"aa","batchId":"PM-1","timestamp":null}"#).unwrap();
        assert!(payload.timestamp.is_none());
    }
}
