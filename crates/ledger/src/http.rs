use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use puremeds_core::{Fingerprint, LedgerRecord};

use crate::client::{LedgerClient, LedgerReceipt};
use crate::error::LedgerError;

/// Configuration for the HTTP registry gateway client.
///
/// The gateway fronts the actual tamper-evident ledger (a smart-contract
/// registry in the reference deployment); this client only speaks JSON to
/// it. Endpoint, credentials, and contract reference are supplied here and
/// never read from ambient globals.
#[derive(Debug, Clone)]
pub struct HttpLedgerConfig {
    /// Base URL of the registry gateway, e.g. `http://127.0.0.1:8545`.
    pub endpoint: String,

    /// Optional API key sent as `x-api-key`.
    pub api_key: Option<String>,

    /// Optional contract reference sent as `x-contract-address`.
    pub contract_address: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpLedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_owned(),
            api_key: None,
            contract_address: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(rename = "txHash")]
    tx_hash: String,
    #[serde(rename = "blockNumber")]
    block_number: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "isValid")]
    is_valid: bool,
    #[serde(rename = "batchId", default)]
    batch_id: String,
    #[serde(rename = "registeredAt", default)]
    registered_at: Option<String>,
}

/// Ledger client that talks JSON over HTTP to a registry gateway.
///
/// Constructed once at process start and shared behind
/// `Arc<dyn DynLedgerClient>`; construction validates configuration so
/// that setup failures surface at startup rather than on first use.
#[derive(Debug)]
pub struct HttpLedgerClient {
    config: HttpLedgerConfig,
    client: Client,
}

impl HttpLedgerClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] when the endpoint is empty
    /// or the underlying HTTP client cannot be built.
    pub fn new(config: HttpLedgerConfig) -> Result<Self, LedgerError> {
        if config.endpoint.trim().is_empty() {
            return Err(LedgerError::Configuration(
                "ledger endpoint is required".into(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::Configuration(format!("http client: {e}")))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.endpoint.trim_end_matches('/'))
    }

    fn apply_headers(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }
        if let Some(contract) = &self.config.contract_address {
            request = request.header("x-contract-address", contract);
        }
        request
    }

    fn map_transport_error(e: &reqwest::Error) -> LedgerError {
        if e.is_timeout() {
            LedgerError::Unavailable("request timed out".into())
        } else {
            LedgerError::Unavailable(e.to_string())
        }
    }
}

impl LedgerClient for HttpLedgerClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn register(
        &self,
        fingerprint: &Fingerprint,
        batch_code: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let body = serde_json::json!({
            "hash": fingerprint.to_ledger_digest(),
            "batchId": batch_code,
        });

        let response = self
            .apply_headers(self.client.post(self.url("register")).json(&body))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        match response.status() {
            StatusCode::CONFLICT => Err(LedgerError::AlreadyRegistered),
            status if status.is_success() => {
                let parsed: RegisterResponse = response
                    .json()
                    .await
                    .map_err(|e| LedgerError::Malformed(e.to_string()))?;
                debug!(batch_code, tx = %parsed.tx_hash, "registered on ledger");
                Ok(LedgerReceipt {
                    tx_reference: parsed.tx_hash,
                    block_reference: parsed.block_number.to_string(),
                })
            }
            status => {
                warn!(%status, "ledger register rejected");
                Err(LedgerError::Unavailable(format!(
                    "unexpected status {status}"
                )))
            }
        }
    }

    async fn query(&self, fingerprint: &Fingerprint) -> Result<LedgerRecord, LedgerError> {
        let url = self.url(&format!("verify/{}", fingerprint.to_ledger_digest()));

        let response = self
            .apply_headers(self.client.get(url))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Unavailable(format!(
                "unexpected status {status}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;

        let registered_at = parsed
            .registered_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(LedgerRecord {
            is_valid: parsed.is_valid,
            batch_code: parsed.batch_id,
            registered_at,
        })
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        self.apply_headers(self.client.get(self.url("health")))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_endpoint() {
        let err = HttpLedgerClient::new(HttpLedgerConfig {
            endpoint: "  ".into(),
            ..HttpLedgerConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::Configuration(_)));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = HttpLedgerClient::new(HttpLedgerConfig {
            endpoint: "http://ledger.local/".into(),
            ..HttpLedgerConfig::default()
        })
        .unwrap();
        assert_eq!(client.url("register"), "http://ledger.local/register");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let client = HttpLedgerClient::new(HttpLedgerConfig {
            // Reserved TEST-NET-1 address: nothing listens here.
            endpoint: "http://192.0.2.1:9".into(),
            timeout: Duration::from_millis(200),
            ..HttpLedgerConfig::default()
        })
        .unwrap();

        let fp = Fingerprint::parse(&"cd".repeat(32)).unwrap();
        let err = client.query(&fp).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
