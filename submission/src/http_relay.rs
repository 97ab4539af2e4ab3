//! JSON-over-HTTP ledger relay.
//!
//! Wire contract:
//!
//! - `POST {base}/transactions` with the envelope as the JSON body. Success
//!   is `200 {"tx_id": "..."}`. A 4xx answer is a rejection:
//!   `{"error": "...", "signature_expired": bool}`. Anything 5xx is a server
//!   error and retryable.
//! - `GET {base}/transactions/{tx_id}` answers
//!   `{"status": "finalized" | "pending" | "dropped"}`.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::envelope::TransactionEnvelope;
use crate::relay::{Finalization, LedgerRelay, RelayError};

/// HTTP client for the ledger relay service.
#[derive(Clone)]
pub struct HttpRelay {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: Finalization,
}

#[derive(Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    signature_expired: bool,
}

impl HttpRelay {
    /// Create a relay client for `base_url` (e.g. `https://relay.example.org/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| RelayError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_error(response: reqwest::Response) -> RelayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_status(status, &body)
    }
}

/// Turn a non-success HTTP answer into a relay error.
fn classify_status(status: StatusCode, body: &str) -> RelayError {
    if status.is_client_error() {
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
        let reason = if parsed.error.is_empty() {
            format!("HTTP {status}")
        } else {
            parsed.error
        };
        RelayError::Rejected {
            reason,
            signature_expired: parsed.signature_expired,
        }
    } else {
        RelayError::ServerError(format!("HTTP {status}"))
    }
}

fn transport_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Unavailable(e.to_string())
    }
}

impl LedgerRelay for HttpRelay {
    async fn submit(&self, envelope: &TransactionEnvelope) -> Result<String, RelayError> {
        let response = self
            .http
            .post(format!("{}/transactions", self.base_url))
            .json(envelope)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RelayError::ServerError(format!("invalid submit response: {e}")))?;
        Ok(parsed.tx_id)
    }

    async fn finalization(&self, tx_id: &str) -> Result<Finalization, RelayError> {
        let response = self
            .http
            .get(format!("{}/transactions/{tx_id}", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Finalization::Unknown);
        }
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| RelayError::ServerError(format!("invalid status response: {e}")))?;
        Ok(parsed.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_rejections() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"signature expired","signature_expired":true}"#,
        );
        assert_eq!(
            err,
            RelayError::Rejected {
                reason: "signature expired".into(),
                signature_expired: true
            }
        );
    }

    #[test]
    fn rejection_without_body_uses_status() {
        let err = classify_status(StatusCode::CONFLICT, "");
        assert!(matches!(
            err,
            RelayError::Rejected { ref reason, signature_expired: false } if reason.contains("409")
        ));
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = classify_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.classify().is_retryable());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let relay = HttpRelay::new("http://127.0.0.1:9/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(relay.base_url(), "http://127.0.0.1:9/v1");
    }

    #[tokio::test]
    async fn unreachable_relay_is_retryable() {
        // Port 9 (discard) is closed on test machines.
        let relay = HttpRelay::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = relay.finalization("tx").await.unwrap_err();
        assert!(err.classify().is_retryable());
    }
}
