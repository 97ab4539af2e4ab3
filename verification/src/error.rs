use rollcall_claims::{ClaimError, FieldError};
use thiserror::Error;

/// Why a claim was rejected. Reported inside the verdict, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("claim has {} invalid field(s)", .0.len())]
    SchemaViolation(Vec<FieldError>),

    #[error("issuer is not trusted")]
    InvalidIssuer,

    #[error("signature does not verify")]
    InvalidSignature,

    #[error("claim is not valid yet")]
    NotStarted,

    #[error("claim has expired")]
    Expired,

    #[error("claim was already redeemed")]
    ReplayDetected,

    #[error("location unavailable or denied")]
    LocationDenied,

    #[error("device is outside the claim's zone")]
    ZoneMismatch,

    #[error("nonce ledger unavailable: {0}")]
    NonceLedgerUnavailable(String),
}

impl VerificationError {
    /// Short stable name, suitable as a metric label.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::SchemaViolation(_) => "schema_violation",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidSignature => "invalid_signature",
            Self::NotStarted => "not_started",
            Self::Expired => "expired",
            Self::ReplayDetected => "replay_detected",
            Self::LocationDenied => "location_denied",
            Self::ZoneMismatch => "zone_mismatch",
            Self::NonceLedgerUnavailable(_) => "nonce_ledger_unavailable",
        }
    }
}

impl From<ClaimError> for VerificationError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::PayloadTooLarge { size, max } => Self::PayloadTooLarge { size, max },
            ClaimError::MalformedPayload(msg) => Self::MalformedPayload(msg),
            ClaimError::SchemaViolation(fields) => Self::SchemaViolation(fields),
        }
    }
}
