//! Tunable parameters for claim verification and transaction submission.
//!
//! Both structs deserialize from partial TOML: every missing field falls back
//! to its default.

use serde::{Deserialize, Serialize};

/// Bounds applied while verifying a scanned claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationParams {
    /// Maximum accepted size of the raw scanned payload, in bytes.
    pub max_payload_bytes: usize,

    /// Maximum age of a claim measured from `issued_at`, independent of its
    /// own expiry. Bounds exposure from long-window claims scanned late.
    pub max_claim_age_secs: u64,

    /// Minimum nonce length, in bytes.
    pub min_nonce_len: usize,

    /// How long to wait for a coarse location fix before treating location as denied.
    pub location_timeout_ms: u64,

    /// Capacity of the nonce ledger before oldest-first eviction kicks in.
    pub nonce_capacity: usize,
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            max_payload_bytes: 4096,
            max_claim_age_secs: 3600,
            min_nonce_len: 2,
            location_timeout_ms: 10_000,
            nonce_capacity: 100_000,
        }
    }
}

/// What happens to queue items that exhausted their automatic retries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedRetention {
    /// Keep failed items until they are retried or discarded by hand.
    #[default]
    Keep,
    /// Drop failed items once they have been failed for this many seconds.
    ExpireAfterSecs(u64),
}

/// Backoff and lifecycle parameters for the submission worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionParams {
    /// Delay before the first retry, in milliseconds.
    pub backoff_base_ms: u64,

    /// Upper bound on any single retry delay, in milliseconds.
    pub backoff_max_ms: u64,

    /// Consecutive failed attempts before an item is marked failed.
    pub max_attempts: u32,

    /// Timeout applied to each relay call, in milliseconds.
    pub submit_timeout_ms: u64,

    /// How often the worker wakes up to drain due items, in milliseconds.
    pub poll_interval_ms: u64,

    /// How long a freshly signed envelope stays valid, in seconds.
    pub envelope_validity_secs: u64,

    /// How long after submission a transaction the relay has no record of is
    /// still awaited before it counts as dropped, in seconds.
    pub unknown_tx_grace_secs: u64,

    /// Retention policy for items that exhausted their retries.
    pub failed_retention: FailedRetention,
}

impl Default for SubmissionParams {
    fn default() -> Self {
        Self {
            backoff_base_ms: 1_000,
            backoff_max_ms: 300_000,
            max_attempts: 8,
            submit_timeout_ms: 15_000,
            poll_interval_ms: 2_000,
            envelope_validity_secs: 3_600,
            unknown_tx_grace_secs: 60,
            failed_retention: FailedRetention::Keep,
        }
    }
}
