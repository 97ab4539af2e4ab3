//! Exponential retry backoff.

use std::time::Duration;

use rollcall_types::Timestamp;

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt - 1)`,
/// capped at `max_ms`.
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(63);
    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

/// When the next attempt is due. Rounded up to whole seconds, never `now`
/// itself unless the delay is zero.
pub fn next_attempt_at(now: Timestamp, delay: Duration) -> Timestamp {
    let secs = delay.as_millis().div_ceil(1_000);
    now.plus_secs(u64::try_from(secs).unwrap_or(u64::MAX))
}
