//! Validity window and replay checks.

use rollcall_claims::Claim;
use rollcall_store::{NonceStore, StoreError};
use rollcall_types::Timestamp;

use crate::{FreshnessStatus, NonceLedger, ReplayStatus};

/// Whether `now` lies inside the claim's window and its maximum age.
///
/// Both window edges are inclusive.
pub fn check_window(claim: &Claim, now: Timestamp, max_age_secs: u64) -> FreshnessStatus {
    if now < claim.issued_at {
        FreshnessStatus::NotStarted
    } else if now > claim.expires_at || claim.issued_at.elapsed_since(now) > max_age_secs {
        FreshnessStatus::Expired
    } else {
        FreshnessStatus::Valid
    }
}

/// Tentative replay check against the ledger. Nothing is recorded.
pub fn check_replay<S: NonceStore>(
    claim: &Claim,
    ledger: &NonceLedger<S>,
) -> Result<ReplayStatus, StoreError> {
    if ledger.contains(&claim.nonce_digest())? {
        Ok(ReplayStatus::Duplicate)
    } else {
        Ok(ReplayStatus::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_nullables::{ClaimIssuer, NullNonceStore};
    use std::sync::Arc;

    const T: u64 = 1_700_000_000;

    fn claim(iat: u64, exp: u64) -> Claim {
        ClaimIssuer::new(1).claim("n1", iat, exp, &["dr5ru"], 0)
    }

    #[test]
    fn inside_window() {
        let c = claim(T, T + 900);
        assert_eq!(check_window(&c, Timestamp::new(T + 10), 3600), FreshnessStatus::Valid);
        assert_eq!(check_window(&c, Timestamp::new(T), 3600), FreshnessStatus::Valid);
        assert_eq!(check_window(&c, Timestamp::new(T + 900), 3600), FreshnessStatus::Valid);
    }

    #[test]
    fn before_issue_is_not_started() {
        let c = claim(T, T + 900);
        assert_eq!(
            check_window(&c, Timestamp::new(T - 1), 3600),
            FreshnessStatus::NotStarted
        );
    }

    #[test]
    fn after_expiry_is_expired() {
        let c = claim(T, T + 900);
        assert_eq!(
            check_window(&c, Timestamp::new(T + 901), 3600),
            FreshnessStatus::Expired
        );
    }

    #[test]
    fn long_window_scanned_late_is_expired() {
        let c = claim(T, T + 86_400);
        assert_eq!(
            check_window(&c, Timestamp::new(T + 3601), 3600),
            FreshnessStatus::Expired
        );
        assert_eq!(check_window(&c, Timestamp::new(T + 3600), 3600), FreshnessStatus::Valid);
    }

    #[test]
    fn replay_reflects_ledger() {
        let ledger = NonceLedger::open(Arc::new(NullNonceStore::new()), 8).unwrap();
        let c = claim(T, T + 900);
        assert_eq!(check_replay(&c, &ledger), Ok(ReplayStatus::Clear));
        ledger.commit(&c.nonce_digest(), Timestamp::new(T)).unwrap();
        assert_eq!(check_replay(&c, &ledger), Ok(ReplayStatus::Duplicate));
    }
}
