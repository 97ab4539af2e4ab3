//! Two-phase verification.
//!
//! The local phase validates everything the payload alone can tell: schema,
//! signature, freshness window and a tentative replay check. The location
//! phase matches the zone and, only if that passes, commits the nonce. A claim
//! never reaches the location phase unless the local phase passed, so a
//! forged or stale claim never triggers a location request.

use std::sync::Arc;
use std::time::Duration;

use rollcall_claims::{parse_claim, Claim};
use rollcall_geo::{acquire_coarse, LocationOutcome, LocationProvider};
use rollcall_store::NonceStore;
use rollcall_types::{Timestamp, VerificationParams};
use tracing::{debug, info};

use crate::freshness::{check_replay, check_window};
use crate::nonce_ledger::{CommitOutcome, NonceLedger};
use crate::signature::verify_claim_signature;
use crate::verdict::{
    FreshnessStatus, ReplayStatus, SignatureStatus, Verdict, VerdictSink, ZoneStatus,
};
use crate::zone::match_zone;
use crate::{TrustedIssuers, VerificationError};

/// A claim that passed the local phase and waits for a position.
#[derive(Debug)]
pub struct AwaitingLocation {
    claim: Claim,
    verdict: Verdict,
    now: Timestamp,
}

impl AwaitingLocation {
    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }
}

#[derive(Debug)]
pub enum LocalVerdict {
    Rejected(Verdict),
    AwaitingLocation(AwaitingLocation),
}

/// Final result of a full verification.
#[derive(Clone, Debug)]
pub struct Verification {
    pub verdict: Verdict,
    /// The parsed claim, if the payload got past the schema.
    pub claim: Option<Claim>,
}

impl Verification {
    /// The claim, only if it was accepted.
    pub fn accepted_claim(&self) -> Option<&Claim> {
        self.claim.as_ref().filter(|_| self.verdict.is_accepted())
    }
}

pub struct VerificationOrchestrator<S> {
    ledger: Arc<NonceLedger<S>>,
    params: VerificationParams,
}

impl<S: NonceStore> VerificationOrchestrator<S> {
    pub fn new(ledger: Arc<NonceLedger<S>>, params: VerificationParams) -> Self {
        Self { ledger, params }
    }

    pub fn ledger(&self) -> &Arc<NonceLedger<S>> {
        &self.ledger
    }

    pub fn params(&self) -> &VerificationParams {
        &self.params
    }

    /// Run the checks that need nothing but the payload.
    pub fn verify_local(&self, raw: &str, trusted: &TrustedIssuers, now: Timestamp) -> LocalVerdict {
        match self.local_phase(raw, trusted, now, &mut |_| {}) {
            Ok(awaiting) => LocalVerdict::AwaitingLocation(awaiting),
            Err(rejected) => LocalVerdict::Rejected(rejected.verdict),
        }
    }

    /// Match the zone and, on success, commit the nonce.
    pub fn verify_location(&self, awaiting: AwaitingLocation, location: &LocationOutcome) -> Verdict {
        let AwaitingLocation {
            claim,
            mut verdict,
            now,
        } = awaiting;

        verdict.zone = match_zone(location, &claim.zone);
        match verdict.zone {
            ZoneStatus::Valid => {}
            ZoneStatus::Denied => return verdict.reject(VerificationError::LocationDenied),
            _ => return verdict.reject(VerificationError::ZoneMismatch),
        }

        match self.ledger.commit(&claim.nonce_digest(), now) {
            Ok(CommitOutcome::Committed) => {
                verdict.replay = ReplayStatus::Clear;
                info!(claim = %claim.digest(), event = %claim.event_id, "claim accepted");
                verdict
            }
            Ok(CommitOutcome::AlreadyPresent) => {
                verdict.replay = ReplayStatus::Duplicate;
                verdict.reject(VerificationError::ReplayDetected)
            }
            Err(e) => {
                verdict.replay = ReplayStatus::Checking;
                verdict.reject(VerificationError::NonceLedgerUnavailable(e.to_string()))
            }
        }
    }

    /// Run both phases, publishing every intermediate verdict on `updates`.
    ///
    /// Dropping the future cancels a pending location request. A nonce that
    /// was already committed stays committed.
    pub async fn verify<P, U>(
        &self,
        raw: &str,
        trusted: &TrustedIssuers,
        now: Timestamp,
        provider: &P,
        timeout: Duration,
        updates: &U,
    ) -> Verification
    where
        P: LocationProvider,
        U: VerdictSink + ?Sized,
    {
        updates.publish(&Verdict::checking());
        let mut publish = |v: &Verdict| updates.publish(v);

        let awaiting = match self.local_phase(raw, trusted, now, &mut publish) {
            Ok(awaiting) => awaiting,
            Err(rejected) => return rejected,
        };

        let location = acquire_coarse(provider, timeout).await;
        let claim = awaiting.claim.clone();
        let verdict = self.verify_location(awaiting, &location);
        publish(&verdict);
        Verification {
            verdict,
            claim: Some(claim),
        }
    }

    fn local_phase(
        &self,
        raw: &str,
        trusted: &TrustedIssuers,
        now: Timestamp,
        publish: &mut dyn FnMut(&Verdict),
    ) -> Result<AwaitingLocation, Verification> {
        let mut verdict = Verdict::checking();

        let claim = match parse_claim(raw, &self.params) {
            Ok(claim) => claim,
            Err(e) => {
                debug!(error = %e, "claim failed schema validation");
                let verdict = verdict.reject(e.into());
                publish(&verdict);
                return Err(Verification {
                    verdict,
                    claim: None,
                });
            }
        };

        if let Err(e) = verify_claim_signature(&claim, trusted) {
            debug!(claim = %claim.digest(), error = %e, "claim signature rejected");
            verdict.signature = SignatureStatus::Invalid;
            return Err(rejected(verdict, e, &claim, publish));
        }
        verdict.signature = SignatureStatus::Valid;
        publish(&verdict);

        verdict.freshness = check_window(&claim, now, self.params.max_claim_age_secs);
        match verdict.freshness {
            FreshnessStatus::Valid => publish(&verdict),
            FreshnessStatus::NotStarted => {
                let error = VerificationError::NotStarted;
                return Err(rejected(verdict, error, &claim, publish));
            }
            _ => {
                let error = VerificationError::Expired;
                return Err(rejected(verdict, error, &claim, publish));
            }
        }

        match check_replay(&claim, &self.ledger) {
            Ok(ReplayStatus::Duplicate) => {
                debug!(claim = %claim.digest(), "nonce already redeemed");
                verdict.replay = ReplayStatus::Duplicate;
                let error = VerificationError::ReplayDetected;
                return Err(rejected(verdict, error, &claim, publish));
            }
            Ok(status) => verdict.replay = status,
            Err(e) => {
                let error = VerificationError::NonceLedgerUnavailable(e.to_string());
                return Err(rejected(verdict, error, &claim, publish));
            }
        }
        publish(&verdict);

        Ok(AwaitingLocation {
            claim,
            verdict,
            now,
        })
    }
}

fn rejected(
    verdict: Verdict,
    error: VerificationError,
    claim: &Claim,
    publish: &mut dyn FnMut(&Verdict),
) -> Verification {
    let verdict = verdict.reject(error);
    publish(&verdict);
    Verification {
        verdict,
        claim: Some(claim.clone()),
    }
}
