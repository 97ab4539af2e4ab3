//! Attendance claim verification.
//!
//! A scanned claim passes four independent checks, each reported as its own
//! sub-status of a [`Verdict`]:
//!
//! 1. **Signature**: the issuer is trusted and signed exactly these fields.
//! 2. **Freshness**: `now` lies inside the claim's window and within the
//!    maximum claim age.
//! 3. **Replay**: the nonce has never been accepted before, from any issuer.
//! 4. **Zone**: the device's coarse position falls in an allowed geocell.
//!
//! The [`VerificationOrchestrator`] runs them in two phases. The local phase
//! needs nothing but the payload; the location phase matches the zone and
//! only then commits the nonce, so a claim rejected for being in the wrong
//! place can still be redeemed in the right one.

pub mod error;
pub mod freshness;
pub mod issuers;
pub mod nonce_ledger;
pub mod orchestrator;
pub mod signature;
pub mod verdict;
pub mod zone;

pub use error::VerificationError;
pub use freshness::{check_replay, check_window};
pub use issuers::{IssuerRegistry, StaticIssuers, TrustedIssuers};
pub use nonce_ledger::{CommitOutcome, NonceLedger};
pub use orchestrator::{AwaitingLocation, LocalVerdict, Verification, VerificationOrchestrator};
pub use signature::verify_claim_signature;
pub use verdict::{
    FreshnessStatus, ReplayStatus, SignatureStatus, Verdict, VerdictSink, ZoneStatus,
};
pub use zone::match_zone;
