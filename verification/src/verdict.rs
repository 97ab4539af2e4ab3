//! The verification verdict.
//!
//! Each sub-status starts as `Checking`, which means *not determined yet*.
//! A later stage that never ran leaves its sub-status at `Checking`; that is
//! never to be read as a failure.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::VerificationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureStatus {
    #[default]
    Checking,
    Valid,
    Invalid,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreshnessStatus {
    #[default]
    Checking,
    Valid,
    Expired,
    NotStarted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayStatus {
    #[default]
    Checking,
    Clear,
    Duplicate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneStatus {
    #[default]
    Checking,
    Valid,
    Mismatch,
    Denied,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    pub signature: SignatureStatus,
    pub freshness: FreshnessStatus,
    pub replay: ReplayStatus,
    pub zone: ZoneStatus,
    /// The first terminal error, if the claim was rejected.
    pub rejection: Option<VerificationError>,
}

impl Verdict {
    /// Nothing determined yet.
    pub fn checking() -> Self {
        Self::default()
    }

    pub fn is_accepted(&self) -> bool {
        self.rejection.is_none()
            && self.signature == SignatureStatus::Valid
            && self.freshness == FreshnessStatus::Valid
            && self.replay == ReplayStatus::Clear
            && self.zone == ZoneStatus::Valid
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    pub(crate) fn reject(mut self, error: VerificationError) -> Self {
        self.rejection = Some(error);
        self
    }
}

/// Receives every verdict a verification publishes, in order.
pub trait VerdictSink {
    fn publish(&self, verdict: &Verdict);
}

/// Scanners hold the receiving end and always see the latest verdict.
impl VerdictSink for watch::Sender<Verdict> {
    fn publish(&self, verdict: &Verdict) {
        self.send_replace(verdict.clone());
    }
}
