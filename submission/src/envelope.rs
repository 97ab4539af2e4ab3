//! Transaction envelopes.
//!
//! The envelope is what the ledger sees: a privacy-preserving reference to the
//! verified claim (zone digests only), a validity deadline, and the device
//! identity's signature. It is serialized once at signing time and the queue
//! stores those exact bytes; the worker never re-derives or re-signs it.

use serde::{Deserialize, Serialize};

use rollcall_crypto::{hash_envelope, verify_signature};
use rollcall_store::ClaimRef;
use rollcall_types::{ClaimDigest, EnvelopeHash, NonceDigest, PublicKey, Signature, Timestamp, ZoneDigest};

use crate::EnvelopeError;

/// Domain separation tag for envelope signatures.
pub const ENVELOPE_DOMAIN: &[u8] = b"rollcall/envelope/v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEnvelope {
    pub claim: ClaimDigest,
    pub event_id: String,
    pub issuer: String,
    pub nonce: NonceDigest,
    pub zones: Vec<ZoneDigest>,
    pub created_at: Timestamp,
    /// After this instant the signature is no longer accepted by the ledger.
    pub valid_until: Timestamp,
}

impl UnsignedEnvelope {
    pub fn for_claim(claim: &ClaimRef, now: Timestamp, validity_secs: u64) -> Self {
        Self {
            claim: claim.digest,
            event_id: claim.event_id.clone(),
            issuer: claim.issuer.clone(),
            nonce: claim.nonce,
            zones: claim.zones.clone(),
            created_at: now,
            valid_until: now.plus_secs(validity_secs),
        }
    }

    /// Bytes covered by the device signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let body = serde_json::to_vec(self).map_err(|e| EnvelopeError::Encoding(e.to_string()))?;
        let mut out = Vec::with_capacity(ENVELOPE_DOMAIN.len() + body.len());
        out.extend_from_slice(ENVELOPE_DOMAIN);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub body: UnsignedEnvelope,
    pub signer: PublicKey,
    pub signature: Signature,
}

impl TransactionEnvelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|e| EnvelopeError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(|e| EnvelopeError::Decoding(e.to_string()))
    }

    pub fn hash(&self) -> Result<EnvelopeHash, EnvelopeError> {
        Ok(hash_envelope(&self.to_bytes()?))
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.body.valid_until
    }

    /// Check the device signature over the body.
    pub fn verify(&self) -> bool {
        match self.body.signing_bytes() {
            Ok(bytes) => verify_signature(&bytes, &self.signature, &self.signer),
            Err(_) => false,
        }
    }
}
