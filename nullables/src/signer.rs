//! Nullable signer: deterministic device identity.

use rollcall_crypto::{keypair_from_seed, sign_message};
use rollcall_submission::{SignError, TransactionSigner, UnsignedEnvelope};
use rollcall_types::{KeyPair, PublicKey, Signature};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A signer with a fixed key that can be told to decline.
pub struct NullSigner {
    keypair: KeyPair,
    cancel: AtomicBool,
    signed: AtomicUsize,
}

impl NullSigner {
    pub fn new(seed: u8) -> Self {
        Self {
            keypair: keypair_from_seed(&[seed; 32]),
            cancel: AtomicBool::new(false),
            signed: AtomicUsize::new(0),
        }
    }

    /// Simulate the user dismissing the signing prompt.
    pub fn cancel_next(&self, cancel: bool) {
        self.cancel.store(cancel, Ordering::SeqCst);
    }

    /// Signatures produced so far.
    pub fn signed(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

impl TransactionSigner for NullSigner {
    fn public_key(&self) -> PublicKey {
        self.keypair.public.clone()
    }

    async fn sign(&self, envelope: &UnsignedEnvelope) -> Result<Signature, SignError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(SignError::Cancelled);
        }
        let bytes = envelope.signing_bytes()?;
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(sign_message(&bytes, &self.keypair.private))
    }
}
