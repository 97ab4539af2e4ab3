//! Identity / signing collaborator.
//!
//! The core never sees private key material: it hands an [`UnsignedEnvelope`]
//! to a [`TransactionSigner`] and gets a signature back, or `Cancelled` if the
//! user declined.

use std::future::Future;

use thiserror::Error;

use rollcall_crypto::{keypair_from_private, keypair_from_seed, sign_message};
use rollcall_types::{KeyPair, PrivateKey, PublicKey, Signature};

use crate::envelope::{TransactionEnvelope, UnsignedEnvelope};
use crate::EnvelopeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("signing cancelled")]
    Cancelled,

    #[error("signer unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

pub trait TransactionSigner: Send + Sync {
    /// Identity the signatures verify against.
    fn public_key(&self) -> PublicKey;

    fn sign(
        &self,
        envelope: &UnsignedEnvelope,
    ) -> impl Future<Output = Result<Signature, SignError>> + Send;
}

/// Ask `signer` to sign `body` and assemble the envelope.
pub async fn sign_envelope<S: TransactionSigner>(
    signer: &S,
    body: UnsignedEnvelope,
) -> Result<TransactionEnvelope, SignError> {
    let signature = signer.sign(&body).await?;
    Ok(TransactionEnvelope {
        body,
        signer: signer.public_key(),
        signature,
    })
}

/// Signs with a key held in process memory. Used by the daemon, where the
/// device key is loaded from a seed file.
pub struct LocalKeySigner {
    keypair: KeyPair,
}

impl LocalKeySigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(keypair_from_seed(seed))
    }

    pub fn from_private(private: PrivateKey) -> Self {
        Self::new(keypair_from_private(private))
    }
}

impl TransactionSigner for LocalKeySigner {
    fn public_key(&self) -> PublicKey {
        self.keypair.public.clone()
    }

    async fn sign(&self, envelope: &UnsignedEnvelope) -> Result<Signature, SignError> {
        let bytes = envelope.signing_bytes()?;
        Ok(sign_message(&bytes, &self.keypair.private))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_store::ClaimRef;
    use rollcall_types::{ClaimDigest, NonceDigest, Timestamp};

    fn body() -> UnsignedEnvelope {
        let claim = ClaimRef {
            digest: ClaimDigest::new([1; 32]),
            event_id: "evt".into(),
            issuer: "ab".repeat(32),
            nonce: NonceDigest::new([2; 32]),
            zones: vec![],
        };
        UnsignedEnvelope::for_claim(&claim, Timestamp::new(10), 60)
    }

    #[tokio::test]
    async fn local_signer_produces_verifiable_envelope() {
        let signer = LocalKeySigner::from_seed(&[3; 32]);
        let env = sign_envelope(&signer, body()).await.unwrap();
        assert_eq!(env.signer, signer.public_key());
        assert!(env.verify());
    }

    #[test]
    fn seed_file_key_matches_raw_seed() {
        let from_file = LocalKeySigner::from_private(PrivateKey::from_hex(&"03".repeat(32)).unwrap());
        assert_eq!(from_file.public_key(), LocalKeySigner::from_seed(&[3; 32]).public_key());
    }

    struct Declines;

    impl TransactionSigner for Declines {
        fn public_key(&self) -> PublicKey {
            PublicKey([0; 32])
        }

        async fn sign(&self, _envelope: &UnsignedEnvelope) -> Result<Signature, SignError> {
            Err(SignError::Cancelled)
        }
    }

    #[tokio::test]
    async fn cancellation_propagates() {
        assert_eq!(
            sign_envelope(&Declines, body()).await,
            Err(SignError::Cancelled)
        );
    }
}
