//! Blake2b hashing for claims, nonces and envelopes.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use rollcall_types::{ClaimDigest, EnvelopeHash, NonceDigest};

type Blake2b256 = Blake2b<U32>;

const NONCE_DOMAIN: &[u8] = b"rollcall/nonce";

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash a claim's canonical signed message to produce its `ClaimDigest`.
pub fn hash_claim_message(message: &[u8]) -> ClaimDigest {
    ClaimDigest::new(blake2b_256(message))
}

/// Hash a raw nonce for storage in the nonce ledger.
///
/// The digest is issuer-independent: the same nonce from two issuers collides
/// on purpose.
pub fn hash_nonce(nonce: &str) -> NonceDigest {
    NonceDigest::new(blake2b_256_multi(&[NONCE_DOMAIN, nonce.as_bytes()]))
}

/// Hash serialized envelope bytes to produce its `EnvelopeHash`.
pub fn hash_envelope(envelope_bytes: &[u8]) -> EnvelopeHash {
    EnvelopeHash::new(blake2b_256(envelope_bytes))
}
