//! Cryptographic primitives for Rollcall.
//!
//! - **Ed25519** for claim signatures and transaction envelope signatures
//! - **Blake2b-256** for claim digests, nonce digests and envelope hashes
//! - **Zone privacy hashing**: a domain-separated one-way digest of geocell codes

pub mod hash;
pub mod keys;
pub mod privacy;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, hash_claim_message, hash_envelope, hash_nonce};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed};
pub use privacy::zone_digest;
pub use sign::{sign_message, verify_signature};
