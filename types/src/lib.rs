//! Fundamental types for Rollcall.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! timestamps and clocks, key and signature newtypes, 32-byte digests, queue item ids,
//! and the tunable verification / submission parameters.

pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod time;

pub use error::TypeError;
pub use hash::{ClaimDigest, EnvelopeHash, ItemId, NonceDigest, ZoneDigest};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::{FailedRetention, SubmissionParams, VerificationParams};
pub use time::{Clock, SystemClock, Timestamp};
