//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the pipeline (clock, storage, location,
//! ledger relay, signer) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including failure injection
//! - Never touch the filesystem or network
//!
//! It also provides [`ClaimIssuer`], a stand-in organizer that signs claims.

pub mod claims;
pub mod clock;
pub mod location;
pub mod relay;
pub mod signer;
pub mod store;

pub use claims::ClaimIssuer;
pub use clock::NullClock;
pub use location::NullLocation;
pub use relay::NullRelay;
pub use signer::NullSigner;
pub use store::{NullNonceStore, NullQueueStore};
