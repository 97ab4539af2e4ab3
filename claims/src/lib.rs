//! Attendance claims.
//!
//! A claim is a signed, time-bounded, location-scoped attestation issued by an
//! event organizer and scanned by the device. This crate owns its data model,
//! the canonical byte encoding the issuer signs, and the schema validator that
//! turns untrusted scanned text into a [`Claim`].

pub mod canonical;
pub mod claim;
pub mod error;
pub mod schema;

pub use canonical::{signing_message, CLAIM_DOMAIN};
pub use claim::{Claim, ZoneDescriptor, CLAIM_VERSION, MAX_ZONE_CELLS};
pub use error::{ClaimError, FieldError, FieldProblem};
pub use schema::parse_claim;
