//! Zone privacy hashing.
//!
//! Raw geocell codes identify a physical place. Whenever a zone value leaves
//! the verification step (persisted in the submission queue, embedded in a
//! transaction envelope, written to a log) it is replaced by this one-way digest.

use rollcall_types::ZoneDigest;

use crate::hash::blake2b_256_multi;

const ZONE_DOMAIN: &[u8] = b"rollcall/zone/v1";

/// Derive the fixed-length, preimage-resistant digest of a geocell code.
pub fn zone_digest(code: &str) -> ZoneDigest {
    ZoneDigest::new(blake2b_256_multi(&[ZONE_DOMAIN, code.as_bytes()]))
}
