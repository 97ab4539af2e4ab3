//! Claim data model.

use serde::{Deserialize, Serialize};

use rollcall_crypto::{hash_claim_message, hash_nonce, zone_digest};
use rollcall_geo::GeocellCode;
use rollcall_types::{ClaimDigest, NonceDigest, Timestamp, ZoneDigest};

use crate::canonical;

/// The only claim format version this build understands.
pub const CLAIM_VERSION: u16 = 1;

/// Upper bound on the number of allowed cells in a zone.
pub const MAX_ZONE_CELLS: usize = 16;

/// Where a claim may be redeemed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDescriptor {
    /// Allowed geocells. Codes may differ in precision.
    pub cells: Vec<GeocellCode>,
    /// Number of trailing symbols ignored when comparing an observed cell.
    pub tolerance: u8,
}

impl ZoneDescriptor {
    /// Length of the longest allowed cell, or 0 for an empty zone.
    pub fn max_precision(&self) -> usize {
        self.cells.iter().map(GeocellCode::precision).max().unwrap_or(0)
    }

    /// Length of the shortest allowed cell, or 0 for an empty zone.
    pub fn min_precision(&self) -> usize {
        self.cells.iter().map(GeocellCode::precision).min().unwrap_or(0)
    }

    /// One-way digests of every allowed cell, in declaration order.
    pub fn digests(&self) -> Vec<ZoneDigest> {
        self.cells.iter().map(|c| zone_digest(c.as_str())).collect()
    }
}

/// A scanned attendance claim.
///
/// The issuer key and the signature stay in their hex wire form here. They are
/// decoded by the signature verifier, which is the only place that needs the
/// raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub version: u16,
    /// Issuer public key, 64 lowercase hex characters.
    pub issuer: String,
    pub event_id: String,
    pub nonce: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub zone: ZoneDescriptor,
    /// Detached Ed25519 signature over [`Claim::signing_message`], 128 hex characters.
    pub signature: String,
}

impl Claim {
    /// The exact bytes the issuer signed.
    pub fn signing_message(&self) -> Vec<u8> {
        canonical::signing_message(self)
    }

    /// Stable reference to this claim: the hash of its signed content.
    pub fn digest(&self) -> ClaimDigest {
        hash_claim_message(&self.signing_message())
    }

    pub fn nonce_digest(&self) -> NonceDigest {
        hash_nonce(&self.nonce)
    }

    /// Serialize into the JSON wire form accepted by [`crate::parse_claim`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(cells: &[&str]) -> ZoneDescriptor {
        ZoneDescriptor {
            cells: cells.iter().map(|c| GeocellCode::parse(c).unwrap()).collect(),
            tolerance: 0,
        }
    }

    #[test]
    fn precision_bounds() {
        let z = zone(&["dr5", "dr5ru6j", "dr5ru"]);
        assert_eq!(z.min_precision(), 3);
        assert_eq!(z.max_precision(), 7);
        assert_eq!(zone(&[]).max_precision(), 0);
    }

    #[test]
    fn zone_digests_follow_cells() {
        let z = zone(&["dr5ru", "dr5rv"]);
        let digests = z.digests();
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[0], zone_digest("dr5ru"));
        assert_ne!(digests[0], digests[1]);
    }

    #[test]
    fn digest_ignores_signature() {
        let mut claim = Claim {
            version: CLAIM_VERSION,
            issuer: "ab".repeat(32),
            event_id: "evt".into(),
            nonce: "n1".into(),
            issued_at: Timestamp::new(10),
            expires_at: Timestamp::new(20),
            zone: zone(&["dr5ru"]),
            signature: "00".repeat(64),
        };
        let before = claim.digest();
        claim.signature = "11".repeat(64);
        assert_eq!(claim.digest(), before);
        claim.nonce = "n2".into();
        assert_ne!(claim.digest(), before);
    }

    #[test]
    fn wire_form_uses_plain_numbers_and_strings() {
        let claim = Claim {
            version: 1,
            issuer: "ab".repeat(32),
            event_id: "evt".into(),
            nonce: "n1".into(),
            issued_at: Timestamp::new(10),
            expires_at: Timestamp::new(20),
            zone: zone(&["dr5ru"]),
            signature: "00".repeat(64),
        };
        let json: serde_json::Value = serde_json::from_str(&claim.to_json().unwrap()).unwrap();
        assert_eq!(json["issued_at"], 10);
        assert_eq!(json["zone"]["cells"][0], "dr5ru");
        assert_eq!(json["zone"]["tolerance"], 0);
    }
}
