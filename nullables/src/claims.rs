//! A stand-in event organizer that issues signed claims.

use rollcall_claims::{Claim, ZoneDescriptor, CLAIM_VERSION};
use rollcall_crypto::{keypair_from_seed, sign_message};
use rollcall_geo::GeocellCode;
use rollcall_types::{KeyPair, PublicKey, Timestamp};

pub struct ClaimIssuer {
    keypair: KeyPair,
}

impl ClaimIssuer {
    pub fn new(seed: u8) -> Self {
        Self {
            keypair: keypair_from_seed(&[seed; 32]),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public.clone()
    }

    /// A signed claim for `event-1`.
    ///
    /// Panics on an invalid geocell: fixtures are expected to be well formed.
    pub fn claim(
        &self,
        nonce: &str,
        issued_at: u64,
        expires_at: u64,
        cells: &[&str],
        tolerance: u8,
    ) -> Claim {
        let claim = Claim {
            version: CLAIM_VERSION,
            issuer: self.keypair.public.to_hex(),
            event_id: "event-1".into(),
            nonce: nonce.into(),
            issued_at: Timestamp::new(issued_at),
            expires_at: Timestamp::new(expires_at),
            zone: ZoneDescriptor {
                cells: cells
                    .iter()
                    .map(|c| GeocellCode::parse(c).expect("fixture geocell"))
                    .collect(),
                tolerance,
            },
            signature: String::new(),
        };
        self.sign(claim)
    }

    /// (Re-)sign a claim with this issuer's key.
    pub fn sign(&self, mut claim: Claim) -> Claim {
        let signature = sign_message(&claim.signing_message(), &self.keypair.private);
        claim.signature = signature.to_hex();
        claim
    }

    /// The claim in scanned (JSON) form.
    pub fn raw(&self, claim: &Claim) -> String {
        claim.to_json().expect("claims always serialize")
    }
}
