//! Ed25519 key material for claim issuers and the device's submission identity.
//!
//! Issuers only ever reach the device as public keys. The only private key a
//! device holds is its own transaction signing key, loaded from a seed.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rollcall_types::{KeyPair, PrivateKey, PublicKey};

/// Fresh random key pair. Used for throwaway identities in tests and benches.
pub fn generate_keypair() -> KeyPair {
    keypair_from_signing_key(SigningKey::generate(&mut OsRng))
}

/// The device signing identity derived from a 32-byte seed.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_signing_key(SigningKey::from_bytes(seed))
}

/// Rebuild the key pair for a stored private key, e.g. one read from a seed file.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = PublicKey(SigningKey::from_bytes(&private.0).verifying_key().to_bytes());
    KeyPair { public, private }
}

fn keypair_from_signing_key(signing_key: SigningKey) -> KeyPair {
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032, section 7.1, test 1.
    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    #[test]
    fn seed_yields_the_published_public_key() {
        let private = PrivateKey::from_hex(SEED).unwrap();
        let kp = keypair_from_seed(&private.0);
        assert_eq!(kp.public.to_hex(), PUBLIC);
    }

    #[test]
    fn stored_private_key_rebuilds_the_same_identity() {
        let kp = keypair_from_private(PrivateKey::from_hex(SEED).unwrap());
        assert_eq!(kp.public, PublicKey::from_hex(PUBLIC).unwrap());
    }

    #[test]
    fn devices_with_different_seeds_sign_as_different_keys() {
        let a = keypair_from_seed(&[1u8; 32]);
        let b = keypair_from_seed(&[2u8; 32]);
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn random_identities_do_not_collide() {
        assert_ne!(generate_keypair().public, generate_keypair().public);
    }
}
