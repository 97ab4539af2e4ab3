//! 32-byte digest types.
//!
//! Each digest gets its own newtype so a zone digest can never be passed where
//! a claim digest is expected. All of them are Blake2b-256 outputs computed in
//! `rollcall-crypto`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypeError;

macro_rules! digest_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                let mut out = [0u8; 32];
                if s.len() != 64 {
                    return Err(TypeError::InvalidLength {
                        expected: 32,
                        actual: s.len() / 2,
                    });
                }
                hex::decode_to_slice(s, &mut out)?;
                Ok(Self(out))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }
    };
}

digest_type!(
    /// Digest of a claim's canonical signed message.
    ClaimDigest
);

digest_type!(
    /// Privacy-preserving digest of a geocell code.
    ZoneDigest
);

digest_type!(
    /// Digest of a claim nonce, as stored in the nonce ledger.
    NonceDigest
);

digest_type!(
    /// Digest of a signed transaction envelope.
    EnvelopeHash
);

digest_type!(
    /// Stable identifier of a submission queue item.
    ///
    /// Derived from the originating claim's digest, so one claim can occupy at
    /// most one queue slot.
    ItemId
);

impl From<ClaimDigest> for ItemId {
    fn from(digest: ClaimDigest) -> Self {
        ItemId(digest.0)
    }
}
