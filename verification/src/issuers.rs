//! Trusted issuer registry.

use std::collections::HashMap;

use rollcall_types::{PublicKey, TypeError};

/// Point-in-time set of issuers whose claims are accepted.
///
/// Keyed by the lowercase hex form so a claim's issuer text can be looked up
/// without decoding it first.
#[derive(Clone, Debug, Default)]
pub struct TrustedIssuers {
    keys: HashMap<String, PublicKey>,
}

impl TrustedIssuers {
    pub fn new(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            keys: keys.into_iter().map(|k| (k.to_hex(), k)).collect(),
        }
    }

    /// The key for an issuer reference, if trusted.
    pub fn get(&self, issuer_hex: &str) -> Option<&PublicKey> {
        self.keys.get(issuer_hex)
    }

    pub fn contains(&self, issuer_hex: &str) -> bool {
        self.keys.contains_key(issuer_hex)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Source of the current trusted issuer set.
pub trait IssuerRegistry: Send + Sync {
    fn snapshot(&self) -> TrustedIssuers;
}

/// A fixed issuer set, typically loaded from configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticIssuers {
    trusted: TrustedIssuers,
}

impl StaticIssuers {
    pub fn new(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            trusted: TrustedIssuers::new(keys),
        }
    }

    /// Build from hex-encoded public keys. Upper-case input is accepted.
    pub fn from_hex<S: AsRef<str>>(keys: &[S]) -> Result<Self, TypeError> {
        let keys = keys
            .iter()
            .map(|k| PublicKey::from_hex(k.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(keys))
    }
}

impl IssuerRegistry for StaticIssuers {
    fn snapshot(&self) -> TrustedIssuers {
        self.trusted.clone()
    }
}
