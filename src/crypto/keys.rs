//! Verification key store.
//!
//! A [`KeySet`] maps key identifiers to RSA public keys. It is built once at
//! startup and never mutated, so request handlers share it without locking.

use crate::PaywallError;
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet, KeyAlgorithm};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Raw key material for a single key id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeyMaterial {
    /// PEM-encoded RSA public key (PKCS#1 or SubjectPublicKeyInfo).
    Pem(String),
    /// RSA modulus and exponent, base64url without padding.
    Components {
        /// Modulus.
        n: String,
        /// Public exponent.
        e: String,
    },
}

impl KeyMaterial {
    fn decode(&self, kid: &str) -> Result<DecodingKey, PaywallError> {
        let decoded = match self {
            KeyMaterial::Pem(pem) => DecodingKey::from_rsa_pem(pem.as_bytes()),
            KeyMaterial::Components { n, e } => DecodingKey::from_rsa_components(n, e),
        };
        decoded.map_err(|e| PaywallError::KeyMaterial {
            kid: kid.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Immutable set of verification keys indexed by key id.
#[derive(Clone)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Build a key set from a key id to key material mapping.
    ///
    /// # Errors
    /// * `ConfigError` - The mapping is empty or contains an empty key id
    /// * `KeyMaterial` - An entry could not be decoded as an RSA public key
    pub fn load(raw_keys: HashMap<String, KeyMaterial>) -> Result<Self, PaywallError> {
        if raw_keys.is_empty() {
            return Err(PaywallError::ConfigError(
                "key set cannot be empty".to_string(),
            ));
        }

        let mut keys = HashMap::with_capacity(raw_keys.len());
        for (kid, material) in raw_keys {
            if kid.is_empty() {
                return Err(PaywallError::ConfigError(
                    "key id cannot be empty".to_string(),
                ));
            }
            let key = material.decode(&kid).map_err(|e| {
                tracing::warn!(kid = %kid, error = %e, "rejecting verification key");
                e
            })?;
            keys.insert(kid, key);
        }

        tracing::info!(count = keys.len(), "loaded verification keys");
        Ok(Self { keys })
    }

    /// Build a key set from a JSON Web Key Set document.
    ///
    /// Every key must be RSA and carry a `kid`. A declared `alg` other than
    /// RS256 is refused.
    pub fn from_jwks(json: &str) -> Result<Self, PaywallError> {
        let set: JwkSet = serde_json::from_str(json)
            .map_err(|e| PaywallError::ConfigError(format!("Invalid JWKS document: {}", e)))?;
        Self::from_jwk_set(&set)
    }

    /// Build a key set from an already-parsed JWKS.
    pub fn from_jwk_set(set: &JwkSet) -> Result<Self, PaywallError> {
        let mut raw = HashMap::with_capacity(set.keys.len());

        for jwk in &set.keys {
            let kid = jwk.common.key_id.clone().ok_or_else(|| {
                PaywallError::ConfigError("JWKS entry is missing a kid".to_string())
            })?;

            if let Some(alg) = jwk.common.key_algorithm {
                if alg != KeyAlgorithm::RS256 {
                    return Err(PaywallError::KeyMaterial {
                        kid,
                        reason: format!("unsupported algorithm {:?} (expected RS256)", alg),
                    });
                }
            }

            let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
                return Err(PaywallError::KeyMaterial {
                    kid,
                    reason: "not an RSA key".to_string(),
                });
            };

            let material = KeyMaterial::Components {
                n: rsa.n.clone(),
                e: rsa.e.clone(),
            };
            if raw.insert(kid.clone(), material).is_some() {
                return Err(PaywallError::ConfigError(format!(
                    "duplicate kid in JWKS: {}",
                    kid
                )));
            }
        }

        Self::load(raw)
    }

    /// Look up a key by exact key id.
    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys. Never true for a loaded set.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids, sorted.
    pub fn key_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySet")
            .field("key_ids", &self.key_ids())
            .finish()
    }
}
