//! Paywarden configuration.

use crate::crypto::keys::{KeyMaterial, KeySet};
use crate::policy::access::ProductMapping;
use crate::PaywallError;
use jsonwebtoken::jwk::JwkSet;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Largest clock-skew tolerance accepted for `exp` (5 minutes).
pub const MAX_EXPIRY_LEEWAY: Duration = Duration::from_secs(5 * 60);

/// Immutable configuration for the request authorizer.
///
/// Built once at startup and shared as `Arc<PaywallConfig>`.
#[derive(Clone)]
pub struct PaywallConfig {
    /// Verification keys indexed by key id.
    pub keys: KeySet,

    /// URL slug to product code mapping.
    pub products: ProductMapping,

    /// Shared secret sent to the origin as `x-api-key`.
    /// SECURITY: Never logged; `Debug` redacts it.
    pub origin_api_key: String,

    /// Clock-skew tolerance added to a token's `exp`.
    pub expiry_leeway: Duration,
}

impl PaywallConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), PaywallError> {
        if self.keys.is_empty() {
            return Err(PaywallError::ConfigError(
                "keys cannot be empty".to_string(),
            ));
        }
        if self.products.is_empty() {
            return Err(PaywallError::ConfigError(
                "product mapping cannot be empty".to_string(),
            ));
        }
        if self.origin_api_key.trim().is_empty() {
            return Err(PaywallError::ConfigError(
                "origin_api_key cannot be empty".to_string(),
            ));
        }
        if self.expiry_leeway > MAX_EXPIRY_LEEWAY {
            return Err(PaywallError::ConfigError(format!(
                "expiry_leeway must be at most {}s, got {}s",
                MAX_EXPIRY_LEEWAY.as_secs(),
                self.expiry_leeway.as_secs()
            )));
        }
        Ok(())
    }

    /// Build and validate a configuration from a parsed snapshot.
    pub fn from_snapshot(snapshot: ConfigSnapshot) -> Result<Self, PaywallError> {
        let keys = match snapshot.keys {
            KeysSnapshot::Jwks(set) => KeySet::from_jwk_set(&set)?,
            KeysSnapshot::Map(map) => KeySet::load(map)?,
        };

        let config = Self {
            keys,
            products: ProductMapping::new(snapshot.products)?,
            origin_api_key: snapshot.origin_api_key,
            expiry_leeway: Duration::from_secs(snapshot.expiry_leeway_seconds),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, PaywallError> {
        let snapshot: ConfigSnapshot = serde_json::from_str(json)
            .map_err(|e| PaywallError::ConfigError(format!("Invalid config JSON: {}", e)))?;
        Self::from_snapshot(snapshot)
    }

    /// Build a configuration from a JSON snapshot on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PaywallError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PaywallError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl fmt::Debug for PaywallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaywallConfig")
            .field("keys", &self.keys)
            .field("products", &self.products)
            .field("origin_api_key", &"<redacted>")
            .field("expiry_leeway", &self.expiry_leeway)
            .finish()
    }
}

/// Static configuration blob as supplied at process start.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSnapshot {
    /// Verification keys, as a JWKS document or a kid to material map.
    pub keys: KeysSnapshot,

    /// URL slug to product code.
    pub products: HashMap<String, String>,

    /// Shared secret for the origin.
    pub origin_api_key: String,

    /// Clock-skew tolerance in seconds.
    #[serde(default)]
    pub expiry_leeway_seconds: u64,
}

/// Accepted encodings of the key snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeysSnapshot {
    /// Standard JSON Web Key Set.
    Jwks(JwkSet),
    /// Direct kid to key material mapping.
    Map(HashMap<String, KeyMaterial>),
}
