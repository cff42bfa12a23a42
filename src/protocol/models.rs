//! Decoded token header and claims.

use crate::errors::ParseError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// The only signature algorithm accepted by the filter.
pub const EXPECTED_ALGORITHM: &str = "RS256";

/// Claim carrying the comma-separated subscription codes.
pub const SUBSCRIPTIONS_CLAIM: &str = "custom:subs";

/// Raw header as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
struct RawHeader {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    alg: Option<String>,
}

/// Decoded token header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key id used to select the verification key.
    pub key_id: String,
    /// Signature algorithm. Always RS256 once parsed.
    pub algorithm: String,
}

impl TokenHeader {
    /// Parse a decoded header segment.
    ///
    /// `kid` is required. `alg` is optional but must be RS256 when present.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ParseError> {
        let raw: RawHeader = serde_json::from_slice(bytes)
            .map_err(|e| ParseError::InvalidHeader(format!("not a JSON object: {}", e)))?;

        let key_id = raw
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| ParseError::InvalidHeader("missing kid".to_string()))?;

        let algorithm = raw.alg.unwrap_or_else(|| EXPECTED_ALGORITHM.to_string());
        if algorithm != EXPECTED_ALGORITHM {
            return Err(ParseError::InvalidHeader(format!(
                "unsupported algorithm: {} (expected {})",
                algorithm, EXPECTED_ALGORITHM
            )));
        }

        Ok(Self { key_id, algorithm })
    }
}

/// Decoded token claims the filter cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Expiry as unix seconds.
    pub expiry: i64,

    /// Subscription product codes, in claim order.
    pub subscriptions: Vec<String>,
}

impl Claims {
    /// Parse a decoded claims segment.
    ///
    /// A missing or unreadable subscriptions claim yields an empty list
    /// rather than an error. `exp` is mandatory.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ParseError> {
        let object: Map<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| ParseError::InvalidClaims(format!("not a JSON object: {}", e)))?;

        let expiry = match object.get("exp") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
                .ok_or_else(|| ParseError::InvalidClaims("exp out of range".to_string()))?,
            Some(_) => return Err(ParseError::InvalidClaims("exp is not numeric".to_string())),
            None => return Err(ParseError::InvalidClaims("missing exp".to_string())),
        };

        let subscriptions = parse_subscriptions(object.get(SUBSCRIPTIONS_CLAIM));

        Ok(Self {
            expiry,
            subscriptions,
        })
    }

    /// Whether `code` is one of the subscriptions. Exact match only.
    pub fn has_subscription(&self, code: &str) -> bool {
        self.subscriptions.iter().any(|s| s == code)
    }
}

/// Extract subscription codes from the raw claim value.
///
/// Accepts a comma-separated string or an array of strings; anything else
/// degrades to no subscriptions.
pub fn parse_subscriptions(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => split_codes(s),
        Some(Value::Array(items)) => {
            let codes: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            match codes {
                Some(codes) => codes
                    .into_iter()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect(),
                None => {
                    tracing::debug!("subscriptions array holds non-string entries");
                    Vec::new()
                }
            }
        }
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            tracing::debug!("subscriptions claim has unexpected type");
            Vec::new()
        }
    }
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}
