//! Paywarden error types.

use std::fmt;
use thiserror::Error;

/// Fatal errors raised while building the authorizer configuration.
///
/// None of these can occur once a [`crate::RequestAuthorizer`] exists; a
/// process that sees one must not start serving requests.
#[derive(Debug, Error)]
pub enum PaywallError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A verification key could not be decoded.
    #[error("Invalid key material for kid {kid:?}: {reason}")]
    KeyMaterial {
        /// Key identifier of the offending entry.
        kid: String,
        /// Why the material was rejected.
        reason: String,
    },
}

/// Errors produced while splitting and decoding a compact token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Token is not three non-empty dot-separated segments.
    #[error("Token must have exactly three non-empty segments")]
    MalformedStructure,

    /// Header segment failed to decode or lacks a key id.
    #[error("Invalid token header: {0}")]
    InvalidHeader(String),

    /// Claims segment failed to decode.
    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),
}

/// Why a request was rejected.
///
/// Internal diagnostics only. Every variant produces the same response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No `jwt=` cookie was present.
    MissingToken,
    /// Several `jwt=` cookies carried different values.
    ConflictingTokens,
    /// The token could not be parsed.
    MalformedToken,
    /// Unknown key id or bad signature.
    InvalidSignature,
    /// The token's `exp` has passed.
    Expired,
}

impl RejectReason {
    /// Stable lowercase label for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingToken => "missing_token",
            RejectReason::ConflictingTokens => "conflicting_tokens",
            RejectReason::MalformedToken => "malformed_token",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::Expired => "expired",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ParseError> for RejectReason {
    fn from(_: ParseError) -> Self {
        RejectReason::MalformedToken
    }
}
