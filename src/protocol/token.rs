//! Compact token splitting and decoding.
//!
//! A token is `base64url(header) "." base64url(claims) "." base64url(signature)`.
//! Parsing decodes the first two segments; the signature segment is kept in
//! its wire form and only decoded by the verifier.

use crate::errors::ParseError;
use crate::protocol::models::{Claims, TokenHeader};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// A split and decoded token. Not authoritative until verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    /// Decoded header.
    pub header: TokenHeader,
    /// Decoded claims.
    pub claims: Claims,
    /// `segment1 + "." + segment2`, exactly as received.
    pub signing_input: String,
    /// Third segment, still base64url-encoded.
    pub signature_segment: String,
}

/// Split a compact token into its three parts and decode header and claims.
///
/// # Errors
/// * `MalformedStructure` - Not exactly three non-empty segments
/// * `InvalidHeader` - Header segment undecodable or missing `kid`
/// * `InvalidClaims` - Claims segment undecodable or missing `exp`
pub fn parse(raw: &str) -> Result<ParsedToken, ParseError> {
    let segments: Vec<&str> = raw.split('.').collect();
    let [header_b64, claims_b64, signature_b64] = segments.as_slice() else {
        return Err(ParseError::MalformedStructure);
    };
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ParseError::MalformedStructure);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| ParseError::InvalidHeader(format!("bad base64url: {}", e)))?;
    let header = TokenHeader::from_json(&header_bytes)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|e| ParseError::InvalidClaims(format!("bad base64url: {}", e)))?;
    let claims = Claims::from_json(&claims_bytes)?;

    Ok(ParsedToken {
        header,
        claims,
        signing_input: format!("{}.{}", header_b64, claims_b64),
        signature_segment: (*signature_b64).to_string(),
    })
}
