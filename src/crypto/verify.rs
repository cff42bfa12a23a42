//! RS256 signature verification.

use crate::crypto::keys::KeySet;
use crate::protocol::models::TokenHeader;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{crypto, Algorithm, DecodingKey};

/// Decode a wire signature segment and re-encode it for the primitive.
///
/// Strict unpadded base64url only, so a signature has exactly one accepted
/// encoding.
pub fn canonical_signature(signature_segment: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(signature_segment).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(URL_SAFE_NO_PAD.encode(bytes))
}

/// Verify an RS256 signature over `signing_input` with a specific key.
pub fn verify_rs256(signing_input: &[u8], signature_segment: &str, key: &DecodingKey) -> bool {
    let Some(signature) = canonical_signature(signature_segment) else {
        return false;
    };
    crypto::verify(&signature, signing_input, key, Algorithm::RS256).unwrap_or(false)
}

/// Verify a token signature against the key named in its header.
///
/// Never errors: an unknown `kid`, undecodable signature or primitive failure
/// all yield `false`.
pub fn verify_signature(
    signing_input: &[u8],
    signature_segment: &str,
    header: &TokenHeader,
    keys: &KeySet,
) -> bool {
    let Some(key) = keys.get(&header.key_id) else {
        tracing::warn!(kid = %header.key_id, "token signed with unknown key id");
        return false;
    };

    let valid = verify_rs256(signing_input, signature_segment, key);
    if !valid {
        tracing::warn!(kid = %header.key_id, "token signature verification failed");
    }
    valid
}
