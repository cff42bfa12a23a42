//! Cryptographic primitives for token verification.

pub mod freshness;
pub mod keys;
pub mod verify;
