//! # Paywarden
//!
//! **Hardened paywall authorization for edge request filters.**
//!
//! Paywarden runs once per inbound request at the CDN edge. It reads an
//! identity token from the `jwt` cookie, **cryptographically verifies** it
//! with RS256 against a fixed key set, checks expiry, and decides whether
//! the caller subscribes to the product named by the request path.
//!
//! ## Features
//!
//! - **RS256 signature verification**: keys selected by exact `kid` match
//! - **Algorithm pinning**: `none`, HMAC and other algorithms are refused
//! - **Entitlement headers**: `x-is-subscriber` plus the origin shared secret
//! - **Uniform rejection**: every failure yields the same 401 response
//! - **Fail-closed**: unknown keys, bad encodings and missing `exp` reject
//!
//! ## Quickstart
//!
//! ```no_run
//! use paywarden::{Outcome, PaywallConfig, RequestAuthorizer, ResourceRequest};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), paywarden::PaywallError> {
//!     let config = PaywallConfig::from_file("paywall.json")?;
//!     let authorizer = RequestAuthorizer::new(Arc::new(config))?;
//!
//!     let request = ResourceRequest::new("GET", "/product-a/content/123")
//!         .with_cookie("jwt=eyJraWQiOi...");
//!
//!     match authorizer.authorize(request) {
//!         Outcome::Forward(request) => println!("forward: {:?}", request.headers),
//!         Outcome::Respond(response) => println!("reject: {}", response.status),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Paywarden protects against:
//! - **Forged tokens**: signatures are checked before any claim is trusted
//! - **Key confusion**: a missing `kid` never falls back to another key
//! - **Header spoofing**: trust headers overwrite client-supplied values
//! - **Oracle probing**: rejection causes are logged, never returned
//!
//! Token issuance and key rotation are the identity provider's job.
//!
//! ## Configuration
//!
//! - `keys`: a JWKS document or a `kid` to key material map
//! - `products`: URL slug to subscription product code
//! - `origin_api_key`: shared secret forwarded as `x-api-key`
//!
//! See [`PaywallConfig`] for full documentation.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Token wire format
pub mod protocol;

// Request/response abstraction
pub mod http;

// Policy layer
pub mod policy;

// Authorizer (main public API)
pub mod authorizer;

// Re-exports for public API
pub use authorizer::{Decision, Outcome, RequestAuthorizer};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigSnapshot, PaywallConfig};
pub use crypto::keys::{KeyMaterial, KeySet};
pub use errors::{ParseError, PaywallError, RejectReason};
pub use http::{EdgeRequest, EdgeResponse, ResourceRequest};
pub use policy::access::ProductMapping;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
