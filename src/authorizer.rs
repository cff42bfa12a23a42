//! Request Authorizer - the per-request entry point of the edge filter.
//!
//! Each inbound request moves through:
//! 1. Method check (only `GET` and `HEAD` are filtered)
//! 2. Token extraction from the `jwt` cookie
//! 3. Token parsing
//! 4. Signature verification against the key set
//! 5. Claims evaluation against the request path
//!
//! and ends either forwarded (possibly with trust headers) or answered with
//! the fixed 401 response.

use crate::clock::{Clock, SystemClock};
use crate::config::PaywallConfig;
use crate::crypto::verify::verify_signature;
use crate::errors::RejectReason;
use crate::http::{EdgeRequest, EdgeResponse};
use crate::policy::access::{evaluate, Evaluation};
use crate::protocol::token::parse;
use crate::PaywallError;
use std::sync::Arc;

/// Cookie carrying the identity token.
pub const TOKEN_COOKIE: &str = "jwt";

/// Header carrying the entitlement result to the cache and origin.
pub const SUBSCRIBER_HEADER: &str = "x-is-subscriber";

/// Header proving to the origin that the request passed this filter.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authorization decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Method is not filtered; forward unchanged.
    Bypass,

    /// Token valid but path outside the paywall; forward unchanged.
    Unmapped,

    /// Token valid for a paywalled product; forward with trust headers.
    Authorized {
        /// Product code the path maps to.
        product_code: String,
        /// Whether the token grants that product.
        is_subscriber: bool,
    },

    /// Request must not be forwarded.
    Rejected(RejectReason),
}

/// Result of applying a decision to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R> {
    /// Forward this request downstream.
    Forward(R),
    /// Return this response to the client.
    Respond(EdgeResponse),
}

impl<R> Outcome<R> {
    /// Whether the request is forwarded.
    pub fn is_forward(&self) -> bool {
        matches!(self, Outcome::Forward(_))
    }
}

/// Stateless per-request authorizer.
///
/// Create one at startup and share it; `authorize` takes `&self` and never
/// blocks.
#[derive(Clone)]
pub struct RequestAuthorizer {
    config: Arc<PaywallConfig>,
    clock: Arc<dyn Clock>,
}

impl RequestAuthorizer {
    /// Create an authorizer using the system clock.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration fails validation.
    pub fn new(config: Arc<PaywallConfig>) -> Result<Self, PaywallError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an authorizer with a custom clock.
    pub fn with_clock(
        config: Arc<PaywallConfig>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PaywallError> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    /// Decide what to do with a request without modifying it.
    pub fn decide<R: EdgeRequest + ?Sized>(&self, request: &R) -> Decision {
        let method = request.method();
        if !is_filtered_method(method) {
            return Decision::Bypass;
        }

        let raw = match extract_token(request) {
            Ok(raw) => raw,
            Err(reason) => return Decision::Rejected(reason),
        };

        let token = match parse(raw) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "token parse failed");
                return Decision::Rejected(e.into());
            }
        };

        if !verify_signature(
            token.signing_input.as_bytes(),
            &token.signature_segment,
            &token.header,
            &self.config.keys,
        ) {
            return Decision::Rejected(RejectReason::InvalidSignature);
        }

        match evaluate(
            &token.claims,
            request.path(),
            &self.config.products,
            self.config.expiry_leeway,
            self.clock.as_ref(),
        ) {
            Evaluation::Rejected(reason) => Decision::Rejected(reason),
            Evaluation::Unmapped => Decision::Unmapped,
            Evaluation::Authorized {
                product_code,
                is_subscriber,
            } => Decision::Authorized {
                product_code,
                is_subscriber,
            },
        }
    }

    /// Authorize a request, returning it (possibly augmented) or a 401.
    pub fn authorize<R: EdgeRequest>(&self, mut request: R) -> Outcome<R> {
        match self.decide(&request) {
            Decision::Bypass | Decision::Unmapped => Outcome::Forward(request),
            Decision::Authorized {
                product_code,
                is_subscriber,
            } => {
                tracing::debug!(
                    product = %product_code,
                    is_subscriber,
                    "request authorized"
                );
                request.set_header(SUBSCRIBER_HEADER, is_subscriber.to_string());
                request.set_header(API_KEY_HEADER, self.config.origin_api_key.clone());
                Outcome::Forward(request)
            }
            Decision::Rejected(reason) => {
                tracing::debug!(
                    reason = %reason,
                    method = request.method(),
                    path = request.path(),
                    "request rejected"
                );
                Outcome::Respond(EdgeResponse::unauthorized())
            }
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PaywallConfig {
        &self.config
    }
}

fn is_filtered_method(method: &str) -> bool {
    method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")
}

/// Find the raw token in the request's `jwt` cookie.
///
/// Several `jwt` cookies are accepted only if they all carry the same value.
/// An empty value counts as absent.
pub fn extract_token<R: EdgeRequest + ?Sized>(request: &R) -> Result<&str, RejectReason> {
    let mut found: Option<&str> = None;
    for (name, value) in request.cookies() {
        if name != TOKEN_COOKIE || value.is_empty() {
            continue;
        }
        match found {
            None => found = Some(value),
            Some(existing) if existing == value => {}
            Some(_) => return Err(RejectReason::ConflictingTokens),
        }
    }
    found.ok_or(RejectReason::MissingToken)
}
