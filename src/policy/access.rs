//! Entitlement evaluation.
//!
//! This module decides whether verified claims grant access to a path:
//! - Expired tokens are rejected
//! - Paths outside any known product pass through untouched
//! - Otherwise the subscriber flag is exact membership of the product code

use crate::clock::Clock;
use crate::crypto::freshness::check_expiry;
use crate::errors::RejectReason;
use crate::protocol::models::Claims;
use crate::PaywallError;
use std::collections::HashMap;
use std::time::Duration;

/// Static mapping from URL slug to subscription product code.
///
/// Slugs are stored lower-cased; lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductMapping {
    products: HashMap<String, String>,
}

impl ProductMapping {
    /// Build a mapping from `(slug, code)` pairs.
    ///
    /// # Errors
    /// * `ConfigError` - A slug is empty or contains `/`, a code is empty, or
    ///   two slugs collide once lower-cased
    pub fn new<I, S, C>(entries: I) -> Result<Self, PaywallError>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        let mut products = HashMap::new();
        for (slug, code) in entries {
            let slug = slug.into().to_ascii_lowercase();
            let code = code.into();

            if slug.is_empty() || slug.contains('/') {
                return Err(PaywallError::ConfigError(format!(
                    "invalid product slug: {:?}",
                    slug
                )));
            }
            if code.is_empty() {
                return Err(PaywallError::ConfigError(format!(
                    "product code for {} cannot be empty",
                    slug
                )));
            }
            if products.insert(slug.clone(), code).is_some() {
                return Err(PaywallError::ConfigError(format!(
                    "duplicate product slug: {}",
                    slug
                )));
            }
        }
        Ok(Self { products })
    }

    /// Product code for a slug, ignoring case.
    pub fn code_for(&self, slug: &str) -> Option<&str> {
        if slug.is_empty() {
            return None;
        }
        self.products
            .get(&slug.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of mapped products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether no products are mapped.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// First path segment, e.g. `product-a` for `/product-a/content/123`.
///
/// Any query string is ignored. Returns `""` for `/` and for paths whose
/// first segment is empty.
pub fn product_slug(path: &str) -> &str {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').next().unwrap_or("")
}

/// Outcome of evaluating verified claims against a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Claims cannot be honoured.
    Rejected(RejectReason),

    /// The path is outside the paywall.
    Unmapped,

    /// The path belongs to a product; `is_subscriber` says whether the
    /// claims include it.
    Authorized {
        /// Product code the path maps to.
        product_code: String,
        /// Whether the product code is in the subscriptions.
        is_subscriber: bool,
    },
}

/// Evaluate verified claims for a resource path.
///
/// Expiry is checked first, so an expired token is rejected even on
/// unmapped paths.
pub fn evaluate<C: Clock + ?Sized>(
    claims: &Claims,
    resource_path: &str,
    products: &ProductMapping,
    leeway: Duration,
    clock: &C,
) -> Evaluation {
    if !check_expiry(claims.expiry, leeway, clock) {
        return Evaluation::Rejected(RejectReason::Expired);
    }

    let Some(code) = products.code_for(product_slug(resource_path)) else {
        return Evaluation::Unmapped;
    };

    Evaluation::Authorized {
        product_code: code.to_string(),
        is_subscriber: claims.has_subscription(code),
    }
}
