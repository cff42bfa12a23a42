//! Token expiry enforcement.

use crate::clock::Clock;
use std::time::Duration;

/// Check that a token's `exp` has not passed.
///
/// # Arguments
/// * `expiry` - The `exp` claim as unix seconds
/// * `leeway` - Clock-skew tolerance added to `expiry`
/// * `clock` - Clock implementation for current time
///
/// # Returns
/// `true` while `expiry + leeway >= now`. A token expiring exactly now is
/// still fresh.
pub fn check_expiry<C: Clock + ?Sized>(expiry: i64, leeway: Duration, clock: &C) -> bool {
    let leeway_secs = i64::try_from(leeway.as_secs()).unwrap_or(i64::MAX);
    expiry.saturating_add(leeway_secs) >= clock.now_unix()
}
