//! Freshness policy for the cached feed.
//!
//! [`CachePolicy`] answers one question: is a feed saved at `timestamp`
//! still usable at `now`? It is a pure function of its inputs, so the
//! loaders that use it stay deterministic under an injected [`Clock`].
//!
//! Image data has no freshness policy and never expires.
//!
//! [`Clock`]: crate::Clock

use chrono::{DateTime, TimeDelta, Utc};

/// Maximum age of a cached feed, in days, unless configured otherwise.
pub const DEFAULT_MAX_CACHE_AGE_DAYS: i64 = 7;

/// Time-to-live predicate over a stored timestamp.
///
/// A record is valid while `now < timestamp + max_age`. The boundary is
/// exclusive: a record whose age is exactly `max_age` is stale.
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use feedcache_core::CachePolicy;
///
/// let policy = CachePolicy::default();
/// let saved = Utc::now();
///
/// assert!(policy.is_valid(saved, saved + TimeDelta::days(7) - TimeDelta::seconds(1)));
/// assert!(!policy.is_valid(saved, saved + TimeDelta::days(7)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    max_age: TimeDelta,
}

impl CachePolicy {
    /// Creates a policy with a custom maximum age.
    pub fn new(max_age: TimeDelta) -> Self {
        Self { max_age }
    }

    /// Maximum age a record may reach before it turns stale.
    pub fn max_age(&self) -> TimeDelta {
        self.max_age
    }

    /// Returns `true` when a record saved at `timestamp` is still fresh at `now`.
    ///
    /// A timestamp so far in the future that adding `max_age` overflows is
    /// treated as stale.
    pub fn is_valid(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match timestamp.checked_add_signed(self.max_age) {
            Some(expires_at) => now < expires_at,
            None => false,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(TimeDelta::days(DEFAULT_MAX_CACHE_AGE_DAYS))
    }
}
