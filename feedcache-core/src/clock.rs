//! Injectable source of the current time.

use chrono::{DateTime, Utc};

/// Source of "now".
///
/// Loaders that timestamp or validate records take a clock instead of
/// reading the system time, so tests can pin the current instant. Any
/// `Fn() -> DateTime<Utc>` closure is a clock.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use feedcache_core::Clock;
///
/// let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let clock = move || fixed;
/// assert_eq!(clock.now(), fixed);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}
