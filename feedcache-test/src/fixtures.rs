//! Values the tests don't care about, and a clock they control.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use feedcache_backend::StoreError;
use feedcache_core::{CachePolicy, Clock, FeedItem};
use url::Url;
use uuid::Uuid;

pub fn any_url() -> Url {
    Url::parse("https://any-url.com").expect("valid URL")
}

pub fn any_data() -> Bytes {
    Bytes::from_static(b"any data")
}

pub fn any_store_error() -> StoreError {
    StoreError::Io(std::io::Error::other("any error"))
}

/// Two feed items with random ids.
pub fn unique_feed() -> Vec<FeedItem> {
    vec![unique_item(), unique_item()]
}

pub fn unique_item() -> FeedItem {
    FeedItem::new(
        Uuid::new_v4(),
        Some("any description".to_owned()),
        Some("any location".to_owned()),
        Url::parse(&format!("https://any-url.com/{}", Uuid::new_v4())).expect("valid URL"),
    )
}

/// Timestamp exactly at the maximum cache age, which is already stale.
pub fn expired_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now - CachePolicy::default().max_age()
}

/// Timestamp one second short of the maximum cache age.
pub fn non_expired_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    expired_timestamp(now) + TimeDelta::seconds(1)
}

/// A [`Clock`] standing still until the test moves it.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
                .single()
                .expect("valid date"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
