//! YAML configuration for feedcache.
//!
//! ```yaml
//! base_url: "https://feed.example.com"
//! max_cache_age: 7days
//! feed_store:
//!   type: File
//!   path: /var/cache/app/feed.json
//! image_store:
//!   type: FeOxDb
//!   path: /var/cache/app
//!   max_file_size: 268435456
//! ```
//!
//! Store types are compiled in through the `fs` (default) and `feoxdb`
//! features. Building a store whose feature is disabled fails with
//! [`ConfigError::BackendNotAvailable`].

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use feedcache_backend::{FeedStore, ImageDataStore};
use feedcache_core::CachePolicy;
use feedcache_core::policy::DEFAULT_MAX_CACHE_AGE_DAYS;
use serde::{Deserialize, Serialize};
use url::Url;

mod error;
pub mod store;

pub use error::ConfigError;
pub use store::{FeOxDb, FileStore, Store, StoreFormat};

fn default_max_cache_age() -> Duration {
    Duration::from_secs(DEFAULT_MAX_CACHE_AGE_DAYS as u64 * 24 * 60 * 60)
}

/// Top level configuration document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeedCacheConfig {
    /// Root of the remote API.
    pub base_url: Url,
    /// How long a cached feed stays fresh. Seven days when omitted.
    #[serde(default = "default_max_cache_age", with = "humantime_serde")]
    pub max_cache_age: Duration,
    /// Where the feed list is cached.
    pub feed_store: Store,
    /// Where image data is cached.
    pub image_store: Store,
}

impl FeedCacheConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    /// Freshness policy for the cached feed.
    pub fn cache_policy(&self) -> Result<CachePolicy, ConfigError> {
        TimeDelta::from_std(self.max_cache_age)
            .map(CachePolicy::new)
            .map_err(|_| ConfigError::InvalidMaxAge(self.max_cache_age))
    }

    /// Builds both stores.
    ///
    /// Two FeOxDB stores with identical settings are served by one database.
    /// Two file stores on the same path are rejected with
    /// [`ConfigError::SharedFilePath`], since each would overwrite the other.
    pub fn into_stores(
        self,
    ) -> Result<(Arc<dyn FeedStore>, Arc<dyn ImageDataStore>), ConfigError> {
        match (self.feed_store, self.image_store) {
            (Store::File(feed), Store::File(image)) if feed.path == image.path => {
                Err(ConfigError::SharedFilePath(feed.path))
            }
            #[cfg(feature = "feoxdb")]
            (Store::FeOxDb(feed), Store::FeOxDb(image)) if feed == image => {
                let shared = Arc::new(feed.open()?);
                let feed_store: Arc<dyn FeedStore> = shared.clone();
                let image_store: Arc<dyn ImageDataStore> = shared;
                Ok((feed_store, image_store))
            }
            (feed, image) => Ok((feed.into_feed_store()?, image.into_image_store()?)),
        }
    }
}
