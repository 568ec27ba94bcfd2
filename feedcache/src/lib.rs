#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Background execution of store work.
///
/// [`OffloadManager`](offload::OffloadManager) implements
/// [`Offload`](feedcache_core::Offload) on top of tokio tasks.
pub mod offload;

/// Loaders over the local stores.
///
/// - [`LocalFeedLoader`] - time-bounded feed cache with load, save and validation
/// - [`LocalImageDataLoader`] - per-URL image data cache
pub mod local;

mod composite;
mod decorator;

pub mod composer;

pub use composite::FallbackComposite;
pub use decorator::CacheOnSuccess;
pub use local::{LocalFeedLoader, LocalFeedLoaderBuilder, LocalImageDataLoader};
pub use offload::{OffloadConfig, OffloadManager, TimeoutPolicy};

pub use feedcache_backend::{FeedStore, ImageDataStore, StoreError};
pub use feedcache_core::{
    BoxTask, Cache, CachePolicy, CachedFeed, Clock, Completion, FeedItem, LoadError, LoadResult,
    Loader, LoaderTask, SystemClock,
};
