use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use feedcache_core::CachedFeed;
use url::Url;

use crate::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage of the single cached feed record.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Returns the stored record, or `None` when nothing is stored.
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>>;

    /// Stores `feed`, fully replacing any previous record.
    async fn insert(&self, feed: CachedFeed) -> StoreResult<()>;

    /// Removes the stored record. Succeeds when nothing is stored.
    async fn delete(&self) -> StoreResult<()>;

    /// Returns the name of this store, used in tracing fields.
    fn name(&self) -> &str {
        "store"
    }
}

/// Durable storage of image bytes keyed by URL.
///
/// Entries are independent and never expire.
#[async_trait]
pub trait ImageDataStore: Send + Sync {
    /// Returns the bytes stored for `url`, if any.
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>>;

    /// Stores `data` for `url`, overwriting a previous entry.
    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()>;

    /// Returns the name of this store, used in tracing fields.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl<S: FeedStore + ?Sized> FeedStore for &S {
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        (**self).retrieve().await
    }

    async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
        (**self).insert(feed).await
    }

    async fn delete(&self) -> StoreResult<()> {
        (**self).delete().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: FeedStore + ?Sized> FeedStore for Box<S> {
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        (**self).retrieve().await
    }

    async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
        (**self).insert(feed).await
    }

    async fn delete(&self) -> StoreResult<()> {
        (**self).delete().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: FeedStore + ?Sized> FeedStore for Arc<S> {
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        (**self).retrieve().await
    }

    async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
        (**self).insert(feed).await
    }

    async fn delete(&self) -> StoreResult<()> {
        (**self).delete().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: ImageDataStore + ?Sized> ImageDataStore for &S {
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        (**self).retrieve_data(url).await
    }

    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()> {
        (**self).insert_data(data, url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: ImageDataStore + ?Sized> ImageDataStore for Box<S> {
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        (**self).retrieve_data(url).await
    }

    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()> {
        (**self).insert_data(data, url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: ImageDataStore + ?Sized> ImageDataStore for Arc<S> {
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        (**self).retrieve_data(url).await
    }

    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()> {
        (**self).insert_data(data, url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
