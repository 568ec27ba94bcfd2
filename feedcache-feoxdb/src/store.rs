use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use async_trait::async_trait;
use bytes::Bytes;
use feedcache_backend::{
    BincodeFormat, FeedStore, Format, ImageDataStore, StoreError, StoreResult,
};
use feedcache_core::CachedFeed;
use feoxdb::{FeoxError, FeoxStore};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::FeOxDbError;

const FEED_KEY: &[u8] = b"feed:cache";
const IMAGE_KEY_PREFIX: &str = "image:";

type Job = Box<dyn FnOnce(&FeoxStore) + Send>;

/// Persistent store on top of an embedded FeOxDB database.
///
/// The database is owned by a dedicated worker thread. Operations are
/// queued on a FIFO channel and executed one at a time in the order they
/// were issued, so there is no reader/writer distinction: every operation
/// is strictly serialized.
///
/// ```no_run
/// use feedcache_feoxdb::FeOxDbStore;
///
/// let store = FeOxDbStore::builder()
///     .path("/var/cache/myapp")
///     .max_file_size(256 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), feedcache_feoxdb::FeOxDbError>(())
/// ```
///
/// Dropping the store closes the queue, lets the worker finish the jobs
/// already queued, flushes the database and waits for the worker to
/// release it. Share a store between owners with `Arc`.
pub struct FeOxDbStore {
    jobs: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
    format: BincodeFormat,
    name: String,
}

impl FeOxDbStore {
    /// Starts building a new store.
    pub fn builder() -> FeOxDbStoreBuilder {
        FeOxDbStoreBuilder::default()
    }

    /// In-memory store for tests.
    ///
    /// Data is lost when dropped. Equivalent to `builder().build()`.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }

    fn spawn(store: FeoxStore, name: String) -> Result<Self, FeOxDbError> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        let worker = std::thread::Builder::new()
            .name(format!("feedcache-{name}"))
            .spawn(move || {
                while let Some(job) = queue.blocking_recv() {
                    job(&store);
                }
                store.flush();
                tracing::debug!("feoxdb worker released the database");
            })?;

        Ok(Self {
            jobs: Some(jobs),
            worker: Some(worker),
            format: BincodeFormat,
            name,
        })
    }

    /// Runs `action` on the worker, after every operation issued before it.
    async fn perform<T, F>(&self, action: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FeoxStore) -> StoreResult<T> + Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let job: Job = Box::new(move |store| {
            let _ = reply.send(action(store));
        });
        self.jobs
            .as_ref()
            .ok_or(StoreError::Closed)?
            .send(job)
            .map_err(|_| StoreError::Closed)?;
        result.await.map_err(|_| StoreError::Closed)?
    }

    fn image_key(url: &Url) -> Vec<u8> {
        format!("{IMAGE_KEY_PREFIX}{url}").into_bytes()
    }
}

impl Drop for FeOxDbStore {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!(store = %self.name, "feoxdb worker panicked");
        }
    }
}

impl std::fmt::Debug for FeOxDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbStore")
            .field("name", &self.name)
            .field("open", &self.jobs.is_some())
            .finish()
    }
}

fn get(store: &FeoxStore, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
    match store.get(key) {
        Ok(value) => Ok(Some(value.to_vec())),
        Err(FeoxError::KeyNotFound) => Ok(None),
        Err(e) => Err(StoreError::internal(e)),
    }
}

fn remove(store: &FeoxStore, key: &[u8]) -> StoreResult<()> {
    if store.contains_key(key) {
        store.delete(key).map_err(StoreError::internal)?;
    }
    Ok(())
}

/// Builder for [`FeOxDbStore`].
#[derive(Debug)]
pub struct FeOxDbStoreBuilder {
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    name: String,
}

impl Default for FeOxDbStoreBuilder {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            name: "feoxdb".to_owned(),
        }
    }
}

impl FeOxDbStoreBuilder {
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory and is lost on drop.
    /// If path is a directory, creates `cache.db` inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Ignored in memory-only mode.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Identifies this store in tracing output and names its worker thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Opens the database and starts the worker.
    ///
    /// Fails if the database file can't be opened or created.
    pub fn build(self) -> Result<FeOxDbStore, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("cache.db");
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;
        FeOxDbStore::spawn(store, self.name)
    }
}

#[async_trait]
impl FeedStore for FeOxDbStore {
    #[tracing::instrument(skip(self), fields(store = %self.name), level = "trace")]
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        let format = self.format;
        self.perform(move |store| match get(store, FEED_KEY)? {
            Some(encoded) => Ok(Some(format.decode(&encoded)?)),
            None => Ok(None),
        })
        .await
    }

    #[tracing::instrument(skip(self, feed), fields(store = %self.name, items = feed.items.len()), level = "trace")]
    async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
        let encoded = self.format.encode(&feed)?;
        self.perform(move |store| {
            // At most one live record: drop the old one before creating the new one.
            remove(store, FEED_KEY)?;
            store
                .insert(FEED_KEY, &encoded)
                .map_err(StoreError::internal)?;
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(store = %self.name), level = "trace")]
    async fn delete(&self) -> StoreResult<()> {
        self.perform(|store| remove(store, FEED_KEY)).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ImageDataStore for FeOxDbStore {
    #[tracing::instrument(skip(self), fields(store = %self.name, url = %url), level = "trace")]
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        let key = Self::image_key(url);
        self.perform(move |store| Ok(get(store, &key)?.map(Bytes::from)))
            .await
    }

    #[tracing::instrument(skip(self, data), fields(store = %self.name, url = %url, bytes = data.len()), level = "trace")]
    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()> {
        let key = Self::image_key(url);
        self.perform(move |store| {
            remove(store, &key)?;
            store.insert(&key, &data).map_err(StoreError::internal)?;
            Ok(())
        })
        .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use feedcache_core::FeedItem;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn unique_feed() -> CachedFeed {
        let item = FeedItem::new(
            Uuid::new_v4(),
            Some("a description".to_owned()),
            Some("a location".to_owned()),
            Url::parse(&format!("https://any-url.com/{}", Uuid::new_v4())).unwrap(),
        );
        CachedFeed::new(vec![item], Utc::now())
    }

    fn url(path: &str) -> Url {
        Url::parse("https://a-url.com").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn retrieve_delivers_empty_on_empty_store() {
        let store = FeOxDbStore::in_memory().unwrap();

        assert_eq!(store.retrieve().await.unwrap(), None);
        assert_eq!(store.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn retrieve_delivers_inserted_feed() {
        let store = FeOxDbStore::in_memory().unwrap();
        let feed = unique_feed();

        store.insert(feed.clone()).await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), Some(feed));
    }

    #[tokio::test]
    async fn insert_replaces_previous_feed() {
        let store = FeOxDbStore::in_memory().unwrap();
        let first = unique_feed();
        let mut latest = unique_feed();
        latest.timestamp = first.timestamp - TimeDelta::days(1);

        store.insert(first).await.unwrap();
        store.insert(latest.clone()).await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), Some(latest));
    }

    #[tokio::test]
    async fn delete_is_noop_on_empty_store() {
        let store = FeOxDbStore::in_memory().unwrap();

        store.delete().await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_inserted_feed() {
        let store = FeOxDbStore::in_memory().unwrap();
        store.insert(unique_feed()).await.unwrap();

        store.delete().await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn operations_run_in_issue_order() {
        let store = FeOxDbStore::in_memory().unwrap();
        let last = unique_feed();

        let (inserted, deleted, reinserted, retrieved) = tokio::join!(
            store.insert(unique_feed()),
            store.delete(),
            store.insert(last.clone()),
            store.retrieve(),
        );

        inserted.unwrap();
        deleted.unwrap();
        reinserted.unwrap();
        assert_eq!(retrieved.unwrap(), Some(last));
    }

    #[tokio::test]
    async fn image_data_is_keyed_by_url() {
        let store = FeOxDbStore::in_memory().unwrap();
        let data = Bytes::from_static(b"image data");

        store.insert_data(data.clone(), &url("/image")).await.unwrap();

        assert_eq!(store.retrieve_data(&url("/image")).await.unwrap(), Some(data));
        assert_eq!(store.retrieve_data(&url("/other")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn image_insert_overwrites_previous_data() {
        let store = FeOxDbStore::in_memory().unwrap();

        store
            .insert_data(Bytes::from_static(b"first"), &url("/image"))
            .await
            .unwrap();
        store
            .insert_data(Bytes::from_static(b"last"), &url("/image"))
            .await
            .unwrap();

        assert_eq!(
            store.retrieve_data(&url("/image")).await.unwrap(),
            Some(Bytes::from_static(b"last"))
        );
    }

    #[tokio::test]
    async fn feed_and_image_data_do_not_collide() {
        let store = FeOxDbStore::in_memory().unwrap();
        let feed = unique_feed();

        store.insert(feed.clone()).await.unwrap();
        store
            .insert_data(Bytes::from_static(b"data"), &url("/image"))
            .await
            .unwrap();
        store.delete().await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), None);
        assert!(store.retrieve_data(&url("/image")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn drop_releases_database_for_reopening() {
        let temp_dir = TempDir::new().unwrap();
        let feed = unique_feed();

        {
            let store = FeOxDbStore::builder().path(temp_dir.path()).build().unwrap();
            store.insert(feed.clone()).await.unwrap();
        }

        let store = FeOxDbStore::builder()
            .path(temp_dir.path().join("cache.db"))
            .build()
            .unwrap();
        assert_eq!(store.retrieve().await.unwrap(), Some(feed));
    }

    #[tokio::test]
    async fn builder_sets_name() {
        let store = FeOxDbStore::builder().name("images").build().unwrap();

        assert_eq!(FeedStore::name(&store), "images");
        assert_eq!(ImageDataStore::name(&store), "images");
    }
}
