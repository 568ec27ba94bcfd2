use std::sync::Arc;

use feedcache_backend::FeedStore;
use feedcache_core::{
    BoxTask, Cache, CachePolicy, CachedFeed, Clock, Completion, CompletionTask, FeedItem,
    LoadError, Loader, LoaderTask, Offload, SystemClock,
};
use tracing::{debug, trace, warn};

use super::{Lifetime, LifetimeWatch, StoreQueue};
use crate::offload::OffloadManager;

/// Feed loader reading from and writing to a [`FeedStore`].
///
/// - `load` delivers the cached items while they are fresh according to the
///   [`CachePolicy`], and an empty list when nothing fresh is cached. Only
///   store failures are errors; a failed read also schedules a best-effort
///   delete of the presumably corrupt cache.
/// - `save` (the [`Cache`] impl) replaces the cached feed with the given
///   items, timestamped with the injected [`Clock`].
/// - [`validate_cache`](Self::validate_cache) deletes a stale or unreadable
///   cache.
///
/// Store operations run one at a time in call order, so a `save` issued
/// after another always leaves its own items behind. Dropping the loader
/// suppresses every delivery still pending.
///
/// ```ignore
/// use feedcache::LocalFeedLoader;
/// use feedcache_fs::FileFeedStore;
///
/// let loader = LocalFeedLoader::new(FileFeedStore::new("feed.store"));
/// ```
pub struct LocalFeedLoader<S, C = SystemClock, O = OffloadManager> {
    store: Arc<S>,
    clock: Arc<C>,
    policy: CachePolicy,
    queue: StoreQueue<O>,
    lifetime: Lifetime,
}

impl<S> LocalFeedLoader<S>
where
    S: FeedStore + 'static,
{
    /// Loader with the system clock, the default policy and a fresh
    /// [`OffloadManager`].
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    /// Starts building a loader over `store`.
    pub fn builder(store: S) -> LocalFeedLoaderBuilder<S> {
        LocalFeedLoaderBuilder {
            store,
            clock: SystemClock,
            policy: CachePolicy::default(),
            offload: OffloadManager::default(),
        }
    }
}

impl<S, C, O> LocalFeedLoader<S, C, O>
where
    S: FeedStore + 'static,
    C: Clock + 'static,
    O: Offload,
{
    /// Policy deciding whether the cached feed is fresh.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Executor running the store work.
    pub fn offload(&self) -> &O {
        self.queue.offload()
    }

    /// Deletes the cached feed if it is stale or cannot be read.
    ///
    /// Delivers the delete's outcome in those cases, `Ok(())` otherwise.
    pub fn validate_cache(&self, completion: Completion<()>) {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let policy = self.policy;
        let watch = self.lifetime.watch();

        self.queue.push("feed_validate", async move {
            let retrieved = store.retrieve().await;
            if dropped(&watch) {
                return;
            }

            let expired = match retrieved {
                Err(error) => {
                    debug!(store = store.name(), %error, "cached feed unreadable, deleting");
                    true
                }
                Ok(Some(feed)) if !policy.is_valid(feed.timestamp, clock.now()) => {
                    debug!(store = store.name(), timestamp = %feed.timestamp, "cached feed expired, deleting");
                    true
                }
                Ok(_) => false,
            };

            if !expired {
                completion(Ok(()));
                return;
            }

            let deleted = store.delete().await;
            if dropped(&watch) {
                return;
            }
            completion(deleted.map_err(LoadError::from));
        });
    }
}

fn dropped(watch: &LifetimeWatch) -> bool {
    if watch.is_alive() {
        false
    } else {
        debug!("feed loader dropped, discarding store result");
        true
    }
}

impl<S, C, O> Loader for LocalFeedLoader<S, C, O>
where
    S: FeedStore + 'static,
    C: Clock + 'static,
    O: Offload,
{
    type Request = ();
    type Output = Vec<FeedItem>;

    fn load(&self, _request: (), completion: Completion<Vec<FeedItem>>) -> BoxTask {
        let task = CompletionTask::new(completion);
        let delivery = task.clone();
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let policy = self.policy;
        let watch = self.lifetime.watch();

        self.queue.push("feed_load", async move {
            let retrieved = store.retrieve().await;
            if dropped(&watch) {
                delivery.cancel();
                return;
            }

            match retrieved {
                Err(error) => {
                    delivery.complete(Err(error.into()));
                    if let Err(error) = store.delete().await {
                        warn!(store = store.name(), %error, "deleting unreadable feed cache failed");
                    }
                }
                Ok(Some(feed)) if policy.is_valid(feed.timestamp, clock.now()) => {
                    trace!(store = store.name(), items = feed.items.len(), "feed cache hit");
                    delivery.complete(Ok(feed.into_items()));
                }
                Ok(_) => {
                    trace!(store = store.name(), "feed cache miss");
                    delivery.complete(Ok(Vec::new()));
                }
            }
        });

        Box::new(task)
    }
}

impl<S, C, O> Cache for LocalFeedLoader<S, C, O>
where
    S: FeedStore + 'static,
    C: Clock + 'static,
    O: Offload,
{
    type Request = ();
    type Payload = Vec<FeedItem>;

    fn save(&self, items: Vec<FeedItem>, _request: (), completion: Completion<()>) {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let watch = self.lifetime.watch();

        self.queue.push("feed_save", async move {
            let deleted = store.delete().await;
            if dropped(&watch) {
                return;
            }
            if let Err(error) = deleted {
                completion(Err(error.into()));
                return;
            }

            let inserted = store.insert(CachedFeed::new(items, clock.now())).await;
            if dropped(&watch) {
                return;
            }
            completion(inserted.map_err(LoadError::from));
        });
    }
}

impl<S, C, O> std::fmt::Debug for LocalFeedLoader<S, C, O>
where
    S: FeedStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFeedLoader")
            .field("store", &self.store.name())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`LocalFeedLoader`].
pub struct LocalFeedLoaderBuilder<S, C = SystemClock, O = OffloadManager> {
    store: S,
    clock: C,
    policy: CachePolicy,
    offload: O,
}

impl<S, C, O> LocalFeedLoaderBuilder<S, C, O>
where
    S: FeedStore + 'static,
    C: Clock + 'static,
    O: Offload,
{
    /// Source of the timestamps written on save and compared on load.
    pub fn clock<NewC: Clock + 'static>(self, clock: NewC) -> LocalFeedLoaderBuilder<S, NewC, O> {
        LocalFeedLoaderBuilder {
            store: self.store,
            clock,
            policy: self.policy,
            offload: self.offload,
        }
    }

    /// Freshness policy, 7 days by default.
    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Executor for the store work.
    pub fn offload<NewO: Offload>(self, offload: NewO) -> LocalFeedLoaderBuilder<S, C, NewO> {
        LocalFeedLoaderBuilder {
            store: self.store,
            clock: self.clock,
            policy: self.policy,
            offload,
        }
    }

    /// Creates the loader.
    pub fn build(self) -> LocalFeedLoader<S, C, O> {
        LocalFeedLoader {
            store: Arc::new(self.store),
            clock: Arc::new(self.clock),
            policy: self.policy,
            queue: StoreQueue::new(self.offload, "feed_store"),
            lifetime: Lifetime::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeDelta, Utc};
    use feedcache_backend::{StoreError, StoreResult};
    use feedcache_core::LoadResult;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use url::Url;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryStore {
        feed: Mutex<Option<CachedFeed>>,
    }

    #[async_trait]
    impl FeedStore for MemoryStore {
        async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
            Ok(self.feed.lock().unwrap().clone())
        }

        async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
            *self.feed.lock().unwrap() = Some(feed);
            Ok(())
        }

        async fn delete(&self) -> StoreResult<()> {
            self.feed.lock().unwrap().take();
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl FeedStore for BrokenStore {
        async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
            Err(StoreError::Closed)
        }

        async fn insert(&self, _feed: CachedFeed) -> StoreResult<()> {
            Err(StoreError::Closed)
        }

        async fn delete(&self) -> StoreResult<()> {
            Err(StoreError::Closed)
        }
    }

    fn item() -> FeedItem {
        FeedItem::new(
            Uuid::new_v4(),
            None,
            None,
            Url::parse("https://any-url.com").unwrap(),
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    async fn load<L: Loader<Request = ()>>(loader: &L) -> LoadResult<L::Output> {
        let (sender, receiver) = oneshot::channel();
        let _task = loader.load(
            (),
            Box::new(move |result| {
                let _ = sender.send(result);
            }),
        );
        receiver.await.unwrap()
    }

    async fn save_feed<C>(cache: &C, items: Vec<FeedItem>) -> LoadResult<()>
    where
        C: Cache<Request = (), Payload = Vec<FeedItem>>,
    {
        let (sender, receiver) = oneshot::channel();
        cache.save(
            items,
            (),
            Box::new(move |result| {
                let _ = sender.send(result);
            }),
        );
        receiver.await.unwrap()
    }

    #[tokio::test]
    async fn save_then_load_delivers_saved_items() {
        let loader = LocalFeedLoader::builder(MemoryStore::default())
            .clock(fixed_now)
            .build();
        let items = vec![item(), item()];

        save_feed(&loader, items.clone()).await.unwrap();

        assert_eq!(load(&loader).await.unwrap(), items);
    }

    #[tokio::test]
    async fn load_delivers_empty_list_for_stale_cache() {
        let store = MemoryStore::default();
        *store.feed.lock().unwrap() = Some(CachedFeed::new(
            vec![item()],
            fixed_now() - TimeDelta::days(7),
        ));
        let loader = LocalFeedLoader::builder(store).clock(fixed_now).build();

        assert_eq!(load(&loader).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn custom_policy_shortens_freshness() {
        let store = MemoryStore::default();
        *store.feed.lock().unwrap() = Some(CachedFeed::new(
            vec![item()],
            fixed_now() - TimeDelta::hours(2),
        ));
        let loader = LocalFeedLoader::builder(store)
            .clock(fixed_now)
            .policy(CachePolicy::new(TimeDelta::hours(1)))
            .build();

        assert_eq!(load(&loader).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let loader = LocalFeedLoader::new(BrokenStore);

        assert!(load(&loader).await.unwrap_err().is_store());
        assert!(save_feed(&loader, vec![item()]).await.unwrap_err().is_store());
    }

    #[tokio::test]
    async fn validate_cache_removes_expired_feed() {
        let store = MemoryStore::default();
        *store.feed.lock().unwrap() = Some(CachedFeed::new(
            vec![item()],
            fixed_now() - TimeDelta::days(8),
        ));
        let loader = LocalFeedLoader::builder(store).clock(fixed_now).build();
        let (sender, receiver) = oneshot::channel();

        loader.validate_cache(Box::new(move |result| {
            let _ = sender.send(result);
        }));
        receiver.await.unwrap().unwrap();

        assert!(loader.store.feed.lock().unwrap().is_none());
    }
}
