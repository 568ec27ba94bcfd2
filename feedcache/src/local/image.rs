use std::sync::Arc;

use bytes::Bytes;
use feedcache_backend::ImageDataStore;
use feedcache_core::{
    BoxTask, Cache, Completion, CompletionTask, LoadError, Loader, LoaderTask, Offload,
};
use tracing::{debug, trace};
use url::Url;

use super::{Lifetime, StoreQueue};
use crate::offload::OffloadManager;

/// Image data loader over an [`ImageDataStore`].
///
/// A store failure is reported as [`LoadError::Failed`] and a URL without
/// cached data as [`LoadError::NotFound`], so callers can tell a broken
/// cache from a cold one. Saving (the [`Cache`] impl) is a single insert
/// whose result is passed through. Store operations run in call order.
pub struct LocalImageDataLoader<S, O = OffloadManager> {
    store: Arc<S>,
    queue: StoreQueue<O>,
    lifetime: Lifetime,
}

impl<S> LocalImageDataLoader<S>
where
    S: ImageDataStore + 'static,
{
    /// Loader running on a fresh [`OffloadManager`].
    pub fn new(store: S) -> Self {
        Self::with_offload(store, OffloadManager::default())
    }
}

impl<S, O> LocalImageDataLoader<S, O>
where
    S: ImageDataStore + 'static,
    O: Offload,
{
    /// Loader running its store work on `offload`.
    pub fn with_offload(store: S, offload: O) -> Self {
        Self {
            store: Arc::new(store),
            queue: StoreQueue::new(offload, "image_store"),
            lifetime: Lifetime::default(),
        }
    }

    /// Executor running the store work.
    pub fn offload(&self) -> &O {
        self.queue.offload()
    }
}

impl<S, O> Loader for LocalImageDataLoader<S, O>
where
    S: ImageDataStore + 'static,
    O: Offload,
{
    type Request = Url;
    type Output = Bytes;

    fn load(&self, url: Url, completion: Completion<Bytes>) -> BoxTask {
        let task = CompletionTask::new(completion);
        let delivery = task.clone();
        let store = Arc::clone(&self.store);
        let watch = self.lifetime.watch();

        self.queue.push("image_load", async move {
            let retrieved = store.retrieve_data(&url).await;
            if !watch.is_alive() {
                debug!(%url, "image loader dropped, discarding store result");
                delivery.cancel();
                return;
            }

            let result = match retrieved {
                Ok(Some(data)) => {
                    trace!(store = store.name(), %url, "image data cache hit");
                    Ok(data)
                }
                Ok(None) => {
                    trace!(store = store.name(), %url, "image data cache miss");
                    Err(LoadError::NotFound)
                }
                Err(error) => {
                    debug!(store = store.name(), %url, %error, "image data store failed");
                    Err(LoadError::Failed)
                }
            };
            delivery.complete(result);
        });

        Box::new(task)
    }
}

impl<S, O> Cache for LocalImageDataLoader<S, O>
where
    S: ImageDataStore + 'static,
    O: Offload,
{
    type Request = Url;
    type Payload = Bytes;

    fn save(&self, data: Bytes, url: Url, completion: Completion<()>) {
        let store = Arc::clone(&self.store);
        let watch = self.lifetime.watch();

        self.queue.push("image_save", async move {
            let inserted = store.insert_data(data, &url).await;
            if !watch.is_alive() {
                debug!(%url, "image loader dropped, discarding store result");
                return;
            }
            completion(inserted.map_err(LoadError::from));
        });
    }
}

impl<S, O> std::fmt::Debug for LocalImageDataLoader<S, O>
where
    S: ImageDataStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalImageDataLoader")
            .field("store", &self.store.name())
            .finish()
    }
}
