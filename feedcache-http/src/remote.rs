//! Loaders fetching resources over an [`HttpClient`].

use std::sync::Arc;

use bytes::Bytes;
use feedcache::OffloadManager;
use feedcache_core::{BoxTask, Completion, CompletionTask, LoadError, Loader, Offload};
use http::StatusCode;
use tracing::debug;
use url::Url;

use crate::{FeedItemsMapper, HttpClient, ImageCommentsMapper, Mapper};

/// Loads one fixed URL and decodes the response with a [`Mapper`].
///
/// A transport failure is delivered as [`LoadError::Connectivity`], a
/// response the mapper rejects as [`LoadError::InvalidData`].
pub struct RemoteLoader<C, M, O = OffloadManager> {
    url: Url,
    client: Arc<C>,
    mapper: Arc<M>,
    offload: O,
}

/// Remote loader of the feed list.
pub type RemoteFeedLoader<C, O = OffloadManager> = RemoteLoader<C, FeedItemsMapper, O>;

/// Remote loader of the comments of one image.
pub type RemoteImageCommentsLoader<C, O = OffloadManager> = RemoteLoader<C, ImageCommentsMapper, O>;

impl<C, M> RemoteLoader<C, M>
where
    C: HttpClient + 'static,
    M: Mapper + 'static,
{
    /// Loader of `url` running on a fresh [`OffloadManager`].
    pub fn new(url: Url, client: C, mapper: M) -> Self {
        Self::with_offload(url, client, mapper, OffloadManager::default())
    }
}

impl<C, M, O> RemoteLoader<C, M, O>
where
    C: HttpClient + 'static,
    M: Mapper + 'static,
    O: Offload,
{
    /// Loader of `url` running its requests on `offload`.
    pub fn with_offload(url: Url, client: C, mapper: M, offload: O) -> Self {
        Self {
            url,
            client: Arc::new(client),
            mapper: Arc::new(mapper),
            offload,
        }
    }

    /// The URL every load fetches.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl<C, M, O> Loader for RemoteLoader<C, M, O>
where
    C: HttpClient + 'static,
    M: Mapper + 'static,
    O: Offload,
{
    type Request = ();
    type Output = M::Output;

    fn load(&self, _request: (), completion: Completion<M::Output>) -> BoxTask {
        let task = CompletionTask::new(completion);
        let delivery = task.clone();
        let url = self.url.clone();
        let client = Arc::clone(&self.client);
        let mapper = Arc::clone(&self.mapper);

        self.offload.spawn("remote_load", async move {
            let result = match client.get(&url).await {
                Ok((body, status)) => mapper.map(&body, status).map_err(|error| {
                    debug!(%url, %error, "rejecting remote response");
                    LoadError::InvalidData
                }),
                Err(error) => {
                    debug!(%url, %error, "remote request failed");
                    Err(LoadError::Connectivity)
                }
            };
            delivery.complete(result);
        });

        Box::new(task)
    }
}

/// Fetches image bytes from the URL of the request.
///
/// Only a `200 OK` with a non-empty body counts as image data; anything
/// else is [`LoadError::InvalidData`].
pub struct RemoteImageDataLoader<C, O = OffloadManager> {
    client: Arc<C>,
    offload: O,
}

impl<C> RemoteImageDataLoader<C>
where
    C: HttpClient + 'static,
{
    /// Loader running on a fresh [`OffloadManager`].
    pub fn new(client: C) -> Self {
        Self::with_offload(client, OffloadManager::default())
    }
}

impl<C, O> RemoteImageDataLoader<C, O>
where
    C: HttpClient + 'static,
    O: Offload,
{
    /// Loader running its requests on `offload`.
    pub fn with_offload(client: C, offload: O) -> Self {
        Self {
            client: Arc::new(client),
            offload,
        }
    }
}

impl<C, O> Loader for RemoteImageDataLoader<C, O>
where
    C: HttpClient + 'static,
    O: Offload,
{
    type Request = Url;
    type Output = Bytes;

    fn load(&self, url: Url, completion: Completion<Bytes>) -> BoxTask {
        let task = CompletionTask::new(completion);
        let delivery = task.clone();
        let client = Arc::clone(&self.client);

        self.offload.spawn("remote_image_load", async move {
            let result = match client.get(&url).await {
                Ok((body, status)) if status == StatusCode::OK && !body.is_empty() => Ok(body),
                Ok((body, status)) => {
                    debug!(%url, %status, bytes = body.len(), "rejecting image response");
                    Err(LoadError::InvalidData)
                }
                Err(error) => {
                    debug!(%url, %error, "remote request failed");
                    Err(LoadError::Connectivity)
                }
            };
            delivery.complete(result);
        });

        Box::new(task)
    }
}
