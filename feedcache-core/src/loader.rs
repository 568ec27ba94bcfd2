//! The load and cache capabilities every component shares.
//!
//! Local loaders, remote loaders, decorators and composites all implement
//! the same [`Loader`] trait and are combined by wrapping, never by
//! inheritance. The aliases [`FeedLoader`] and [`ImageDataLoader`] name the
//! two resource kinds the pipeline deals with.

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::{BoxTask, Completion, FeedItem};

/// Loads one kind of resource asynchronously.
///
/// `load` must return its task before the completion can fire, and must
/// not block: the actual work is dispatched elsewhere and reports back
/// through `completion`.
pub trait Loader: Send + Sync {
    /// What identifies the resource (`()` for the feed, a URL for image data).
    type Request: Clone + Send + Sync + 'static;
    /// What a successful load yields.
    type Output: Send + 'static;

    /// Starts loading the resource identified by `request`.
    fn load(&self, request: Self::Request, completion: Completion<Self::Output>) -> BoxTask;
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    type Request = L::Request;
    type Output = L::Output;

    fn load(&self, request: Self::Request, completion: Completion<Self::Output>) -> BoxTask {
        (**self).load(request, completion)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    type Request = L::Request;
    type Output = L::Output;

    fn load(&self, request: Self::Request, completion: Completion<Self::Output>) -> BoxTask {
        (**self).load(request, completion)
    }
}

/// Sink that persists a loaded resource.
///
/// `save` must dispatch the write and return without waiting for it;
/// decorators call it on the delivery path of another load.
pub trait Cache: Send + Sync {
    /// What identifies the resource.
    type Request: Send + 'static;
    /// What gets persisted.
    type Payload: Send + 'static;

    /// Persists `payload` for `request` and reports the outcome.
    fn save(&self, payload: Self::Payload, request: Self::Request, completion: Completion<()>);
}

impl<C: Cache + ?Sized> Cache for Arc<C> {
    type Request = C::Request;
    type Payload = C::Payload;

    fn save(&self, payload: Self::Payload, request: Self::Request, completion: Completion<()>) {
        (**self).save(payload, request, completion)
    }
}

/// Loader of the feed list.
pub trait FeedLoader: Loader<Request = (), Output = Vec<FeedItem>> {}

impl<L> FeedLoader for L where L: Loader<Request = (), Output = Vec<FeedItem>> + ?Sized {}

/// Loader of image bytes for a URL.
pub trait ImageDataLoader: Loader<Request = Url, Output = Bytes> {}

impl<L> ImageDataLoader for L where L: Loader<Request = Url, Output = Bytes> + ?Sized {}

/// Cache of the feed list.
pub trait FeedCache: Cache<Request = (), Payload = Vec<FeedItem>> {}

impl<C> FeedCache for C where C: Cache<Request = (), Payload = Vec<FeedItem>> + ?Sized {}

/// Cache of image bytes keyed by URL.
pub trait ImageDataCache: Cache<Request = Url, Payload = Bytes> {}

impl<C> ImageDataCache for C where C: Cache<Request = Url, Payload = Bytes> + ?Sized {}
