//! Assembly of the two standard loading pipelines.
//!
//! Both pipelines combine the same parts, a remote loader, a local loader
//! that doubles as the cache, [`CacheOnSuccess`] and [`FallbackComposite`],
//! in opposite orders.

use std::sync::Arc;

use feedcache_core::{Cache, Loader};

use crate::{CacheOnSuccess, FallbackComposite};

/// Remote-first pipeline: fresh remote results are cached, the local cache
/// answers when the remote fails.
///
/// This is the feed list setup.
pub fn remote_with_local_fallback<R, L>(
    remote: R,
    local: Arc<L>,
) -> FallbackComposite<CacheOnSuccess<R, Arc<L>>, Arc<L>>
where
    R: Loader,
    R::Output: Clone,
    L: Loader<Request = R::Request, Output = R::Output>
        + Cache<Request = R::Request, Payload = R::Output>
        + 'static,
{
    FallbackComposite::new(CacheOnSuccess::new(remote, Arc::clone(&local)), local)
}

/// Local-first pipeline: the remote is asked only on a cache miss or a
/// broken cache, and what it returns is cached.
///
/// This is the image data setup.
pub fn local_with_remote_fallback<L, R>(
    local: Arc<L>,
    remote: R,
) -> FallbackComposite<Arc<L>, CacheOnSuccess<R, Arc<L>>>
where
    R: Loader + 'static,
    R::Output: Clone,
    L: Loader<Request = R::Request, Output = R::Output>
        + Cache<Request = R::Request, Payload = R::Output>
        + 'static,
{
    FallbackComposite::new(Arc::clone(&local), CacheOnSuccess::new(remote, local))
}
