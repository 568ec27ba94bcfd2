//! Loader decorator persisting successful loads.

use feedcache_core::{BoxTask, Cache, Completion, Loader};
use tracing::warn;

/// Wraps a loader and saves every successful result into a [`Cache`].
///
/// The save is dispatched before the success is delivered and its outcome
/// is only logged: it never changes or delays the result the caller gets.
/// Failed loads are delivered untouched and nothing is saved.
///
/// ```ignore
/// use std::sync::Arc;
/// use feedcache::CacheOnSuccess;
///
/// let local = Arc::new(local_feed_loader);
/// let remote = CacheOnSuccess::new(remote_feed_loader, Arc::clone(&local));
/// ```
#[derive(Debug, Clone)]
pub struct CacheOnSuccess<L, C> {
    decoratee: L,
    cache: C,
}

impl<L, C> CacheOnSuccess<L, C> {
    /// Decorates `decoratee`, saving its successful results into `cache`.
    pub fn new(decoratee: L, cache: C) -> Self {
        Self { decoratee, cache }
    }

    /// The wrapped loader.
    pub fn decoratee(&self) -> &L {
        &self.decoratee
    }
}

impl<L, C> Loader for CacheOnSuccess<L, C>
where
    L: Loader,
    L::Output: Clone,
    C: Cache<Request = L::Request, Payload = L::Output> + Clone + 'static,
{
    type Request = L::Request;
    type Output = L::Output;

    fn load(&self, request: L::Request, completion: Completion<L::Output>) -> BoxTask {
        let cache = self.cache.clone();
        let key = request.clone();

        self.decoratee.load(
            request,
            Box::new(move |result| {
                if let Ok(payload) = &result {
                    cache.save(
                        payload.clone(),
                        key,
                        Box::new(|saved| {
                            if let Err(error) = saved {
                                warn!(%error, "caching loaded resource failed");
                            }
                        }),
                    );
                }
                completion(result);
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedcache_core::{CompletionTask, LoadError, LoadResult};
    use std::sync::{Arc, Mutex};

    struct Stub(fn() -> LoadResult<u8>);

    impl Loader for Stub {
        type Request = &'static str;
        type Output = u8;

        fn load(&self, _request: &'static str, completion: Completion<u8>) -> BoxTask {
            let task = CompletionTask::new(completion);
            task.complete((self.0)());
            Box::new(task)
        }
    }

    #[derive(Clone, Default)]
    struct Saves(Arc<Mutex<Vec<(u8, &'static str)>>>);

    impl Cache for Saves {
        type Request = &'static str;
        type Payload = u8;

        fn save(&self, payload: u8, request: &'static str, completion: Completion<()>) {
            self.0.lock().unwrap().push((payload, request));
            completion(Err(LoadError::Failed));
        }
    }

    fn load(loader: &impl Loader<Request = &'static str, Output = u8>) -> LoadResult<u8> {
        let delivered = Arc::new(Mutex::new(None));
        let slot = delivered.clone();
        let _task = loader.load(
            "request",
            Box::new(move |result| {
                *slot.lock().unwrap() = Some(result);
            }),
        );
        let result = delivered.lock().unwrap().take();
        result.unwrap()
    }

    #[test]
    fn saves_successful_result_for_the_same_request() {
        let saves = Saves::default();
        let loader = CacheOnSuccess::new(Stub(|| Ok(7)), saves.clone());

        assert_eq!(load(&loader).unwrap(), 7);
        assert_eq!(*saves.0.lock().unwrap(), vec![(7, "request")]);
    }

    #[test]
    fn failed_save_does_not_affect_delivery() {
        let loader = CacheOnSuccess::new(Stub(|| Ok(1)), Saves::default());

        assert!(load(&loader).is_ok());
    }

    #[test]
    fn does_not_save_failures() {
        let saves = Saves::default();
        let loader = CacheOnSuccess::new(Stub(|| Err(LoadError::Connectivity)), saves.clone());

        assert!(matches!(load(&loader), Err(LoadError::Connectivity)));
        assert!(saves.0.lock().unwrap().is_empty());
    }
}
