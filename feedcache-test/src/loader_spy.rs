//! Doubles for either side of a loader composition.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use feedcache_core::{
    BoxTask, Cache, Completion, CompletionTask, LoadError, LoadResult, Loader, LoaderTask,
};
use tokio::sync::{oneshot, watch};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct LoaderState<R, T> {
    loads: Mutex<Vec<(R, CompletionTask<T>)>>,
    count: watch::Sender<usize>,
    cancels: AtomicUsize,
}

/// [`Loader`] whose loads stay pending until the test completes them.
///
/// Clones share the same recorded loads.
pub struct LoaderSpy<R, T> {
    state: Arc<LoaderState<R, T>>,
}

impl<R, T> Clone for LoaderSpy<R, T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R, T> Default for LoaderSpy<R, T> {
    fn default() -> Self {
        Self {
            state: Arc::new(LoaderState {
                loads: Mutex::new(Vec::new()),
                count: watch::Sender::new(0),
                cancels: AtomicUsize::new(0),
            }),
        }
    }
}

impl<R: Clone, T> LoaderSpy<R, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<R> {
        lock(&self.state.loads)
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub fn load_count(&self) -> usize {
        lock(&self.state.loads).len()
    }

    /// Number of `cancel` calls on the returned tasks.
    pub fn cancel_count(&self) -> usize {
        self.state.cancels.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` loads were received.
    pub async fn wait_for_loads(&self, count: usize) {
        let mut receiver = self.state.count.subscribe();
        let _ = receiver.wait_for(|loads| *loads >= count).await;
    }

    /// Answers load number `index`. Returns `false` if it was cancelled.
    #[track_caller]
    pub fn complete(&self, index: usize, result: LoadResult<T>) -> bool {
        let task = lock(&self.state.loads)
            .get(index)
            .map(|(_, task)| task.clone())
            .unwrap_or_else(|| panic!("no load at index {index}"));
        task.complete(result)
    }

    pub fn complete_with(&self, index: usize, output: T) -> bool {
        self.complete(index, Ok(output))
    }

    pub fn complete_with_error(&self, index: usize, error: LoadError) -> bool {
        self.complete(index, Err(error))
    }
}

struct SpyTask<T> {
    inner: CompletionTask<T>,
    cancels: Arc<dyn Fn() + Send + Sync>,
}

impl<T: Send> LoaderTask for SpyTask<T> {
    fn cancel(&self) {
        (self.cancels)();
        self.inner.cancel();
    }
}

impl<R, T> Loader for LoaderSpy<R, T>
where
    R: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    type Request = R;
    type Output = T;

    fn load(&self, request: R, completion: Completion<T>) -> BoxTask {
        let task = CompletionTask::new(completion);
        let count = {
            let mut loads = lock(&self.state.loads);
            loads.push((request, task.clone()));
            loads.len()
        };
        self.state.count.send_replace(count);

        let state = Arc::clone(&self.state);
        Box::new(SpyTask {
            inner: task,
            cancels: Arc::new(move || {
                state.cancels.fetch_add(1, Ordering::SeqCst);
            }),
        })
    }
}

struct CacheState<P, R> {
    saves: Mutex<Vec<(P, R)>>,
    failing: Mutex<Option<fn() -> LoadError>>,
}

/// [`Cache`] recording every save and answering at once.
///
/// Saves succeed unless [`failing_with`](Self::failing_with) was set.
pub struct CacheSpy<P, R> {
    state: Arc<CacheState<P, R>>,
}

impl<P, R> Clone for CacheSpy<P, R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<P, R> Default for CacheSpy<P, R> {
    fn default() -> Self {
        Self {
            state: Arc::new(CacheState {
                saves: Mutex::new(Vec::new()),
                failing: Mutex::new(None),
            }),
        }
    }
}

impl<P: Clone, R: Clone> CacheSpy<P, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following save fail with `error()`.
    pub fn failing_with(self, error: fn() -> LoadError) -> Self {
        *lock(&self.state.failing) = Some(error);
        self
    }

    pub fn saves(&self) -> Vec<(P, R)> {
        lock(&self.state.saves).clone()
    }

    pub fn saved_payloads(&self) -> Vec<P> {
        lock(&self.state.saves)
            .iter()
            .map(|(payload, _)| payload.clone())
            .collect()
    }
}

impl<P, R> Cache for CacheSpy<P, R>
where
    P: Send + 'static,
    R: Send + 'static,
{
    type Request = R;
    type Payload = P;

    fn save(&self, payload: P, request: R, completion: Completion<()>) {
        lock(&self.state.saves).push((payload, request));
        let failing = *lock(&self.state.failing);
        completion(match failing {
            Some(error) => Err(error()),
            None => Ok(()),
        });
    }
}

/// Collects every result delivered to the completions it hands out.
pub struct Recorder<T> {
    delivered: Arc<Mutex<Vec<LoadResult<T>>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            delivered: Arc::clone(&self.delivered),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completion(&self) -> Completion<T> {
        let delivered = Arc::clone(&self.delivered);
        Box::new(move |result| lock(&delivered).push(result))
    }

    pub fn count(&self) -> usize {
        lock(&self.delivered).len()
    }

    pub fn take(&self) -> Vec<LoadResult<T>> {
        std::mem::take(&mut *lock(&self.delivered))
    }
}

/// Loads once and waits for the result.
///
/// Panics when the completion is dropped without being called.
pub async fn load<L: Loader>(loader: &L, request: L::Request) -> LoadResult<L::Output> {
    let (sender, receiver) = oneshot::channel();
    let _task = loader.load(
        request,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    receiver.await.expect("completion dropped without delivery")
}

/// Saves once and waits for the result.
///
/// Panics when the completion is dropped without being called.
pub async fn save<C: Cache>(cache: &C, payload: C::Payload, request: C::Request) -> LoadResult<()> {
    let (sender, receiver) = oneshot::channel();
    cache.save(
        payload,
        request,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    receiver.await.expect("completion dropped without delivery")
}
