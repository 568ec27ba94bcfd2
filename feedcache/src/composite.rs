//! Primary/fallback composition of two loaders.
//!
//! One in-flight load moves through
//! `Primary -> [success] -> Done` or
//! `Primary -> [failure] -> Fallback -> [success | failure] -> Done`.
//! Cancelling is accepted in any running stage and forwarded to whichever
//! underlying task is current; once done it has no effect.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use feedcache_core::{BoxTask, Completion, CompletionTask, Loader, LoaderTask};
use tracing::debug;

/// Loads from `primary` and, only if that fails, once from `fallback`.
///
/// Results are delivered unchanged; there is no further retry. The fallback
/// receives the same request as the primary did.
///
/// The composite holds its fallback strongly and in-flight loads hold it
/// weakly: when the composite is dropped before the primary fails, the
/// fallback is never started.
#[derive(Debug)]
pub struct FallbackComposite<P, F> {
    primary: P,
    fallback: Arc<F>,
}

impl<P, F> FallbackComposite<P, F> {
    /// Composes `primary` with `fallback`.
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback: Arc::new(fallback),
        }
    }

    /// The loader tried first.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// The loader tried after the primary failed.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<P, F> Loader for FallbackComposite<P, F>
where
    P: Loader,
    F: Loader<Request = P::Request, Output = P::Output> + 'static,
{
    type Request = P::Request;
    type Output = P::Output;

    fn load(&self, request: P::Request, completion: Completion<P::Output>) -> BoxTask {
        let delivery = CompletionTask::new(completion);
        let state = Arc::new(TaskSlot::default());
        let fallback = Arc::downgrade(&self.fallback);

        let on_primary: Completion<P::Output> = {
            let delivery = delivery.clone();
            let state = Arc::clone(&state);
            let request = request.clone();
            Box::new(move |result| match result {
                Ok(output) => {
                    state.finish();
                    delivery.complete(Ok(output));
                }
                Err(error) => {
                    let Some(fallback) = fallback.upgrade() else {
                        debug!(%error, "primary load failed after the composite was dropped");
                        return;
                    };
                    if !state.begin_fallback() {
                        return;
                    }
                    debug!(%error, "primary load failed, loading fallback");

                    let on_fallback: Completion<P::Output> = {
                        let state = Arc::clone(&state);
                        let delivery = delivery.clone();
                        Box::new(move |result| {
                            state.finish();
                            delivery.complete(result);
                        })
                    };
                    state.attach_fallback(fallback.load(request, on_fallback));
                }
            })
        };

        state.attach_primary(self.primary.load(request, on_primary));

        Box::new(FallbackTask { state, delivery })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Primary,
    Fallback,
    Done,
}

struct Slot {
    task: Option<Arc<dyn LoaderTask>>,
    stage: Stage,
    cancelled: bool,
}

/// The single point of mutation shared by one load and its task handle.
struct TaskSlot {
    slot: Mutex<Slot>,
}

impl Default for TaskSlot {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot {
                task: None,
                stage: Stage::Primary,
                cancelled: false,
            }),
        }
    }
}

impl TaskSlot {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach_primary(&self, task: BoxTask) {
        let task: Arc<dyn LoaderTask> = Arc::from(task);
        let cancel_now = {
            let mut slot = self.lock();
            match slot.stage {
                // A primary that already failed or succeeded synchronously
                // must not replace the fallback's task.
                Stage::Fallback | Stage::Done => return,
                Stage::Primary if slot.cancelled => true,
                Stage::Primary => {
                    slot.task = Some(Arc::clone(&task));
                    false
                }
            }
        };
        if cancel_now {
            task.cancel();
        }
    }

    /// Returns `false` when the load was cancelled and the fallback must not start.
    fn begin_fallback(&self) -> bool {
        let mut slot = self.lock();
        if slot.cancelled || slot.stage != Stage::Primary {
            return false;
        }
        slot.stage = Stage::Fallback;
        slot.task = None;
        true
    }

    fn attach_fallback(&self, task: BoxTask) {
        let task: Arc<dyn LoaderTask> = Arc::from(task);
        let cancel_now = {
            let mut slot = self.lock();
            match slot.stage {
                Stage::Done => false,
                _ if slot.cancelled => true,
                _ => {
                    slot.task = Some(Arc::clone(&task));
                    false
                }
            }
        };
        if cancel_now {
            debug!("load cancelled before fallback started, cancelling fallback");
            task.cancel();
        }
    }

    fn finish(&self) {
        let mut slot = self.lock();
        slot.stage = Stage::Done;
        slot.task = None;
    }

    fn cancel(&self) {
        let current = {
            let mut slot = self.lock();
            if slot.stage == Stage::Done {
                return;
            }
            slot.cancelled = true;
            slot.task.take()
        };
        if let Some(task) = current {
            task.cancel();
        }
    }
}

/// Task returned by [`FallbackComposite::load`].
struct FallbackTask<T> {
    state: Arc<TaskSlot>,
    delivery: CompletionTask<T>,
}

impl<T: Send> LoaderTask for FallbackTask<T> {
    fn cancel(&self) {
        self.delivery.cancel();
        self.state.cancel();
    }
}
