//! Loaders backed by a local store.
//!
//! Both loaders report through callbacks and run their store work on an
//! [`Offload`] executor, one operation at a time and in the order `load`,
//! `save` and `validate_cache` were called: the position is taken in a
//! per-loader [`StoreQueue`] before the call returns. Work in flight never
//! keeps the loader alive: it watches the loader's [`Lifetime`] and drops
//! its completion when the loader is gone by the time the store answers.

mod feed;
mod image;

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use feedcache_core::Offload;
use tracing::{Instrument, debug_span};

pub use feed::{LocalFeedLoader, LocalFeedLoaderBuilder};
pub use image::LocalImageDataLoader;

/// Liveness marker owned by a loader.
#[derive(Debug, Default)]
pub(crate) struct Lifetime(Arc<()>);

impl Lifetime {
    pub(crate) fn watch(&self) -> LifetimeWatch {
        LifetimeWatch(Arc::downgrade(&self.0))
    }
}

/// Non-owning view of a [`Lifetime`], carried by pending work.
#[derive(Debug, Clone)]
pub(crate) struct LifetimeWatch(Weak<()>);

impl LifetimeWatch {
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    draining: bool,
}

/// FIFO of store operations drained by at most one offloaded task.
///
/// The drain task exits once the queue is empty, so waiting on the
/// executor does not wait on an idle loader.
pub(crate) struct StoreQueue<O> {
    offload: O,
    kind: &'static str,
    state: Arc<Mutex<QueueState>>,
}

impl<O: Offload> StoreQueue<O> {
    pub(crate) fn new(offload: O, kind: &'static str) -> Self {
        Self {
            offload,
            kind,
            state: Arc::default(),
        }
    }

    pub(crate) fn offload(&self) -> &O {
        &self.offload
    }

    /// Appends `job`; it runs after every job pushed before it.
    pub(crate) fn push<F>(&self, op: &'static str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let start_drain = {
            let mut state = lock(&self.state);
            state
                .jobs
                .push_back(Box::pin(job.instrument(debug_span!("store_op", op))));
            !std::mem::replace(&mut state.draining, true)
        };

        if start_drain {
            self.offload.spawn(self.kind, drain(Arc::clone(&self.state)));
        }
    }
}

fn lock(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn drain(state: Arc<Mutex<QueueState>>) {
    // Reset on an aborted drain so the next push starts a new one.
    let mut guard = DrainGuard {
        state: &state,
        armed: true,
    };

    loop {
        let next = {
            let mut queue = lock(&state);
            match queue.jobs.pop_front() {
                Some(job) => job,
                None => {
                    queue.draining = false;
                    guard.armed = false;
                    return;
                }
            }
        };
        next.await;
    }
}

struct DrainGuard<'a> {
    state: &'a Mutex<QueueState>,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).draining = false;
        }
    }
}
