//! Cancellation handles for in-flight loads.
//!
//! Every load returns a [`LoaderTask`] synchronously, before its completion
//! can fire. Cancelling the task guarantees the completion is never
//! invoked, even when the underlying work finishes later.
//!
//! [`CompletionTask`] is the building block loaders use for that: it owns
//! the completion in a slot that is emptied either by delivering a result
//! or by cancelling, whichever happens first.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::LoadResult;

/// Callback receiving the outcome of an operation.
pub type Completion<T> = Box<dyn FnOnce(LoadResult<T>) + Send + 'static>;

/// Boxed task returned by loaders.
pub type BoxTask = Box<dyn LoaderTask>;

/// Handle to an in-flight load.
pub trait LoaderTask: Send + Sync {
    /// Prevents the completion from being invoked.
    ///
    /// Idempotent. Has no effect once the result was delivered.
    fn cancel(&self);
}

impl<T: LoaderTask + ?Sized> LoaderTask for Box<T> {
    fn cancel(&self) {
        (**self).cancel()
    }
}

impl<T: LoaderTask + ?Sized> LoaderTask for Arc<T> {
    fn cancel(&self) {
        (**self).cancel()
    }
}

/// Task backed by a completion slot.
///
/// Clones share the slot: the loader keeps one clone to deliver through,
/// the caller gets another to cancel with. Cancelling drops the completion
/// right away, releasing whatever it captured.
pub struct CompletionTask<T> {
    slot: Arc<Mutex<Option<Completion<T>>>>,
}

impl<T> CompletionTask<T> {
    /// Wraps `completion` into a fresh task.
    pub fn new(completion: Completion<T>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(completion))),
        }
    }

    /// Delivers `result` unless the task was cancelled or already completed.
    ///
    /// Returns whether the completion was invoked. The completion runs
    /// outside the slot lock, so it may freely cancel or inspect this task.
    pub fn complete(&self, result: LoadResult<T>) -> bool {
        let completion = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match completion {
            Some(completion) => {
                completion(result);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once the completion was delivered or cancelled.
    pub fn is_finished(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T> Clone for CompletionTask<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for CompletionTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTask")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<T> LoaderTask for CompletionTask<T>
where
    T: Send,
{
    fn cancel(&self) {
        let completion = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(completion);
    }
}
