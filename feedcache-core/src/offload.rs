//! Where loader work runs.
//!
//! Loaders never run store or network work on the caller's context. They
//! hand a future to an [`Offload`] implementation and return immediately.
//! The primary implementation is `OffloadManager` in the `feedcache` crate.

use std::future::Future;

use smol_str::SmolStr;

/// Executor for loader work.
///
/// Loaders keep a clone per loader, so clones are expected to share their
/// bookkeeping.
///
/// # Example
///
/// ```ignore
/// use feedcache_core::Offload;
///
/// fn refresh<O: Offload>(offload: &O) {
///     offload.spawn("feed_load", async move {
///         // talk to the store
///     });
/// }
/// ```
pub trait Offload: Send + Sync + Clone + 'static {
    /// Runs `future` detached from the caller. `kind` labels the work in
    /// logs, e.g. `"feed_load"`.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
