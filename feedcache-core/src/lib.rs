#![warn(missing_docs)]
//! # feedcache-core
//!
//! Core traits and types for the feedcache resource loading pipeline.
//!
//! The pipeline loads two kinds of resources, a list of [`FeedItem`]s and
//! per-item image bytes, by composing interchangeable loaders:
//!
//! - **Load** a resource and get a cancellable handle back ([`Loader`], [`LoaderTask`])
//! - **Persist** a successfully loaded resource ([`Cache`])
//! - **Decide** whether a cached feed is still fresh ([`CachePolicy`])
//! - **Tell time** in a way tests can control ([`Clock`])
//! - **Dispatch** work off the caller's context ([`Offload`])
//!
//! Store contracts live in `feedcache-backend`, the loaders and composites
//! built on top of these traits live in `feedcache`.

pub mod clock;
pub mod error;
pub mod loader;
pub mod model;
pub mod offload;
pub mod policy;
pub mod task;

pub use clock::{Clock, SystemClock};
pub use error::{LoadError, LoadResult};
pub use loader::{Cache, FeedCache, FeedLoader, ImageDataCache, ImageDataLoader, Loader};
pub use model::{CachedFeed, FeedItem, ImageComment};
pub use offload::Offload;
pub use policy::CachePolicy;
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use task::{BoxTask, Completion, CompletionTask, LoaderTask};
