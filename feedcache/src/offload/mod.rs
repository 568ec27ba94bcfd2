//! Background execution of loader work.
//!
//! Loaders hand every store operation to an [`Offload`](feedcache_core::Offload)
//! executor and return to the caller right away. [`OffloadManager`] is the
//! default executor: it spawns tokio tasks, keeps their handles so they can
//! be awaited or aborted, and applies an optional [`TimeoutPolicy`].
//!
//! # Example
//!
//! ```ignore
//! use feedcache::offload::{OffloadConfig, OffloadManager};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//!
//! manager.spawn("feed_load", async {
//!     // store work
//! });
//! manager.wait_all().await;
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
