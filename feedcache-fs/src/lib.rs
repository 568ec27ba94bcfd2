#![warn(missing_docs)]
//! File-based stores for feedcache.
//!
//! Each store keeps its whole content in one file, encoded with a
//! [`Format`](feedcache_backend::Format) (JSON by default):
//!
//! - [`FileFeedStore`] holds the single cached feed record
//! - [`FileImageDataStore`] holds a `url -> bytes` map
//!
//! Reads may run concurrently with other reads; inserts and deletes run
//! with exclusive access to the file. The lock is fair, so an operation
//! issued after a write never observes the file before that write finished.
//!
//! ```no_run
//! use feedcache_backend::FeedStore;
//! use feedcache_fs::FileFeedStore;
//!
//! # async fn run() -> Result<(), feedcache_backend::StoreError> {
//! let store = FileFeedStore::new("/var/cache/myapp/feed.store");
//! let cached = store.retrieve().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Known limitation
//!
//! Writes overwrite the file in place. A failed write may leave a partially
//! written file behind, which the next read reports as a decoding error.
//! Enable `atomic_writes` on the builder to write a temporary sibling file
//! and rename it into place instead.

mod feed;
mod file;
mod image;

pub use feed::{FileFeedStore, FileFeedStoreBuilder};
pub use image::{FileImageDataStore, FileImageDataStoreBuilder};
