#![warn(missing_docs)]
//! FeOxDB-backed store for feedcache.
//!
//! [`FeOxDbStore`] keeps both the cached feed record and image data in an
//! embedded FeOxDB database. Every operation, read or write, is funnelled
//! through one worker thread in issue order, so operations on a store never
//! interleave.

mod error;
mod store;

pub use error::FeOxDbError;
pub use store::{FeOxDbStore, FeOxDbStoreBuilder};
