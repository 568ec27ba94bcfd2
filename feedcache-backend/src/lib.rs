//! Traits and structs for feedcache store interaction.
//!
//! If you want to implement your own store, you are in the right place:
//! implement [`FeedStore`] and/or [`ImageDataStore`] and report failures as
//! [`StoreError`]. Record encodings shared by the file-based backends live in
//! [`format`].
mod error;
pub mod format;
mod store;

pub use error::StoreError;
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};
pub use store::{FeedStore, ImageDataStore, StoreResult};
