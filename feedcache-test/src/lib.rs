#![doc = include_str!("../README.md")]

pub mod contract;
pub mod fixtures;
pub mod http_stub;
pub mod loader_spy;
pub mod store_spy;
pub mod tracing;

pub use fixtures::{
    FixedClock, any_data, any_store_error, any_url, expired_timestamp, non_expired_timestamp,
    unique_feed, unique_item,
};
pub use http_stub::HttpClientStub;
pub use loader_spy::{CacheSpy, LoaderSpy, Recorder, load, save};
pub use store_spy::{FeedStoreMessage, FeedStoreSpy, ImageDataStoreMessage, ImageDataStoreSpy};
