#![warn(missing_docs)]
//! [`HttpClient`](feedcache_http::HttpClient) backed by [`reqwest`].
//!
//! ```no_run
//! use feedcache_http::{FeedEndpoint, FeedItemsMapper, RemoteLoader};
//! use feedcache_reqwest::ReqwestClient;
//! use url::Url;
//!
//! let base = Url::parse("https://feed.example.com").unwrap();
//! let remote = RemoteLoader::new(
//!     FeedEndpoint::Get.url(&base),
//!     ReqwestClient::new(feedcache_reqwest::reqwest::Client::new()),
//!     FeedItemsMapper,
//! );
//! ```

mod client;

pub use client::ReqwestClient;
pub use reqwest;
