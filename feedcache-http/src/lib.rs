#![warn(missing_docs)]
//! Remote loaders for feedcache.
//!
//! The network is consumed through one capability, [`HttpClient::get`],
//! returning the body and status code of a response. On top of it:
//!
//! - [`FeedEndpoint`] and [`ImageCommentsEndpoint`] build resource URLs
//! - [`FeedItemsMapper`] and [`ImageCommentsMapper`] decode `{"items": [...]}` payloads
//! - [`RemoteLoader`] and [`RemoteImageDataLoader`] implement
//!   [`Loader`](feedcache_core::Loader), so they slot into
//!   [`FallbackComposite`](feedcache::FallbackComposite) and
//!   [`CacheOnSuccess`](feedcache::CacheOnSuccess) like any local loader.
//!
//! ```ignore
//! use feedcache_http::{FeedEndpoint, FeedItemsMapper, RemoteLoader};
//!
//! let remote = RemoteLoader::new(FeedEndpoint::Get.url(&base_url), client, FeedItemsMapper);
//! ```

mod client;
mod endpoint;
mod mapper;
mod remote;

pub use client::{HttpClient, HttpClientError};
pub use endpoint::{FeedEndpoint, ImageCommentsEndpoint};
pub use http::StatusCode;
pub use mapper::{FeedItemsMapper, ImageCommentsMapper, Mapper, MapperError};
pub use remote::{
    RemoteFeedLoader, RemoteImageCommentsLoader, RemoteImageDataLoader, RemoteLoader,
};
