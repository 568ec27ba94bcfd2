//! The HTTP capability remote loaders consume.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Transport failure of an [`HttpClient`].
///
/// Any status code, including 4xx and 5xx, is a successful response at this
/// level; only failing to get a response at all is an error.
#[derive(Debug, Error)]
#[error("HTTP request failed: {0}")]
pub struct HttpClientError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl HttpClientError {
    /// Wraps a transport specific error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }
}

/// Performs GET requests.
///
/// Callable from any task; the remote loaders dispatch results onward
/// themselves.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches `url`, returning the body and the status code.
    async fn get(&self, url: &Url) -> Result<(Bytes, StatusCode), HttpClientError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn get(&self, url: &Url) -> Result<(Bytes, StatusCode), HttpClientError> {
        (**self).get(url).await
    }
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    async fn get(&self, url: &Url) -> Result<(Bytes, StatusCode), HttpClientError> {
        (**self).get(url).await
    }
}
