//! Canned HTTP responses.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use feedcache_http::{HttpClient, HttpClientError, StatusCode};
use url::Url;

#[derive(Debug, Clone)]
enum Response {
    Ok(Bytes, StatusCode),
    Fail,
}

/// [`HttpClient`] answering from a table keyed by URL.
///
/// URLs without an entry fail like an unreachable host. Clones share the
/// table and the request log.
#[derive(Debug, Clone, Default)]
pub struct HttpClientStub {
    responses: Arc<DashMap<Url, Response>>,
    requested: Arc<Mutex<Vec<Url>>>,
}

impl HttpClientStub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `url` with `body` and `status`.
    pub fn respond(self, url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
        self.responses.insert(url, Response::Ok(body.into(), status));
        self
    }

    /// Fails every request to `url`.
    pub fn fail(self, url: Url) -> Self {
        self.responses.insert(url, Response::Fail);
        self
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<Url> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HttpClient for HttpClientStub {
    async fn get(&self, url: &Url) -> Result<(Bytes, StatusCode), HttpClientError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());

        let response = self.responses.get(url).map(|entry| entry.value().clone());
        match response {
            Some(Response::Ok(body, status)) => Ok((body, status)),
            Some(Response::Fail) | None => Err(HttpClientError::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("no route to {url}"),
            ))),
        }
    }
}
