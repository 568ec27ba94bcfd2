use async_trait::async_trait;
use bytes::Bytes;
use feedcache_http::{HttpClient, HttpClientError, StatusCode};
use url::Url;

/// Performs GET requests with a shared [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Wraps a configured client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Client> for ReqwestClient {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    #[tracing::instrument(skip(self), fields(url = %url), level = "trace")]
    async fn get(&self, url: &Url) -> Result<(Bytes, StatusCode), HttpClientError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(HttpClientError::new)?;
        let status = response.status();
        let body = response.bytes().await.map_err(HttpClientError::new)?;
        Ok((body, status))
    }
}
