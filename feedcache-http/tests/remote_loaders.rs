use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use feedcache_core::{LoadError, LoadResult, Loader, LoaderTask};
use feedcache_http::{
    FeedItemsMapper, HttpClient, HttpClientError, RemoteImageDataLoader, RemoteLoader, StatusCode,
};
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;
use url::Url;

/// Client answering with a preset response and recording requested URLs.
struct ClientStub {
    response: Result<(Bytes, StatusCode), String>,
    requested: Mutex<Vec<Url>>,
}

impl ClientStub {
    fn responding(body: &'static [u8], status: u16) -> Self {
        Self {
            response: Ok((
                Bytes::from_static(body),
                StatusCode::from_u16(status).unwrap(),
            )),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            response: Err("connection refused".to_owned()),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpClient for ClientStub {
    async fn get(&self, url: &Url) -> Result<(Bytes, StatusCode), HttpClientError> {
        self.requested.lock().unwrap().push(url.clone());
        self.response
            .clone()
            .map_err(|message| HttpClientError::new(std::io::Error::other(message)))
    }
}

fn url() -> Url {
    Url::parse("https://a-url.com/resource").unwrap()
}

async fn load<L: Loader>(loader: &L, request: L::Request) -> LoadResult<L::Output> {
    let (sender, receiver) = oneshot::channel();
    let _task = loader.load(
        request,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    receiver.await.unwrap()
}

fn empty_feed() -> ClientStub {
    ClientStub::responding(br#"{"items":[]}"#, 200)
}

#[tokio::test]
async fn remote_loader_requests_its_url() {
    let client = Arc::new(empty_feed());
    let loader = RemoteLoader::new(url(), Arc::clone(&client), FeedItemsMapper);

    assert_eq!(load(&loader, ()).await.unwrap(), Vec::new());
    assert_eq!(*client.requested.lock().unwrap(), vec![url()]);
}

#[tokio::test]
async fn remote_loader_delivers_connectivity_on_client_error() {
    let loader = RemoteLoader::new(url(), ClientStub::failing(), FeedItemsMapper);

    assert!(matches!(load(&loader, ()).await, Err(LoadError::Connectivity)));
}

#[tokio::test]
async fn remote_loader_delivers_invalid_data_on_mapper_error() {
    let not_found = ClientStub::responding(br#"{"items":[]}"#, 404);
    let non_2xx = RemoteLoader::new(url(), not_found, FeedItemsMapper);
    let not_json = ClientStub::responding(b"not json", 200);
    let malformed = RemoteLoader::new(url(), not_json, FeedItemsMapper);

    assert!(matches!(load(&non_2xx, ()).await, Err(LoadError::InvalidData)));
    assert!(matches!(load(&malformed, ()).await, Err(LoadError::InvalidData)));
}

#[tokio::test]
async fn cancelled_remote_load_delivers_nothing() {
    let loader = RemoteLoader::new(url(), empty_feed(), FeedItemsMapper);
    let (sender, receiver) = oneshot::channel::<LoadResult<_>>();

    let task = loader.load(
        (),
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    task.cancel();

    assert!(receiver.await.is_err());
}

#[tokio::test]
async fn image_loader_delivers_data_for_200_with_body() {
    let loader = RemoteImageDataLoader::new(ClientStub::responding(b"image", 200));

    assert_eq!(
        load(&loader, url()).await.unwrap(),
        Bytes::from_static(b"image")
    );
}

#[tokio::test]
async fn image_loader_rejects_empty_body_and_non_200() {
    let empty = RemoteImageDataLoader::new(ClientStub::responding(b"", 200));
    let created = RemoteImageDataLoader::new(ClientStub::responding(b"image", 201));

    assert!(matches!(load(&empty, url()).await, Err(LoadError::InvalidData)));
    assert!(matches!(load(&created, url()).await, Err(LoadError::InvalidData)));
}

#[tokio::test]
async fn image_loader_delivers_connectivity_on_client_error() {
    let loader = RemoteImageDataLoader::new(ClientStub::failing());

    assert!(matches!(load(&loader, url()).await, Err(LoadError::Connectivity)));
}
