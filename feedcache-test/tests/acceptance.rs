//! End-to-end scenarios over the feed pipeline.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use feedcache::composer::{local_with_remote_fallback, remote_with_local_fallback};
use feedcache::{
    CacheOnSuccess, CachedFeed, Clock, FallbackComposite, FeedItem, FeedStore, LoadError, Loader,
    LocalFeedLoader, LocalImageDataLoader, OffloadManager,
};
use feedcache_fs::{FileFeedStore, FileImageDataStore};
use feedcache_http::{
    FeedEndpoint, FeedItemsMapper, RemoteFeedLoader, RemoteImageDataLoader, StatusCode,
};
use feedcache_test::{
    CacheSpy, FeedStoreMessage, FeedStoreSpy, FixedClock, HttpClientStub, LoaderSpy, load,
    unique_feed, unique_item,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::oneshot;
use url::Url;

type LocalLoader = LocalFeedLoader<FeedStoreSpy, FixedClock>;

fn local_loader(store: FeedStoreSpy) -> (LocalLoader, FixedClock, OffloadManager) {
    feedcache_test::tracing::init();
    let clock = FixedClock::new(Utc::now());
    let offload = OffloadManager::default();
    let loader = LocalFeedLoader::builder(store)
        .clock(clock.clone())
        .offload(offload.clone())
        .build();
    (loader, clock, offload)
}

async fn load_with_stored(
    store: &FeedStoreSpy,
    loader: &LocalLoader,
    stored: Option<CachedFeed>,
) -> Vec<FeedItem> {
    let (sender, receiver) = oneshot::channel();
    let _task = loader.load(
        (),
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    store.wait_for_messages(1).await;
    store.complete_retrieval(0, Ok(stored));
    receiver.await.unwrap().unwrap()
}

#[tokio::test]
async fn empty_store_delivers_empty_feed_without_deleting() {
    let store = FeedStoreSpy::new();
    let (loader, _, offload) = local_loader(store.clone());

    let items = load_with_stored(&store, &loader, None).await;
    offload.wait_all().await;

    assert_eq!(items, vec![]);
    assert_eq!(store.messages(), vec![FeedStoreMessage::Retrieve]);
}

#[tokio::test]
async fn six_day_old_feed_is_delivered() {
    let store = FeedStoreSpy::new();
    let (loader, clock, _) = local_loader(store.clone());
    let item = unique_item();
    let stored = CachedFeed::new(vec![item.clone()], clock.now() - TimeDelta::days(6));

    let items = load_with_stored(&store, &loader, Some(stored)).await;

    assert_eq!(items, vec![item]);
}

#[tokio::test]
async fn eight_day_old_feed_is_empty_and_deleted_on_validation() {
    let store = FeedStoreSpy::new();
    let (loader, clock, _) = local_loader(store.clone());
    let stored = CachedFeed::new(vec![unique_item()], clock.now() - TimeDelta::days(8));

    let items = load_with_stored(&store, &loader, Some(stored.clone())).await;
    assert_eq!(items, vec![]);

    let (sender, validated) = oneshot::channel();
    loader.validate_cache(Box::new(move |result| {
        let _ = sender.send(result);
    }));
    store.wait_for_messages(2).await;
    store.complete_retrieval_with(1, stored);
    store.wait_for_messages(3).await;
    store.complete_deletion(0);

    assert!(validated.await.unwrap().is_ok());
    assert_eq!(
        store.messages(),
        vec![
            FeedStoreMessage::Retrieve,
            FeedStoreMessage::Retrieve,
            FeedStoreMessage::Delete,
        ]
    );
}

#[tokio::test]
async fn failing_remote_falls_back_to_local_feed_without_caching() {
    feedcache_test::tracing::init();
    let dir = TempDir::new().unwrap();
    let store = FileFeedStore::new(dir.path().join("feed.json"));
    let clock = FixedClock::new(Utc::now());
    let local_items = vec![unique_item()];
    store
        .insert(CachedFeed::new(local_items.clone(), clock.now()))
        .await
        .unwrap();

    let remote = LoaderSpy::<(), Vec<FeedItem>>::new();
    let cache = CacheSpy::new();
    let local = LocalFeedLoader::builder(store).clock(clock).build();
    let sut = FallbackComposite::new(CacheOnSuccess::new(remote.clone(), cache.clone()), local);

    let (sender, receiver) = oneshot::channel();
    let _task = sut.load(
        (),
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    remote.complete_with_error(0, LoadError::Connectivity);

    assert_eq!(receiver.await.unwrap().unwrap(), local_items);
    assert_eq!(cache.saves(), vec![]);
}

fn feed_body(items: &[FeedItem]) -> String {
    let items: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                r#"{{"id":"{}","description":"{}","image":"{}"}}"#,
                item.id,
                item.description.as_deref().unwrap_or_default(),
                item.url,
            )
        })
        .collect();
    format!(r#"{{"items":[{}]}}"#, items.join(","))
}

#[tokio::test]
async fn remote_feed_over_http_is_cached_for_offline_use() {
    feedcache_test::tracing::init();
    let dir = TempDir::new().unwrap();
    let base = Url::parse("https://feed.example.com").unwrap();
    let feed_url = FeedEndpoint::Get.url(&base);
    let offload = OffloadManager::default();
    let items: Vec<FeedItem> = unique_feed()
        .into_iter()
        .map(|item| FeedItem::new(item.id, item.description, None, item.url))
        .collect();

    let local = Arc::new(
        LocalFeedLoader::builder(FileFeedStore::new(dir.path().join("feed.json")))
            .offload(offload.clone())
            .build(),
    );
    let online = HttpClientStub::new().respond(feed_url.clone(), StatusCode::OK, feed_body(&items));
    let remote = RemoteFeedLoader::with_offload(
        feed_url.clone(),
        online.clone(),
        FeedItemsMapper,
        offload.clone(),
    );

    let pipeline = remote_with_local_fallback(remote, Arc::clone(&local));
    assert_eq!(load(&pipeline, ()).await.unwrap(), items);
    offload.wait_all().await;

    let offline = HttpClientStub::new().fail(feed_url.clone());
    let remote = RemoteFeedLoader::new(feed_url.clone(), offline.clone(), FeedItemsMapper);
    let pipeline = remote_with_local_fallback(remote, local);

    assert_eq!(load(&pipeline, ()).await.unwrap(), items);
    assert_eq!(online.requested_urls(), vec![feed_url.clone()]);
    assert_eq!(offline.requested_urls(), vec![feed_url]);
}

#[tokio::test]
async fn image_is_fetched_once_then_served_from_disk() {
    feedcache_test::tracing::init();
    let dir = TempDir::new().unwrap();
    let url = Url::parse("https://images.example.com/1.png").unwrap();
    let offload = OffloadManager::default();

    let local = Arc::new(LocalImageDataLoader::with_offload(
        FileImageDataStore::new(dir.path().join("images.json")),
        offload.clone(),
    ));
    let client = HttpClientStub::new().respond(url.clone(), StatusCode::OK, "png bytes");
    let remote = RemoteImageDataLoader::with_offload(client.clone(), offload.clone());
    let pipeline = local_with_remote_fallback(local, remote);

    assert_eq!(load(&pipeline, url.clone()).await.unwrap(), "png bytes");
    offload.wait_all().await;
    assert_eq!(load(&pipeline, url.clone()).await.unwrap(), "png bytes");

    assert_eq!(client.requested_urls(), vec![url]);
}

#[tokio::test]
async fn image_with_empty_remote_body_is_invalid_and_not_cached() {
    feedcache_test::tracing::init();
    let dir = TempDir::new().unwrap();
    let url = Url::parse("https://images.example.com/empty.png").unwrap();
    let store = FileImageDataStore::new(dir.path().join("images.json"));

    let local = Arc::new(LocalImageDataLoader::new(store.clone()));
    let client = HttpClientStub::new().respond(url.clone(), StatusCode::OK, "");
    let pipeline = local_with_remote_fallback(local, RemoteImageDataLoader::new(client));

    let result = load(&pipeline, url.clone()).await;

    assert!(matches!(result, Err(LoadError::InvalidData)));
    assert_eq!(
        feedcache::ImageDataStore::retrieve_data(&store, &url).await.unwrap(),
        None
    );
}
