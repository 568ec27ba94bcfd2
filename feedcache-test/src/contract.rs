//! Behaviour shared by every store backend.
//!
//! Each check takes a store that is empty when the check starts and panics
//! on the first deviation.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{TimeDelta, Utc};
use feedcache_backend::{FeedStore, ImageDataStore};
use feedcache_core::CachedFeed;
use url::Url;

use crate::fixtures::unique_feed;

fn feed(age_days: i64) -> CachedFeed {
    CachedFeed::new(unique_feed(), Utc::now() - TimeDelta::days(age_days))
}

pub async fn retrieve_delivers_empty_on_empty_cache<S: FeedStore>(store: &S) {
    assert_eq!(store.retrieve().await.unwrap(), None);
    assert_eq!(store.retrieve().await.unwrap(), None);
}

pub async fn retrieve_delivers_inserted_feed<S: FeedStore>(store: &S) {
    let inserted = feed(0);

    store.insert(inserted.clone()).await.unwrap();

    assert_eq!(store.retrieve().await.unwrap(), Some(inserted.clone()));
    assert_eq!(store.retrieve().await.unwrap(), Some(inserted));
}

pub async fn insert_replaces_previous_feed<S: FeedStore>(store: &S) {
    let first = feed(3);
    let second = feed(1);

    store.insert(first).await.unwrap();
    store.insert(second.clone()).await.unwrap();

    assert_eq!(store.retrieve().await.unwrap(), Some(second));
}

pub async fn delete_succeeds_on_empty_cache<S: FeedStore>(store: &S) {
    store.delete().await.unwrap();

    assert_eq!(store.retrieve().await.unwrap(), None);
}

pub async fn delete_empties_inserted_cache<S: FeedStore>(store: &S) {
    store.insert(feed(0)).await.unwrap();
    store.delete().await.unwrap();

    assert_eq!(store.retrieve().await.unwrap(), None);
}

/// Issues insert, delete and insert together and expects them to finish in
/// that order, leaving the second insert in place.
pub async fn side_effects_complete_in_issue_order<S: FeedStore>(store: &S) {
    let completed = Arc::new(Mutex::new(Vec::new()));
    let last = feed(0);

    let record = |step: &'static str| {
        let completed = Arc::clone(&completed);
        move |result: feedcache_backend::StoreResult<()>| {
            result.unwrap();
            completed.lock().unwrap().push(step);
        }
    };
    let (first, second, third) = (record("insert"), record("delete"), record("insert again"));

    tokio::join!(
        async { first(store.insert(feed(2)).await) },
        async { second(store.delete().await) },
        async { third(store.insert(last.clone()).await) },
    );

    assert_eq!(
        *completed.lock().unwrap(),
        vec!["insert", "delete", "insert again"]
    );
    assert_eq!(store.retrieve().await.unwrap(), Some(last));
}

pub async fn all_feed_store_checks<S: FeedStore>(fresh: impl Fn() -> S) {
    retrieve_delivers_empty_on_empty_cache(&fresh()).await;
    retrieve_delivers_inserted_feed(&fresh()).await;
    insert_replaces_previous_feed(&fresh()).await;
    delete_succeeds_on_empty_cache(&fresh()).await;
    delete_empties_inserted_cache(&fresh()).await;
}

pub async fn retrieve_data_delivers_none_for_unknown_url<S: ImageDataStore>(store: &S) {
    let url = Url::parse("https://a-url.com").unwrap();

    assert_eq!(store.retrieve_data(&url).await.unwrap(), None);
}

pub async fn retrieve_data_delivers_data_for_matching_url_only<S: ImageDataStore>(store: &S) {
    let url = Url::parse("https://a-url.com").unwrap();
    let other = Url::parse("https://another-url.com").unwrap();
    let data = Bytes::from_static(b"some data");

    store.insert_data(data.clone(), &url).await.unwrap();

    assert_eq!(store.retrieve_data(&url).await.unwrap(), Some(data));
    assert_eq!(store.retrieve_data(&other).await.unwrap(), None);
}

pub async fn insert_data_overwrites_previous_data<S: ImageDataStore>(store: &S) {
    let url = Url::parse("https://a-url.com").unwrap();
    let first = Bytes::from_static(b"first");
    let last = Bytes::from_static(b"last");

    store.insert_data(first, &url).await.unwrap();
    store.insert_data(last.clone(), &url).await.unwrap();

    assert_eq!(store.retrieve_data(&url).await.unwrap(), Some(last));
}

pub async fn all_image_store_checks<S: ImageDataStore>(fresh: impl Fn() -> S) {
    retrieve_data_delivers_none_for_unknown_url(&fresh()).await;
    retrieve_data_delivers_data_for_matching_url_only(&fresh()).await;
    insert_data_overwrites_previous_data(&fresh()).await;
}
