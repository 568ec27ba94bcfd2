//! Store doubles recording every message and answering only when told to.
//!
//! Each store call parks until the test completes it by index, so tests
//! decide exactly when (and whether) the store answers. Tests wait for the
//! calls to arrive with `wait_for_messages`, since loaders reach their store
//! from offloaded tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use feedcache_backend::{FeedStore, ImageDataStore, StoreError, StoreResult};
use feedcache_core::CachedFeed;
use tokio::sync::{oneshot, watch};
use url::Url;

use crate::fixtures::any_store_error;

type Reply<T> = oneshot::Sender<StoreResult<T>>;

/// Pending replies of one kind of store call, in arrival order.
struct Pending<T> {
    replies: Mutex<Vec<Option<Reply<T>>>>,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Pending<T> {
    fn push(&self) -> oneshot::Receiver<StoreResult<T>> {
        let (reply, receiver) = oneshot::channel();
        lock(&self.replies).push(Some(reply));
        receiver
    }

    #[track_caller]
    fn complete(&self, index: usize, result: StoreResult<T>) {
        let reply = lock(&self.replies)
            .get_mut(index)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("no pending call at index {index}"));
        let _ = reply.send(result);
    }
}

async fn answer<T>(receiver: oneshot::Receiver<StoreResult<T>>) -> StoreResult<T> {
    receiver.await.unwrap_or(Err(StoreError::Closed))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Log of messages with a counter tests can wait on.
struct Journal<M> {
    messages: Mutex<Vec<M>>,
    count: watch::Sender<usize>,
}

impl<M: Clone> Journal<M> {
    fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            count: watch::Sender::new(0),
        }
    }

    fn record(&self, message: M) {
        let count = {
            let mut messages = lock(&self.messages);
            messages.push(message);
            messages.len()
        };
        self.count.send_replace(count);
    }

    fn messages(&self) -> Vec<M> {
        lock(&self.messages).clone()
    }

    async fn wait_for(&self, count: usize) {
        let mut receiver = self.count.subscribe();
        let _ = receiver.wait_for(|received| *received >= count).await;
    }
}

/// Message received by a [`FeedStoreSpy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStoreMessage {
    Retrieve,
    Insert(CachedFeed),
    Delete,
}

struct FeedStoreState {
    journal: Journal<FeedStoreMessage>,
    retrievals: Pending<Option<CachedFeed>>,
    insertions: Pending<()>,
    deletions: Pending<()>,
}

/// [`FeedStore`] double. Clones share the same log and pending calls.
#[derive(Clone)]
pub struct FeedStoreSpy {
    state: Arc<FeedStoreState>,
}

impl Default for FeedStoreSpy {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedStoreSpy {
    pub fn new() -> Self {
        Self {
            state: Arc::new(FeedStoreState {
                journal: Journal::new(),
                retrievals: Pending::default(),
                insertions: Pending::default(),
                deletions: Pending::default(),
            }),
        }
    }

    pub fn messages(&self) -> Vec<FeedStoreMessage> {
        self.state.journal.messages()
    }

    /// Waits until at least `count` messages were received.
    pub async fn wait_for_messages(&self, count: usize) {
        self.state.journal.wait_for(count).await
    }

    pub fn complete_retrieval(&self, index: usize, result: StoreResult<Option<CachedFeed>>) {
        self.state.retrievals.complete(index, result)
    }

    pub fn complete_retrieval_with_error(&self, index: usize) {
        self.complete_retrieval(index, Err(any_store_error()))
    }

    pub fn complete_retrieval_with_empty_cache(&self, index: usize) {
        self.complete_retrieval(index, Ok(None))
    }

    pub fn complete_retrieval_with(&self, index: usize, feed: CachedFeed) {
        self.complete_retrieval(index, Ok(Some(feed)))
    }

    pub fn complete_insertion(&self, index: usize) {
        self.state.insertions.complete(index, Ok(()))
    }

    pub fn complete_insertion_with_error(&self, index: usize) {
        self.state.insertions.complete(index, Err(any_store_error()))
    }

    pub fn complete_deletion(&self, index: usize) {
        self.state.deletions.complete(index, Ok(()))
    }

    pub fn complete_deletion_with_error(&self, index: usize) {
        self.state.deletions.complete(index, Err(any_store_error()))
    }
}

#[async_trait]
impl FeedStore for FeedStoreSpy {
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        let reply = self.state.retrievals.push();
        self.state.journal.record(FeedStoreMessage::Retrieve);
        answer(reply).await
    }

    async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
        let reply = self.state.insertions.push();
        self.state.journal.record(FeedStoreMessage::Insert(feed));
        answer(reply).await
    }

    async fn delete(&self) -> StoreResult<()> {
        let reply = self.state.deletions.push();
        self.state.journal.record(FeedStoreMessage::Delete);
        answer(reply).await
    }

    fn name(&self) -> &str {
        "spy"
    }
}

/// Message received by an [`ImageDataStoreSpy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDataStoreMessage {
    Retrieve(Url),
    Insert(Bytes, Url),
}

struct ImageDataStoreState {
    journal: Journal<ImageDataStoreMessage>,
    retrievals: Pending<Option<Bytes>>,
    insertions: Pending<()>,
}

/// [`ImageDataStore`] double. Clones share the same log and pending calls.
#[derive(Clone)]
pub struct ImageDataStoreSpy {
    state: Arc<ImageDataStoreState>,
}

impl Default for ImageDataStoreSpy {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageDataStoreSpy {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ImageDataStoreState {
                journal: Journal::new(),
                retrievals: Pending::default(),
                insertions: Pending::default(),
            }),
        }
    }

    pub fn messages(&self) -> Vec<ImageDataStoreMessage> {
        self.state.journal.messages()
    }

    pub async fn wait_for_messages(&self, count: usize) {
        self.state.journal.wait_for(count).await
    }

    pub fn complete_retrieval(&self, index: usize, result: StoreResult<Option<Bytes>>) {
        self.state.retrievals.complete(index, result)
    }

    pub fn complete_retrieval_with_error(&self, index: usize) {
        self.complete_retrieval(index, Err(any_store_error()))
    }

    pub fn complete_retrieval_with(&self, index: usize, data: Option<Bytes>) {
        self.complete_retrieval(index, Ok(data))
    }

    pub fn complete_insertion(&self, index: usize) {
        self.state.insertions.complete(index, Ok(()))
    }

    pub fn complete_insertion_with_error(&self, index: usize) {
        self.state.insertions.complete(index, Err(any_store_error()))
    }
}

#[async_trait]
impl ImageDataStore for ImageDataStoreSpy {
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        let reply = self.state.retrievals.push();
        self.state
            .journal
            .record(ImageDataStoreMessage::Retrieve(url.clone()));
        answer(reply).await
    }

    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()> {
        let reply = self.state.insertions.push();
        self.state
            .journal
            .record(ImageDataStoreMessage::Insert(data, url.clone()));
        answer(reply).await
    }

    fn name(&self) -> &str {
        "spy"
    }
}
