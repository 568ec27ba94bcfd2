use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use feedcache_backend::{FeedStore, Format, JsonFormat, StoreResult};
use feedcache_core::CachedFeed;

use crate::file::LockedFile;

/// Feed store keeping the cached feed record in one file.
///
/// Clones share the same file and the same lock.
#[derive(Debug, Clone)]
pub struct FileFeedStore<F = JsonFormat>
where
    F: Format,
{
    file: Arc<LockedFile>,
    format: F,
    name: String,
}

impl FileFeedStore<JsonFormat> {
    /// JSON encoded store at `path`, non-atomic writes.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::builder(path).build()
    }

    /// Starts building a store at `path`.
    pub fn builder(path: impl AsRef<Path>) -> FileFeedStoreBuilder<JsonFormat> {
        FileFeedStoreBuilder {
            path: path.as_ref().to_path_buf(),
            atomic_writes: false,
            format: JsonFormat,
            name: "file".to_owned(),
        }
    }
}

impl<F: Format> FileFeedStore<F> {
    /// Location of the store file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Builder for [`FileFeedStore`].
pub struct FileFeedStoreBuilder<F = JsonFormat> {
    path: PathBuf,
    atomic_writes: bool,
    format: F,
    name: String,
}

impl<F: Format> FileFeedStoreBuilder<F> {
    /// Record encoding. JSON (default) keeps the file readable.
    pub fn format<NewF: Format>(self, format: NewF) -> FileFeedStoreBuilder<NewF> {
        FileFeedStoreBuilder {
            path: self.path,
            atomic_writes: self.atomic_writes,
            format,
            name: self.name,
        }
    }

    /// Write to a temporary sibling file and rename it into place.
    ///
    /// Default: `false`, the file is overwritten in place.
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Identifies this store in tracing output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates the store. The file itself is created on first insert.
    pub fn build(self) -> FileFeedStore<F> {
        FileFeedStore {
            file: Arc::new(LockedFile::new(self.path, self.atomic_writes)),
            format: self.format,
            name: self.name,
        }
    }
}

#[async_trait]
impl<F: Format> FeedStore for FileFeedStore<F> {
    #[tracing::instrument(skip(self), fields(store = %self.name), level = "trace")]
    async fn retrieve(&self) -> StoreResult<Option<CachedFeed>> {
        match self.file.read().await? {
            Some(contents) => {
                let feed: CachedFeed = self.format.decode(&contents)?;
                tracing::trace!(items = feed.items.len(), "feed record found");
                Ok(Some(feed))
            }
            None => {
                tracing::trace!("no feed record");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self, feed), fields(store = %self.name, items = feed.items.len()), level = "trace")]
    async fn insert(&self, feed: CachedFeed) -> StoreResult<()> {
        let contents = self.format.encode(&feed)?;
        self.file.write(contents).await
    }

    #[tracing::instrument(skip(self), fields(store = %self.name), level = "trace")]
    async fn delete(&self) -> StoreResult<()> {
        self.file.remove().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
