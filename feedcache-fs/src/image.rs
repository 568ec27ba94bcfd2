use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use feedcache_backend::{Format, ImageDataStore, JsonFormat, StoreResult};
use url::Url;

use crate::file::LockedFile;

type ImageEntries = BTreeMap<String, Bytes>;

/// Image data store keeping every `url -> bytes` entry in one file.
///
/// Inserting reads the current map, replaces one entry and writes the map
/// back, all under the exclusive lock. Clones share the same file and the
/// same lock.
#[derive(Debug, Clone)]
pub struct FileImageDataStore<F = JsonFormat>
where
    F: Format,
{
    file: Arc<LockedFile>,
    format: F,
    name: String,
}

impl FileImageDataStore<JsonFormat> {
    /// JSON encoded store at `path`, non-atomic writes.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::builder(path).build()
    }

    /// Starts building a store at `path`.
    pub fn builder(path: impl AsRef<Path>) -> FileImageDataStoreBuilder<JsonFormat> {
        FileImageDataStoreBuilder {
            path: path.as_ref().to_path_buf(),
            atomic_writes: false,
            format: JsonFormat,
            name: "file".to_owned(),
        }
    }
}

impl<F: Format> FileImageDataStore<F> {
    /// Location of the store file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn decode(&self, contents: Option<Vec<u8>>) -> StoreResult<ImageEntries> {
        match contents {
            Some(contents) => Ok(self.format.decode(&contents)?),
            None => Ok(ImageEntries::new()),
        }
    }
}

/// Builder for [`FileImageDataStore`].
pub struct FileImageDataStoreBuilder<F = JsonFormat> {
    path: PathBuf,
    atomic_writes: bool,
    format: F,
    name: String,
}

impl<F: Format> FileImageDataStoreBuilder<F> {
    /// Entry map encoding. `BincodeFormat` keeps image bytes compact.
    pub fn format<NewF: Format>(self, format: NewF) -> FileImageDataStoreBuilder<NewF> {
        FileImageDataStoreBuilder {
            path: self.path,
            atomic_writes: self.atomic_writes,
            format,
            name: self.name,
        }
    }

    /// Write to a temporary sibling file and rename it into place.
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
    pub fn build(self) -> FileImageDataStore<F> {
        FileImageDataStore {
            file: Arc::new(LockedFile::new(self.path, self.atomic_writes)),
            format: self.format,
            name: self.name,
        }
    }
}

#[async_trait]
impl<F: Format> ImageDataStore for FileImageDataStore<F> {
    #[tracing::instrument(skip(self), fields(store = %self.name, url = %url), level = "trace")]
    async fn retrieve_data(&self, url: &Url) -> StoreResult<Option<Bytes>> {
        let contents = self.file.read().await?;
        let mut entries = self.decode(contents)?;
        Ok(entries.remove(url.as_str()))
    }

    #[tracing::instrument(skip(self, data), fields(store = %self.name, url = %url, bytes = data.len()), level = "trace")]
    async fn insert_data(&self, data: Bytes, url: &Url) -> StoreResult<()> {
        let key = url.as_str().to_owned();
        self.file
            .update(move |contents| {
                let mut entries = self.decode(contents)?;
                entries.insert(key, data);
                Ok(self.format.encode(&entries)?)
            })
            .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
