use std::path::PathBuf;
use std::sync::Arc;

use feedcache_backend::{FeedStore, ImageDataStore};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Record encoding of a file store.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum StoreFormat {
    /// Human readable (default).
    #[default]
    Json,
    /// Compact binary.
    Bincode,
}

/// Settings of a file store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileStore {
    pub path: PathBuf,
    #[serde(default)]
    pub format: StoreFormat,
    #[serde(default)]
    pub atomic_writes: bool,
    pub name: Option<String>,
}

/// Settings of a FeOxDB store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct FeOxDb {
    /// Database file or directory; in memory when absent.
    pub path: Option<PathBuf>,
    pub max_file_size: Option<u64>,
    pub max_memory: Option<usize>,
    pub name: Option<String>,
}

/// One store, selected by its `type` tag.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Store {
    File(FileStore),
    FeOxDb(FeOxDb),
}

impl Store {
    /// Builds a feed store.
    pub fn into_feed_store(self) -> Result<Arc<dyn FeedStore>, ConfigError> {
        match self {
            #[cfg(feature = "fs")]
            Store::File(config) => {
                use feedcache_backend::{BincodeFormat, JsonFormat};
                use feedcache_fs::FileFeedStore;

                let builder =
                    FileFeedStore::builder(&config.path).atomic_writes(config.atomic_writes);
                let builder = match config.name {
                    Some(name) => builder.name(name),
                    None => builder,
                };
                let store: Arc<dyn FeedStore> = match config.format {
                    StoreFormat::Json => Arc::new(builder.format(JsonFormat).build()),
                    StoreFormat::Bincode => Arc::new(builder.format(BincodeFormat).build()),
                };
                Ok(store)
            }
            #[cfg(not(feature = "fs"))]
            Store::File(_) => Err(ConfigError::BackendNotAvailable("File".to_string())),
            #[cfg(feature = "feoxdb")]
            Store::FeOxDb(config) => Ok(Arc::new(config.open()?)),
            #[cfg(not(feature = "feoxdb"))]
            Store::FeOxDb(_) => Err(ConfigError::BackendNotAvailable("FeOxDb".to_string())),
        }
    }

    /// Builds an image data store.
    pub fn into_image_store(self) -> Result<Arc<dyn ImageDataStore>, ConfigError> {
        match self {
            #[cfg(feature = "fs")]
            Store::File(config) => {
                use feedcache_backend::{BincodeFormat, JsonFormat};
                use feedcache_fs::FileImageDataStore;

                let builder =
                    FileImageDataStore::builder(&config.path).atomic_writes(config.atomic_writes);
                let builder = match config.name {
                    Some(name) => builder.name(name),
                    None => builder,
                };
                let store: Arc<dyn ImageDataStore> = match config.format {
                    StoreFormat::Json => Arc::new(builder.format(JsonFormat).build()),
                    StoreFormat::Bincode => Arc::new(builder.format(BincodeFormat).build()),
                };
                Ok(store)
            }
            #[cfg(not(feature = "fs"))]
            Store::File(_) => Err(ConfigError::BackendNotAvailable("File".to_string())),
            #[cfg(feature = "feoxdb")]
            Store::FeOxDb(config) => Ok(Arc::new(config.open()?)),
            #[cfg(not(feature = "feoxdb"))]
            Store::FeOxDb(_) => Err(ConfigError::BackendNotAvailable("FeOxDb".to_string())),
        }
    }
}

#[cfg(feature = "feoxdb")]
impl FeOxDb {
    pub(crate) fn open(self) -> Result<feedcache_feoxdb::FeOxDbStore, ConfigError> {
        let mut builder = feedcache_feoxdb::FeOxDbStore::builder();

        if let Some(path) = self.path {
            builder = builder.path(path);
        }
        if let Some(size) = self.max_file_size {
            builder = builder.max_file_size(size);
        }
        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }

        builder
            .build()
            .map_err(|e| ConfigError::BackendNotAvailable(format!("FeOxDb: {}", e)))
    }
}
