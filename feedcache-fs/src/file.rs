use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use feedcache_backend::StoreResult;
use tokio::sync::RwLock;

/// A single store file behind a reader/writer lock.
///
/// Readers share the lock, writers hold it exclusively. Tokio's lock is
/// fair (FIFO), which keeps operations ordered around every write.
#[derive(Debug)]
pub(crate) struct LockedFile {
    path: PathBuf,
    atomic_writes: bool,
    lock: RwLock<()>,
}

impl LockedFile {
    pub(crate) fn new(path: PathBuf, atomic_writes: bool) -> Self {
        Self {
            path,
            atomic_writes,
            lock: RwLock::new(()),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file under a shared lock. A missing file is `None`.
    pub(crate) async fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        let _guard = self.lock.read().await;
        self.read_unlocked().await
    }

    /// Replaces the file contents under the exclusive lock.
    pub(crate) async fn write(&self, contents: Vec<u8>) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        self.write_unlocked(&contents).await
    }

    /// Reads, transforms and writes back the file under one exclusive lock.
    pub(crate) async fn update<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(Option<Vec<u8>>) -> StoreResult<Vec<u8>> + Send,
    {
        let _guard = self.lock.write().await;
        let current = self.read_unlocked().await?;
        let contents = f(current)?;
        self.write_unlocked(&contents).await
    }

    /// Removes the file under the exclusive lock. A missing file is fine.
    pub(crate) async fn remove(&self) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_unlocked(&self) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_unlocked(&self, contents: &[u8]) -> StoreResult<()> {
        if !self.atomic_writes {
            tokio::fs::write(&self.path, contents).await?;
            return Ok(());
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, contents).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
