//! Generic whole-collection JSON file store.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// One JSON file holding an array of records.
///
/// Reads load the entire file; mutations run under the collection's
/// writer lock and replace the file atomically (write to a sibling temp
/// file, then rename), so a failed write leaves the previous contents
/// intact and concurrent mutations cannot lose each other's changes.
pub struct JsonCollection<T> {
    path: PathBuf,
    lock: RwLock<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a collection backed by the given file path.
    ///
    /// A missing file reads as an empty collection; it is created on the
    /// first mutation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
            _marker: PhantomData,
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole collection.
    pub async fn read_all(&self) -> Result<Vec<T>> {
        let _guard = self.lock.read().await;
        self.load().await
    }

    /// Runs a read-modify-write cycle under the writer lock.
    ///
    /// The closure mutates the in-memory copy; if it returns `Err`, the
    /// file is not touched. The file is only replaced after the whole
    /// collection serialized successfully.
    pub async fn try_mutate<R>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> Result<R>,
    ) -> Result<R> {
        let _guard = self.lock.write().await;
        let mut items = self.load().await?;
        let out = f(&mut items)?;
        self.persist(&items).await?;
        Ok(out)
    }

    async fn load(&self) -> Result<Vec<T>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn persist(&self, items: &[T]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(items)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
