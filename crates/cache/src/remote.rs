use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use object_store::{path::Path as ObjectPath, ObjectStore};

use crate::entry::CacheError;

/// §4.3 "remote byte-bucket mirror": a crash-recovery copy of the local
/// cache, not a read path. `100% data correctness is not required` from
/// this side, so callers are expected to swallow `CacheError::Remote` on
/// everything but `pull()`.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError>;

    /// Chunked scan under `prefix`, used only by `pull()` at start-up.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, CacheError>;
}

pub struct ObjectStoreMirror {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreMirror {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RemoteMirror for ObjectStoreMirror {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        let path = ObjectPath::from(key);
        self.store
            .put(&path, bytes.into())
            .await
            .map(|_| ())
            .map_err(|e| CacheError::Remote(e.to_string()))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, CacheError> {
        let path = ObjectPath::from(prefix);
        let mut entries = Vec::new();
        let mut listing = self.store.list(Some(&path));
        while let Some(meta) = listing.next().await {
            let meta = meta.map_err(|e| CacheError::Remote(e.to_string()))?;
            let bytes = self
                .store
                .get(&meta.location)
                .await
                .map_err(|e| CacheError::Remote(e.to_string()))?
                .bytes()
                .await
                .map_err(|e| CacheError::Remote(e.to_string()))?;
            entries.push((meta.location.to_string(), bytes.to_vec()));
        }
        Ok(entries)
    }
}
