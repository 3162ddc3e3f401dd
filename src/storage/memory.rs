//! In-process object store.

use super::{Compression, ObjectStorage, PutOptions};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An object as held by [`MemoryStorage`], content still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub compress: Compression,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

/// Thread-safe map-backed storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored object, including headers.
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Number of `put` calls served, overwrites included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl ObjectStorage for MemoryStorage {
    fn put(&self, key: &str, content: &[u8], options: &PutOptions) -> Result<()> {
        let object = StoredObject {
            content: options.compress.compress(content),
            compress: options.compress,
            content_type: options.content_type.clone(),
            cache_control: options.cache_control.clone(),
        };
        self.objects.write().insert(key.to_string(), object);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let objects = self.objects.read();
        match objects.get(key) {
            Some(object) => Ok(Some(object.compress.decompress(key, &object.content)?)),
            None => Ok(None),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_list() {
        let storage = MemoryStorage::new();
        let opts = PutOptions::new(Compression::Deflate);
        storage.put("mesh/1:0:a", b"one", &opts).unwrap();
        storage.put("mesh/10:0:a", b"ten", &opts).unwrap();
        storage.put("mesh/2:0:a", b"two", &PutOptions::new(Compression::None)).unwrap();
        storage.put("other/1", b"x", &opts).unwrap();

        assert_eq!(storage.get("mesh/10:0:a").unwrap().unwrap(), b"ten");
        assert_eq!(storage.get("missing").unwrap(), None);
        assert_eq!(
            storage.list("mesh/1").unwrap(),
            vec!["mesh/10:0:a".to_string(), "mesh/1:0:a".to_string()]
        );
        assert_eq!(storage.list("").unwrap().len(), 4);
        assert_eq!(storage.write_count(), 4);
    }

    #[test]
    fn test_put_json_sets_content_type() {
        let storage = MemoryStorage::new();
        storage
            .put_json("info", &json!({"mesh": "mesh"}), &PutOptions::new(Compression::None).no_cache())
            .unwrap();
        let object = storage.object("info").unwrap();
        assert_eq!(object.content, br#"{"mesh":"mesh"}"#);
        assert_eq!(object.content_type.as_deref(), Some("application/json"));
        assert_eq!(object.cache_control.as_deref(), Some("no-cache"));
        assert_eq!(storage.get_json("info").unwrap().unwrap()["mesh"], "mesh");
    }
}
