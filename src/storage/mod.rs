//! Object storage for fragments, manifests and indexes.
//!
//! Keys are `/`-separated paths relative to the layer root. Every write the
//! crate performs is keyed deterministically, so repeating a task rewrites
//! the same keys with the same bytes.

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::{MemoryStorage, StoredObject};

use crate::error::{MeshTaskError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content encoding applied to stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    /// zlib-wrapped deflate (`Content-Encoding: deflate`).
    #[default]
    Deflate,
}

impl Compression {
    pub fn compress(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Compression::None => data.to_vec(),
            Compression::Deflate => miniz_oxide::deflate::compress_to_vec_zlib(data, 6),
        }
    }

    pub fn decompress(&self, key: &str, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Deflate => miniz_oxide::inflate::decompress_to_vec_zlib(data)
                .map_err(|e| MeshTaskError::storage(key, format!("inflate failed: {:?}", e))),
        }
    }
}

/// Headers and encoding for one write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PutOptions {
    pub compress: Compression,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

impl PutOptions {
    pub fn new(compress: Compression) -> Self {
        Self {
            compress,
            ..Default::default()
        }
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn cache_control(mut self, cache_control: Option<&str>) -> Self {
        self.cache_control = cache_control.map(str::to_string);
        self
    }

    /// Force clients to revalidate on every read.
    pub fn no_cache(self) -> Self {
        self.cache_control(Some("no-cache"))
    }
}

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A key/value object store.
pub trait ObjectStorage {
    fn put(&self, key: &str, content: &[u8], options: &PutOptions) -> Result<()>;

    /// Read an object, undoing its content encoding. `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    fn puts(&self, items: Vec<(String, Vec<u8>)>, options: &PutOptions) -> Result<()> {
        for (key, content) in items {
            self.put(&key, &content, options)?;
        }
        Ok(())
    }

    fn put_json(&self, key: &str, value: &Value, options: &PutOptions) -> Result<()> {
        let options = PutOptions {
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            ..options.clone()
        };
        self.put(key, serde_json::to_string(value)?.as_bytes(), &options)
    }

    fn put_jsons(&self, items: Vec<(String, Value)>, options: &PutOptions) -> Result<()> {
        for (key, value) in items {
            self.put_json(&key, &value, options)?;
        }
        Ok(())
    }

    fn get_json(&self, key: &str) -> Result<Option<Value>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// Join a directory and a name into a storage key.
pub fn join_key(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Final path component of a key.
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_round_trip() {
        let data = b"mesh mesh mesh mesh mesh".repeat(20);
        let packed = Compression::Deflate.compress(&data);
        assert!(packed.len() < data.len());
        assert_eq!(Compression::Deflate.decompress("k", &packed).unwrap(), data);
        assert!(Compression::Deflate.decompress("k", b"not zlib").is_err());
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(join_key("mesh", "5:0"), "mesh/5:0");
        assert_eq!(join_key("mesh/", "5:0"), "mesh/5:0");
        assert_eq!(join_key("", "5:0"), "5:0");
        assert_eq!(basename("mesh/5:0:0-64_0-64_0-64"), "5:0:0-64_0-64_0-64");
        assert_eq!(basename("info"), "info");
    }
}
