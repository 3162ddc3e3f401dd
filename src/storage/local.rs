//! Directory-backed object store.
//!
//! Deflated objects are written with a `.deflate` suffix so plain readers
//! can tell them apart; the suffix never appears in keys.

use super::{Compression, ObjectStorage, PutOptions};
use crate::error::{MeshTaskError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DEFLATE_SUFFIX: &str = ".deflate";

/// Storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(MeshTaskError::storage(key, "invalid key"));
        }
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }

    fn with_suffix(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(DEFLATE_SUFFIX);
        PathBuf::from(name)
    }
}

impl ObjectStorage for LocalStorage {
    fn put(&self, key: &str, content: &[u8], options: &PutOptions) -> Result<()> {
        let plain = self.path(key)?;
        let deflated = Self::with_suffix(&plain);
        if let Some(parent) = plain.parent() {
            fs::create_dir_all(parent)?;
        }

        let (target, stale) = match options.compress {
            Compression::None => (&plain, &deflated),
            Compression::Deflate => (&deflated, &plain),
        };
        fs::write(target, options.compress.compress(content))?;
        if stale.exists() {
            fs::remove_file(stale)?;
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let plain = self.path(key)?;
        if plain.is_file() {
            return Ok(Some(fs::read(plain)?));
        }
        let deflated = Self::with_suffix(&plain);
        if deflated.is_file() {
            let bytes = fs::read(deflated)?;
            return Ok(Some(Compression::Deflate.decompress(key, &bytes)?));
        }
        Ok(None)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| MeshTaskError::storage(prefix, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let key = key.strip_suffix(DEFLATE_SUFFIX).unwrap_or(&key).to_string();
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
