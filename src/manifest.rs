//! Stitching fragments from many chunk tasks into per-object manifests.
//!
//! Each [`ManifestTask`] lists the keys under `{mesh_dir}/{prefix}`, groups the
//! fragment filenames it finds by object id and writes one manifest per
//! object. Tasks are independent and may run in parallel over different
//! prefixes; rerunning one rewrites the same manifests.
//!
//! # Prefix coverage
//!
//! The task only sees objects whose id *starts with* its prefix, and it does
//! not check that the prefixes of a run cover every id. Single-digit prefixes
//! `"0"` to `"9"` cover everything. Two-digit prefixes `"10"` to `"99"` miss
//! ids `0` to `9` entirely; those need catch-all tasks with prefixes `"0:"` to
//! `"9:"`. [`covering_prefixes`] builds such a complete set.

use crate::error::{MeshTaskError, Result};
use crate::storage::{basename, join_key, Compression, ObjectStorage, PutOptions, JSON_CONTENT_TYPE};
use crate::types::LabelId;
use crate::upload::{manifest_body, manifest_filename};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parse `{id}:{lod}:{anything}`. Manifests (`{id}:{lod}`) and unrelated
/// files yield `None`.
pub fn parse_fragment_filename(filename: &str) -> Option<(LabelId, u32)> {
    let mut parts = filename.splitn(3, ':');
    let id = parts.next()?;
    let lod = parts.next()?;
    parts.next()?;

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(id) || !digits(lod) {
        return None;
    }
    Some((id.parse().ok()?, lod.parse().ok()?))
}

fn is_manifest_filename(filename: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    matches!(filename.split_once(':'), Some((id, lod)) if digits(id) && digits(lod))
}

/// Aggregates fragment filenames under one prefix into manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTask {
    /// Id prefix this task is responsible for.
    pub prefix: String,
    /// Detail level to collect.
    #[serde(default)]
    pub lod: u32,
    /// Mesh directory; read from the layer's `info` file when unset.
    #[serde(default)]
    pub mesh_dir: Option<String>,
}

/// What one run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestReport {
    pub manifests: usize,
    pub fragments: usize,
    pub ignored: usize,
}

impl ManifestTask {
    pub fn new(prefix: impl Into<String>, lod: u32) -> Self {
        Self {
            prefix: prefix.into(),
            lod,
            mesh_dir: None,
        }
    }

    pub fn with_mesh_dir(mut self, mesh_dir: impl Into<String>) -> Self {
        self.mesh_dir = Some(mesh_dir.into());
        self
    }

    /// Resolve the mesh directory from the task or the layer `info` file.
    pub fn mesh_dir(&self, storage: &dyn ObjectStorage) -> Result<String> {
        if let Some(dir) = &self.mesh_dir {
            return Ok(dir.clone());
        }
        storage
            .get_json("info")?
            .and_then(|info| info.get("mesh").and_then(|m| m.as_str()).map(str::to_string))
            .ok_or(MeshTaskError::MissingMeshDir)
    }

    /// Fragment filenames under this task's prefix at its detail level, by object.
    pub fn collect_fragments(
        &self,
        storage: &dyn ObjectStorage,
        mesh_dir: &str,
    ) -> Result<(BTreeMap<LabelId, Vec<String>>, usize)> {
        let prefix = join_key(mesh_dir, &self.prefix);
        let mut segids: BTreeMap<LabelId, Vec<String>> = BTreeMap::new();
        let mut ignored = 0;

        for key in storage.list(&prefix)? {
            let filename = basename(&key);
            match parse_fragment_filename(filename) {
                Some((id, lod)) if lod == self.lod => {
                    segids.entry(id).or_default().push(filename.to_string());
                }
                Some(_) => {}
                None if is_manifest_filename(filename) => {}
                None => ignored += 1,
            }
        }

        for fragments in segids.values_mut() {
            fragments.sort();
            fragments.dedup();
        }
        Ok((segids, ignored))
    }

    pub fn execute(&self, storage: &dyn ObjectStorage) -> Result<ManifestReport> {
        let mesh_dir = self.mesh_dir(storage)?;
        let (segids, ignored) = self.collect_fragments(storage, &mesh_dir)?;
        if ignored > 0 {
            log::warn!(
                "ignored {} non-fragment keys under {}/{}",
                ignored,
                mesh_dir,
                self.prefix
            );
        }

        let fragments = segids.values().map(Vec::len).sum();
        let items = segids
            .iter()
            .map(|(&id, frags)| {
                (
                    join_key(&mesh_dir, &manifest_filename(id, self.lod)),
                    manifest_body(frags),
                )
            })
            .collect::<Vec<_>>();
        let manifests = items.len();

        let options = PutOptions::new(Compression::None).content_type(JSON_CONTENT_TYPE);
        storage.put_jsons(items, &options)?;

        log::info!(
            "prefix {:?} lod {}: {} manifests from {} fragments",
            self.prefix,
            self.lod,
            manifests,
            fragments
        );
        Ok(ManifestReport {
            manifests,
            fragments,
            ignored,
        })
    }
}

/// A set of prefixes that together cover every id exactly once.
///
/// `digits` of 1 gives `"0"` to `"9"`. Larger values give every
/// `digits`-digit number as a prefix plus a `"{id}:"` catch-all for each id
/// with fewer digits.
pub fn covering_prefixes(digits: u32) -> Vec<String> {
    let digits = digits.max(1);
    if digits == 1 {
        return (0..10).map(|d| d.to_string()).collect();
    }
    let low = 10u64.pow(digits - 1);
    let high = 10u64.pow(digits);
    (low..high)
        .map(|p| p.to_string())
        .chain((0..low).map(|id| format!("{}:", id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn seed(storage: &MemoryStorage, keys: &[&str]) {
        for key in keys {
            storage.put(key, b"frag", &PutOptions::default()).unwrap();
        }
    }

    #[test]
    fn test_parse_fragment_filename() {
        assert_eq!(parse_fragment_filename("12:0:0-64_0-64_0-64"), Some((12, 0)));
        assert_eq!(parse_fragment_filename("12:3:"), Some((12, 3)));
        assert_eq!(parse_fragment_filename("12:0"), None);
        assert_eq!(parse_fragment_filename("0-64_0-64_0-64.spatial"), None);
        assert_eq!(parse_fragment_filename("a:0:X"), None);
        assert_eq!(parse_fragment_filename("-1:0:X"), None);
    }

    #[test]
    fn test_groups_by_object_and_lod() {
        let storage = MemoryStorage::new();
        seed(
            &storage,
            &["mesh/1:0:X", "mesh/1:0:Y", "mesh/2:0:Z", "mesh/1:1:W", "mesh/0-64_0-64_0-64.frags"],
        );

        let report = ManifestTask::new("", 0)
            .with_mesh_dir("mesh")
            .execute(&storage)
            .unwrap();
        assert_eq!(report, ManifestReport { manifests: 2, fragments: 3, ignored: 1 });

        assert_eq!(
            storage.get_json("mesh/1:0").unwrap().unwrap(),
            json!({"fragments": ["1:0:X", "1:0:Y"]})
        );
        assert_eq!(
            storage.get("mesh/2:0").unwrap().unwrap(),
            br#"{"fragments":["2:0:Z"]}"#
        );
        assert!(storage.get("mesh/1:1").unwrap().is_none());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let storage = MemoryStorage::new();
        seed(&storage, &["mesh/7:0:A", "mesh/7:0:B"]);
        let task = ManifestTask::new("7", 0).with_mesh_dir("mesh");

        task.execute(&storage).unwrap();
        let first = storage.object("mesh/7:0").unwrap();
        // The manifest itself now sits under the prefix and must be skipped.
        let report = task.execute(&storage).unwrap();
        assert_eq!(report, ManifestReport { manifests: 1, fragments: 2, ignored: 0 });
        assert_eq!(storage.object("mesh/7:0").unwrap(), first);
    }

    #[test]
    fn test_mesh_dir_at_root() {
        let storage = MemoryStorage::new();
        seed(&storage, &["4:0:A", "4:0:B"]);

        let report = ManifestTask::new("4", 0).with_mesh_dir("").execute(&storage).unwrap();
        assert_eq!(report.fragments, 2);
        assert_eq!(
            storage.get_json("4:0").unwrap().unwrap(),
            json!({"fragments": ["4:0:A", "4:0:B"]})
        );
    }

    #[test]
    fn test_two_digit_prefix_misses_single_digit_ids() {
        let storage = MemoryStorage::new();
        seed(&storage, &["mesh/5:0:A", "mesh/55:0:A"]);

        let task = ManifestTask::new("55", 0).with_mesh_dir("mesh");
        task.execute(&storage).unwrap();
        assert!(storage.get("mesh/55:0").unwrap().is_some());
        assert!(storage.get("mesh/5:0").unwrap().is_none());

        ManifestTask::new("5:", 0).with_mesh_dir("mesh").execute(&storage).unwrap();
        assert!(storage.get("mesh/5:0").unwrap().is_some());
    }

    #[test]
    fn test_mesh_dir_from_info() {
        let storage = MemoryStorage::new();
        storage
            .put_json("info", &json!({"mesh": "mesh_mip_0"}), &PutOptions::default())
            .unwrap();
        seed(&storage, &["mesh_mip_0/3:0:A"]);

        ManifestTask::new("3", 0).execute(&storage).unwrap();
        assert!(storage.get("mesh_mip_0/3:0").unwrap().is_some());

        let bare = MemoryStorage::new();
        assert!(matches!(
            ManifestTask::new("3", 0).execute(&bare),
            Err(MeshTaskError::MissingMeshDir)
        ));
    }

    #[test]
    fn test_covering_prefixes() {
        assert_eq!(covering_prefixes(1).len(), 10);

        let prefixes = covering_prefixes(2);
        assert_eq!(prefixes.len(), 100);
        for id in [0u64, 7, 10, 99, 123, 5_000_000_001] {
            let name = format!("{}:0:X", id);
            let hits = prefixes.iter().filter(|p| name.starts_with(p.as_str())).count();
            assert_eq!(hits, 1, "id {} matched {} prefixes", id, hits);
        }
    }
}
