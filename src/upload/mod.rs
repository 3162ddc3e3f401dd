//! Delivering a chunk's encoded meshes to storage.
//!
//! Key layout under the mesh directory:
//!
//! | object            | key                                         |
//! |-------------------|---------------------------------------------|
//! | fragment          | `{mesh_dir}/{id}:{lod}:{bbox}`              |
//! | manifest          | `{mesh_dir}/{id}:{lod}`                     |
//! | batched fragments | `{mesh_dir}/{bbox}.frags`                   |
//! | spatial index     | `{mesh_dir}/{bbox}.spatial`                 |
//! | shard             | `{mesh_dir}/initial/2/{shard filename}`     |
//!
//! `{bbox}` is always the clamped, unpadded task box, so neighboring tasks
//! agree on names no matter how much padding each downloaded.

mod shard;
mod spatial;

pub use shard::{ShardSpec, INITIAL_LAYER_ID};
pub use spatial::SpatialIndexWriter;

use crate::error::Result;
use crate::export::{frags, Encoding};
use crate::storage::{join_key, Compression, ObjectStorage, PutOptions};
use crate::types::{Bbox, LabelId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Fragment filename, relative to the mesh directory.
pub fn fragment_filename(id: LabelId, lod: u32, bbox: &Bbox) -> String {
    format!("{}:{}:{}", id, lod, bbox.to_filename())
}

/// Manifest filename, relative to the mesh directory.
pub fn manifest_filename(id: LabelId, lod: u32) -> String {
    format!("{}:{}", id, lod)
}

/// Body of a manifest listing `fragments`.
pub fn manifest_body(fragments: &[String]) -> serde_json::Value {
    json!({ "fragments": fragments })
}

/// Which layout a task writes, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentLayout {
    /// One object per key.
    #[default]
    Individual,
    /// All of a chunk's meshes in one `.frags` blob for later sharding.
    Batched,
    /// A finished shard, built with the dataset's shard spec.
    DirectShard,
}

/// A layout bound to what it needs at upload time.
#[derive(Clone, Copy)]
pub enum UploadStrategy<'a> {
    Individual {
        /// Also write a one-fragment manifest per object. Only correct when
        /// no object spans more than one chunk.
        generate_manifests: bool,
    },
    Batched,
    DirectShard { spec: &'a dyn ShardSpec },
}

impl UploadStrategy<'_> {
    pub fn layout(&self) -> FragmentLayout {
        match self {
            UploadStrategy::Individual { .. } => FragmentLayout::Individual,
            UploadStrategy::Batched => FragmentLayout::Batched,
            UploadStrategy::DirectShard { .. } => FragmentLayout::DirectShard,
        }
    }
}

/// Writes one chunk's fragments.
pub struct FragmentWriter<'a> {
    pub storage: &'a dyn ObjectStorage,
    pub mesh_dir: &'a str,
    pub lod: u32,
    /// Clamped, unpadded task box.
    pub bbox: Bbox,
    pub strategy: UploadStrategy<'a>,
    pub encoding: Encoding,
    pub compress: Compression,
    pub cache_control: Option<&'a str>,
}

impl<'a> FragmentWriter<'a> {
    /// Upload `meshes`, returning the number of payload bytes written.
    ///
    /// Nothing is written for an empty map.
    pub fn write(&self, meshes: &BTreeMap<LabelId, Vec<u8>>) -> Result<usize> {
        if meshes.is_empty() {
            return Ok(0);
        }
        match self.strategy {
            UploadStrategy::Individual { generate_manifests } => {
                self.write_individuals(meshes, generate_manifests)
            }
            UploadStrategy::Batched => self.write_batch(meshes),
            UploadStrategy::DirectShard { spec } => self.write_shard(spec, meshes),
        }
    }

    fn write_individuals(
        &self,
        meshes: &BTreeMap<LabelId, Vec<u8>>,
        generate_manifests: bool,
    ) -> Result<usize> {
        // Draco is already entropy coded.
        let compress = match self.encoding {
            Encoding::Precomputed => self.compress,
            Encoding::Draco => Compression::None,
        };
        let options = PutOptions::new(compress).cache_control(self.cache_control);

        let items: Vec<(String, Vec<u8>)> = meshes
            .iter()
            .map(|(&id, bytes)| {
                let name = fragment_filename(id, self.lod, &self.bbox);
                (join_key(self.mesh_dir, &name), bytes.clone())
            })
            .collect();
        let written = items.iter().map(|(_, b)| b.len()).sum();
        self.storage.puts(items, &options)?;

        if generate_manifests {
            let options = PutOptions::new(Compression::None).cache_control(self.cache_control);
            let manifests = meshes
                .keys()
                .map(|&id| {
                    let fragment = fragment_filename(id, self.lod, &self.bbox);
                    (
                        join_key(self.mesh_dir, &manifest_filename(id, self.lod)),
                        manifest_body(&[fragment]),
                    )
                })
                .collect();
            self.storage.put_jsons(manifests, &options)?;
        }

        Ok(written)
    }

    fn write_batch(&self, meshes: &BTreeMap<LabelId, Vec<u8>>) -> Result<usize> {
        let key = join_key(self.mesh_dir, &format!("{}.frags", self.bbox.to_filename()));
        let blob = frags::write_batch(meshes);
        let options = PutOptions::new(self.compress)
            .content_type(frags::FRAGS_CONTENT_TYPE)
            .no_cache();
        self.storage.put(&key, &blob, &options)?;
        Ok(blob.len())
    }

    fn write_shard(&self, spec: &dyn ShardSpec, meshes: &BTreeMap<LabelId, Vec<u8>>) -> Result<usize> {
        let shard = spec.synthesize_shard(meshes)?;
        // Every label in the chunk hashes to the same shard, so any id names it.
        let Some(&any_id) = meshes.keys().next() else {
            return Ok(0);
        };
        let key = join_key(
            self.mesh_dir,
            &format!("initial/{}/{}", INITIAL_LAYER_ID, spec.filename(any_id)),
        );
        let options = PutOptions::new(Compression::None)
            .content_type("application/octet-stream")
            .no_cache();
        self.storage.put(&key, &shard, &options)?;
        Ok(shard.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::testing::ConcatShard;
    use crate::storage::MemoryStorage;
    use glam::I64Vec3;

    fn bbox() -> Bbox {
        Bbox::from_offset_shape(I64Vec3::ZERO, I64Vec3::splat(64))
    }

    fn meshes() -> BTreeMap<LabelId, Vec<u8>> {
        BTreeMap::from([(5, b"five".to_vec()), (9, b"nine".to_vec())])
    }

    fn writer<'a>(storage: &'a MemoryStorage, strategy: UploadStrategy<'a>) -> FragmentWriter<'a> {
        FragmentWriter {
            storage,
            mesh_dir: "mesh_dir",
            lod: 0,
            bbox: bbox(),
            strategy,
            encoding: Encoding::Precomputed,
            compress: Compression::Deflate,
            cache_control: Some("public, max-age=60"),
        }
    }

    #[test]
    fn test_individual_keys() {
        let storage = MemoryStorage::new();
        let strategy = UploadStrategy::Individual { generate_manifests: false };
        let written = writer(&storage, strategy).write(&meshes()).unwrap();

        assert_eq!(written, 8);
        assert_eq!(
            storage.keys(),
            vec![
                "mesh_dir/5:0:0-64_0-64_0-64".to_string(),
                "mesh_dir/9:0:0-64_0-64_0-64".to_string(),
            ]
        );
        let object = storage.object("mesh_dir/5:0:0-64_0-64_0-64").unwrap();
        assert_eq!(object.compress, Compression::Deflate);
        assert_eq!(object.cache_control.as_deref(), Some("public, max-age=60"));
        assert_eq!(storage.get("mesh_dir/9:0:0-64_0-64_0-64").unwrap().unwrap(), b"nine");
    }

    #[test]
    fn test_individual_with_manifests() {
        let storage = MemoryStorage::new();
        let strategy = UploadStrategy::Individual { generate_manifests: true };
        writer(&storage, strategy).write(&meshes()).unwrap();

        let manifest = storage.object("mesh_dir/9:0").unwrap();
        assert_eq!(manifest.compress, Compression::None);
        assert_eq!(manifest.content, br#"{"fragments":["9:0:0-64_0-64_0-64"]}"#);
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_draco_fragments_are_not_recompressed() {
        let storage = MemoryStorage::new();
        let mut w = writer(&storage, UploadStrategy::Individual { generate_manifests: false });
        w.encoding = Encoding::Draco;
        w.write(&meshes()).unwrap();
        let object = storage.object("mesh_dir/5:0:0-64_0-64_0-64").unwrap();
        assert_eq!(object.compress, Compression::None);
    }

    #[test]
    fn test_batched() {
        let storage = MemoryStorage::new();
        writer(&storage, UploadStrategy::Batched).write(&meshes()).unwrap();

        assert_eq!(storage.keys(), vec!["mesh_dir/0-64_0-64_0-64.frags".to_string()]);
        let object = storage.object("mesh_dir/0-64_0-64_0-64.frags").unwrap();
        assert_eq!(object.cache_control.as_deref(), Some("no-cache"));
        let blob = storage.get("mesh_dir/0-64_0-64_0-64.frags").unwrap().unwrap();
        assert_eq!(frags::read_batch(&blob).unwrap(), meshes());
    }

    #[test]
    fn test_direct_shard() {
        let storage = MemoryStorage::new();
        let spec = ConcatShard;
        writer(&storage, UploadStrategy::DirectShard { spec: &spec })
            .write(&meshes())
            .unwrap();

        assert_eq!(storage.keys(), vec!["mesh_dir/initial/2/5.shard".to_string()]);
        let object = storage.object("mesh_dir/initial/2/5.shard").unwrap();
        assert_eq!(object.content, b"fivenine");
        assert_eq!(object.content_type.as_deref(), Some("application/octet-stream"));
    }

    #[test]
    fn test_empty_chunk_writes_nothing() {
        let storage = MemoryStorage::new();
        let spec = ConcatShard;
        for strategy in [
            UploadStrategy::Individual { generate_manifests: true },
            UploadStrategy::Batched,
            UploadStrategy::DirectShard { spec: &spec },
        ] {
            assert_eq!(writer(&storage, strategy).write(&BTreeMap::new()).unwrap(), 0);
        }
        assert_eq!(storage.write_count(), 0);
    }
}
