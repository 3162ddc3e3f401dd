//! Per-chunk spatial index of object bounds.

use crate::error::Result;
use crate::storage::{join_key, Compression, ObjectStorage, PutOptions};
use crate::types::{Bbox, BoundingBox, LabelId};
use std::collections::BTreeMap;

/// Writes `{mesh_dir}/{bbox}.spatial`: object id to `[x0, y0, z0, x1, y1, z1]`.
pub struct SpatialIndexWriter<'a> {
    pub storage: &'a dyn ObjectStorage,
    pub mesh_dir: &'a str,
    pub bbox: Bbox,
    pub compress: Compression,
}

impl SpatialIndexWriter<'_> {
    pub fn key(&self) -> String {
        join_key(self.mesh_dir, &format!("{}.spatial", self.bbox.to_filename()))
    }

    /// Nothing is written when `bounds` is empty.
    pub fn write(&self, bounds: &BTreeMap<LabelId, BoundingBox>) -> Result<()> {
        if bounds.is_empty() {
            return Ok(());
        }
        let index: BTreeMap<LabelId, [f32; 6]> =
            bounds.iter().map(|(&id, b)| (id, b.to_list())).collect();
        let options = PutOptions::new(self.compress).no_cache();
        self.storage
            .put_json(&self.key(), &serde_json::to_value(index)?, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use glam::{I64Vec3, Vec3};

    #[test]
    fn test_spatial_index_document() {
        let storage = MemoryStorage::new();
        let writer = SpatialIndexWriter {
            storage: &storage,
            mesh_dir: "mesh",
            bbox: Bbox::from_offset_shape(I64Vec3::new(64, 0, 0), I64Vec3::splat(64)),
            compress: Compression::Deflate,
        };
        let bounds = BTreeMap::from([(
            7,
            BoundingBox::new(Vec3::new(256.0, 0.0, 0.0), Vec3::new(300.5, 8.0, 40.0)),
        )]);
        writer.write(&bounds).unwrap();

        let object = storage.object("mesh/64-128_0-64_0-64.spatial").unwrap();
        assert_eq!(object.cache_control.as_deref(), Some("no-cache"));
        let doc = storage.get_json("mesh/64-128_0-64_0-64.spatial").unwrap().unwrap();
        assert_eq!(doc, serde_json::json!({"7": [256.0, 0.0, 0.0, 300.5, 8.0, 40.0]}));
    }

    #[test]
    fn test_empty_index_is_not_written() {
        let storage = MemoryStorage::new();
        let writer = SpatialIndexWriter {
            storage: &storage,
            mesh_dir: "mesh",
            bbox: Bbox::from_offset_shape(I64Vec3::ZERO, I64Vec3::splat(64)),
            compress: Compression::None,
        };
        writer.write(&BTreeMap::new()).unwrap();
        assert!(storage.is_empty());
    }
}
