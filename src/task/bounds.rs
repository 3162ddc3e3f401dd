//! Task and download boxes for one chunk.

use crate::types::Bbox;
use glam::I64Vec3;

/// The two boxes a chunk task works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBounds {
    /// Nominal box clamped to the dataset. Names the chunk's outputs and
    /// anchors its meshes.
    pub task: Bbox,
    /// Task box grown by the padding. Only used for the download, and may
    /// extend past the dataset.
    pub data: Bbox,
}

impl ChunkBounds {
    /// Resolve the boxes for a chunk at `offset` spanning `shape` voxels.
    ///
    /// Padding is applied after clamping so the data box always starts
    /// exactly `low_padding` voxels before the task box, which is where
    /// meshes are placed from.
    pub fn resolve(
        offset: I64Vec3,
        shape: I64Vec3,
        low_padding: u32,
        high_padding: u32,
        dataset: &Bbox,
    ) -> Self {
        let task = Bbox::from_offset_shape(offset, shape).clamp(dataset);
        let data = task.padded(low_padding as i64, high_padding as i64);
        Self { task, data }
    }

    /// Voxel corner of the downloaded data.
    pub fn data_origin(&self) -> I64Vec3 {
        self.data.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Bbox {
        Bbox::new(I64Vec3::ZERO, I64Vec3::new(1000, 1000, 100))
    }

    #[test]
    fn test_interior_chunk() {
        let b = ChunkBounds::resolve(
            I64Vec3::new(64, 64, 32),
            I64Vec3::splat(64),
            1,
            1,
            &dataset(),
        );
        assert_eq!(b.task.to_filename(), "64-128_64-128_32-96");
        assert_eq!(b.data.to_filename(), "63-129_63-129_31-97");
        assert_eq!(b.data_origin(), I64Vec3::new(63, 63, 31));
    }

    #[test]
    fn test_edge_chunk_is_clamped_but_data_is_padded() {
        let b = ChunkBounds::resolve(
            I64Vec3::new(960, 0, 64),
            I64Vec3::splat(64),
            0,
            1,
            &dataset(),
        );
        assert_eq!(b.task.to_filename(), "960-1000_0-64_64-100");
        assert_eq!(b.data.max, I64Vec3::new(1001, 65, 101));
    }

    #[test]
    fn test_containment() {
        let ds = dataset();
        for offset in [I64Vec3::ZERO, I64Vec3::new(990, 990, 90), I64Vec3::new(-10, 5, 200)] {
            for (low, high) in [(0, 0), (0, 1), (2, 3)] {
                let b = ChunkBounds::resolve(offset, I64Vec3::splat(32), low, high, &ds);
                assert!(ds.contains_bbox(&b.task));
                assert!(b.data.contains_bbox(&b.task));
            }
        }
    }
}
