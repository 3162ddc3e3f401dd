//! Segmentation source seam.

use crate::error::Result;
use crate::types::{Bbox, LabelVolume};
use crate::upload::ShardSpec;
use glam::DVec3;

/// Download parameters passed through to the volume source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub mip: u32,
    /// Parallel requests the source may issue.
    pub parallel: usize,
    pub fill_missing: bool,
    pub agglomerate: bool,
    pub timestamp: Option<u64>,
    pub stop_layer: u32,
}

/// A segmentation layer.
pub trait VolumeSource {
    /// Physical size of one voxel.
    fn resolution(&self) -> DVec3;

    /// Voxel bounds of the dataset.
    fn bounds(&self) -> Bbox;

    /// Default mesh directory from the layer metadata.
    fn mesh_dir(&self) -> Option<String>;

    /// Fetch `bbox` as an `[x, y, z, channel]` volume. Parts outside the
    /// dataset come back as background.
    fn download(&self, bbox: &Bbox, options: &DownloadOptions) -> Result<LabelVolume>;

    /// Mesh sharding scheme, if the dataset has one.
    fn shard_spec(&self) -> Option<&dyn ShardSpec> {
        None
    }
}
