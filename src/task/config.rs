//! Typed options for a chunk mesh task.

use crate::error::{MeshTaskError, Result};
use crate::export::Encoding;
use crate::labels::RemapTable;
use crate::quantization::BinSizeDivisor;
use crate::storage::Compression;
use crate::types::LabelId;
use crate::upload::FragmentLayout;
use serde::{Deserialize, Serialize};

/// Options for [`MeshTask`](super::MeshTask).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshTaskConfig {
    /// Detail level recorded in fragment and manifest names. Default 0.
    pub lod: u32,
    /// Resolution pyramid level to download. Default 0.
    pub mip: u32,
    /// Target triangle reduction factor for simplification. Default 100.
    pub simplification_factor: u32,
    /// Furthest, in physical units, simplification may move a vertex. Default 40.
    pub max_simplification_error: f64,
    /// Output directory; overrides the dataset's `mesh` entry. Default none.
    pub mesh_dir: Option<String>,
    /// Agglomerate labels before meshing. Default none.
    pub remap_table: Option<RemapTable>,
    /// Write a one-fragment manifest per object right away. Only valid when no
    /// object is cropped by the task box. Default false.
    pub generate_manifests: bool,
    /// Voxels of context below the minimum corner. Default 0. The direct
    /// shard layout always uses 0.
    pub low_padding: u32,
    /// Voxels of context above the maximum corner. Default 1. The direct
    /// shard layout always uses 1.
    pub high_padding: u32,
    /// Parallel requests for the segmentation download. Default 1.
    pub parallel_download: usize,
    /// Cache-Control header for fragments and manifests. Default none.
    pub cache_control: Option<String>,
    /// Drop labels with strictly fewer voxels than this. Default none.
    pub dust_threshold: Option<u64>,
    /// Fragment encoding. Default precomputed.
    pub encoding: Encoding,
    /// Draco compression level. Default 1.
    pub draco_compression_level: u32,
    /// Ask Draco to embed metadata. Default false.
    pub draco_create_metadata: bool,
    /// Divisor applied to the finest resolution for the maximum Draco bin. Default sqrt2.
    pub draco_bin_size_divisor: BinSizeDivisor,
    /// Show a progress bar while meshing. Default false.
    pub progress: bool,
    /// Mesh only these ids. Default none.
    pub object_ids: Option<Vec<LabelId>>,
    /// Treat missing segmentation as background. Default false.
    pub fill_missing: bool,
    /// Write a per-chunk spatial index of object bounds. Default false.
    pub spatial_index: bool,
    /// Fragment storage layout. Default individual.
    pub layout: FragmentLayout,
    /// Graphene only: segmentation as of this UNIX timestamp. Default none.
    pub timestamp: Option<u64>,
    /// Graphene only: download agglomerated ids. Default true.
    pub agglomerate: bool,
    /// Graphene only: chunk-graph layer to stop agglomeration at. Default 2.
    pub stop_layer: u32,
    /// Content encoding for compressible uploads. Default deflate.
    pub compress: Compression,
}

impl Default for MeshTaskConfig {
    fn default() -> Self {
        Self {
            lod: 0,
            mip: 0,
            simplification_factor: 100,
            max_simplification_error: 40.0,
            mesh_dir: None,
            remap_table: None,
            generate_manifests: false,
            low_padding: 0,
            high_padding: 1,
            parallel_download: 1,
            cache_control: None,
            dust_threshold: None,
            encoding: Encoding::Precomputed,
            draco_compression_level: 1,
            draco_create_metadata: false,
            draco_bin_size_divisor: BinSizeDivisor::Sqrt2,
            progress: false,
            object_ids: None,
            fill_missing: false,
            spatial_index: false,
            layout: FragmentLayout::Individual,
            timestamp: None,
            agglomerate: true,
            stop_layer: 2,
            compress: Compression::Deflate,
        }
    }
}

impl MeshTaskConfig {
    /// Reject option combinations that cannot produce valid output.
    pub fn validate(&self) -> Result<()> {
        if self.layout == FragmentLayout::DirectShard && self.encoding != Encoding::Draco {
            return Err(MeshTaskError::InvalidConfig(
                "direct shard layout requires draco encoding".to_string(),
            ));
        }
        if self.generate_manifests && self.layout != FragmentLayout::Individual {
            return Err(MeshTaskError::InvalidConfig(
                "generate_manifests only applies to the individual layout".to_string(),
            ));
        }
        if self.parallel_download == 0 {
            return Err(MeshTaskError::InvalidConfig(
                "parallel_download must be at least 1".to_string(),
            ));
        }
        if !(self.max_simplification_error >= 0.0) {
            return Err(MeshTaskError::InvalidConfig(
                "max_simplification_error must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_layout(mut self, layout: FragmentLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_mesh_dir(mut self, mesh_dir: &str) -> Self {
        self.mesh_dir = Some(mesh_dir.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: MeshTaskConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MeshTaskConfig::default());
        assert_eq!(config.high_padding, 1);
        assert_eq!(config.simplification_factor, 100);
        assert!(config.agglomerate);
    }

    #[test]
    fn test_partial_json() {
        let config: MeshTaskConfig = serde_json::from_str(
            r#"{"encoding": "draco", "layout": "batched", "remap_table": {"4": 1}, "compress": "none"}"#,
        )
        .unwrap();
        assert_eq!(config.encoding, Encoding::Draco);
        assert_eq!(config.layout, FragmentLayout::Batched);
        assert_eq!(config.remap_table.unwrap().get(4), Some(1));
        assert_eq!(config.compress, Compression::None);
    }

    #[test]
    fn test_validation() {
        assert!(MeshTaskConfig::default().validate().is_ok());

        let shard_precomputed = MeshTaskConfig::default().with_layout(FragmentLayout::DirectShard);
        assert!(matches!(
            shard_precomputed.validate(),
            Err(MeshTaskError::InvalidConfig(_))
        ));

        let shard_draco = MeshTaskConfig::default()
            .with_layout(FragmentLayout::DirectShard)
            .with_encoding(Encoding::Draco);
        assert!(shard_draco.validate().is_ok());

        let batched_manifests = MeshTaskConfig {
            generate_manifests: true,
            layout: FragmentLayout::Batched,
            ..Default::default()
        };
        assert!(batched_manifests.validate().is_err());
    }
}
