//! The chunk mesh task: download, clean up labels, mesh, encode and upload
//! one cutout of a segmentation layer.
//!
//! A task is described entirely by its shape, offset and [`MeshTaskConfig`],
//! so it can be serialized, queued and rerun. Rerunning a task overwrites the
//! same keys with the same content.

mod bounds;
mod config;
mod volume;

pub use bounds::ChunkBounds;
pub use config::MeshTaskConfig;
pub use volume::{DownloadOptions, VolumeSource};

use crate::error::{MeshTaskError, Result};
use crate::export::{DracoEncoder, Encoding, MeshEncoder};
use crate::labels::LabelPreprocessor;
use crate::mesher::{placement, MeshPostprocessor, Mesher};
use crate::quantization::{ChunkGeometry, DracoSettings};
use crate::storage::ObjectStorage;
use crate::types::{Bbox, BoundingBox, LabelId};
use crate::upload::{FragmentLayout, FragmentWriter, SpatialIndexWriter, UploadStrategy};
use glam::I64Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A queued chunk mesh task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshTask {
    shape: I64Vec3,
    offset: I64Vec3,
    #[serde(flatten)]
    config: MeshTaskConfig,
}

#[derive(Deserialize)]
struct Placement {
    shape: I64Vec3,
    offset: I64Vec3,
}

/// What one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshTaskReport {
    /// Clamped task box that names this chunk's outputs.
    pub bbox: Bbox,
    /// Objects uploaded.
    pub objects: usize,
    /// Payload bytes handed to storage, before compression.
    pub bytes_written: usize,
}

/// Runtime collaborators for [`MeshTask::execute`].
pub struct TaskContext<'a> {
    pub volume: &'a dyn VolumeSource,
    pub mesher: &'a mut dyn Mesher,
    pub storage: &'a dyn ObjectStorage,
    /// Required for draco encoding.
    pub draco: Option<&'a dyn DracoEncoder>,
}

impl MeshTask {
    pub fn new(shape: I64Vec3, offset: I64Vec3, config: MeshTaskConfig) -> Result<Self> {
        if shape.min_element() <= 0 {
            return Err(MeshTaskError::InvalidConfig(format!(
                "shape must be positive, got {}",
                shape
            )));
        }
        config.validate()?;
        Ok(Self {
            shape,
            offset,
            config,
        })
    }

    /// Parse a task payload: `shape`, `offset` and any config options at the
    /// top level.
    pub fn from_json(payload: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        if let Some(encoding) = value.get("encoding").and_then(|e| e.as_str()) {
            Encoding::from_str(encoding)?;
        }
        // Config is read from the same object rather than flattened, since
        // flattening loses the integer keys of a remap table.
        let placement: Placement = serde_json::from_value(value.clone())?;
        let config: MeshTaskConfig = serde_json::from_value(value)?;
        Self::new(placement.shape, placement.offset, config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn shape(&self) -> I64Vec3 {
        self.shape
    }

    pub fn offset(&self) -> I64Vec3 {
        self.offset
    }

    pub fn config(&self) -> &MeshTaskConfig {
        &self.config
    }

    fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            mip: self.config.mip,
            parallel: self.config.parallel_download,
            fill_missing: self.config.fill_missing,
            agglomerate: self.config.agglomerate,
            timestamp: self.config.timestamp,
            stop_layer: self.config.stop_layer,
        }
    }

    /// Voxels of context below and above the chunk.
    ///
    /// Direct shard output always meshes one voxel past the far faces and
    /// none before, whatever the config says, so shards built by different
    /// tasks meet on the same faces.
    pub fn padding(&self) -> (u32, u32) {
        match self.config.layout {
            FragmentLayout::DirectShard => (0, 1),
            _ => (self.config.low_padding, self.config.high_padding),
        }
    }

    /// Quantization parameters shared by every chunk of the layer.
    ///
    /// Direct shard output is always encoded at level 1 with metadata.
    pub fn draco_settings(&self, volume: &dyn VolumeSource) -> DracoSettings {
        let (low, high) = self.padding();
        let geometry = ChunkGeometry {
            shape: self.shape,
            offset: self.offset,
            overlap: (low + high) as i64,
            resolution: volume.resolution(),
            divisor: self.config.draco_bin_size_divisor,
        };
        let (compression_level, create_metadata) = match self.config.layout {
            FragmentLayout::DirectShard => (1, true),
            _ => (
                self.config.draco_compression_level,
                self.config.draco_create_metadata,
            ),
        };
        DracoSettings::for_chunk(&geometry, compression_level, create_metadata)
    }

    /// Resolve the output directory: config first, then the layer metadata.
    pub fn mesh_dir(&self, volume: &dyn VolumeSource) -> Result<String> {
        self.config
            .mesh_dir
            .clone()
            .or_else(|| volume.mesh_dir())
            .ok_or(MeshTaskError::MissingMeshDir)
    }

    pub fn bounds(&self, volume: &dyn VolumeSource) -> ChunkBounds {
        let (low, high) = self.padding();
        ChunkBounds::resolve(self.offset, self.shape, low, high, &volume.bounds())
    }

    pub fn execute(&self, ctx: TaskContext<'_>) -> Result<MeshTaskReport> {
        let TaskContext {
            volume,
            mesher,
            storage,
            draco,
        } = ctx;

        // Everything that can be rejected without I/O is checked first.
        let mesh_dir = self.mesh_dir(volume)?;
        let strategy = match self.config.layout {
            FragmentLayout::Individual => UploadStrategy::Individual {
                generate_manifests: self.config.generate_manifests,
            },
            FragmentLayout::Batched => UploadStrategy::Batched,
            FragmentLayout::DirectShard => UploadStrategy::DirectShard {
                spec: volume
                    .shard_spec()
                    .ok_or(MeshTaskError::ShardingNotConfigured)?,
            },
        };
        let encoder = match self.config.encoding {
            Encoding::Precomputed => MeshEncoder::Precomputed,
            Encoding::Draco => {
                let encoder = draco.ok_or_else(|| {
                    MeshTaskError::InvalidConfig("draco encoding needs a draco encoder".to_string())
                })?;
                let settings = self.draco_settings(volume);
                log::debug!("draco settings: {:?}", settings);
                MeshEncoder::Draco { encoder, settings }
            }
        };

        let bounds = self.bounds(volume);
        let mut report = MeshTaskReport {
            bbox: bounds.task,
            objects: 0,
            bytes_written: 0,
        };
        if bounds.task.is_empty() {
            log::debug!("chunk at {} lies outside the dataset", self.offset);
            return Ok(report);
        }

        log::debug!("downloading {} for chunk {}", bounds.data, bounds.task);
        let data = volume.download(&bounds.data, &self.download_options())?;
        if !data.has_foreground() {
            log::debug!("chunk {} is empty", bounds.task);
            return Ok(report);
        }
        let mut labels = data.into_first_channel();

        let preprocessor = LabelPreprocessor {
            dust_threshold: self.config.dust_threshold,
            remap_table: self.config.remap_table.as_ref(),
            object_ids: self.config.object_ids.as_deref(),
        };
        let Some(renumber) = preprocessor.process(&mut labels) else {
            log::debug!("no labels left in chunk {} after filtering", bounds.task);
            return Ok(report);
        };

        mesher.mesh(&labels)?;
        drop(labels);

        let encoding = encoder.encoding();
        let postprocessor = MeshPostprocessor {
            offset: placement(bounds.data_origin(), volume.resolution()),
            encoder,
            simplification_factor: self.config.simplification_factor,
            max_simplification_error: self.config.max_simplification_error,
        };
        let encoded = postprocessor.create_meshes(mesher, Some(&renumber), self.config.progress)?;

        let mut fragments: BTreeMap<LabelId, Vec<u8>> = BTreeMap::new();
        let mut object_bounds: BTreeMap<LabelId, BoundingBox> = BTreeMap::new();
        for (id, mesh) in encoded {
            object_bounds.insert(id, mesh.bounds);
            fragments.insert(id, mesh.bytes);
        }

        let layout = strategy.layout();
        let writer = FragmentWriter {
            storage,
            mesh_dir: &mesh_dir,
            lod: self.config.lod,
            bbox: bounds.task,
            strategy,
            encoding,
            compress: self.config.compress,
            cache_control: self.config.cache_control.as_deref(),
        };
        report.bytes_written = writer.write(&fragments)?;
        report.objects = fragments.len();

        if self.config.spatial_index {
            SpatialIndexWriter {
                storage,
                mesh_dir: &mesh_dir,
                bbox: bounds.task,
                compress: self.config.compress,
            }
            .write(&object_bounds)?;
        }

        log::info!(
            "chunk {}: {} objects, {} bytes to {} ({:?})",
            bounds.task,
            report.objects,
            report.bytes_written,
            mesh_dir,
            layout
        );
        Ok(report)
    }
}
