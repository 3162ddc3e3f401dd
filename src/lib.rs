//! # Chunk Mesher
//!
//! Turns a labeled segmentation volume into per-object surface meshes, one
//! chunk at a time, and stitches the pieces together afterwards.
//!
//! ## Overview
//!
//! A [`MeshTask`] downloads a padded cutout, cleans up its labels, hands the
//! volume to a [`Mesher`], places and encodes each object's surface and
//! uploads the resulting fragments. A later pass of [`ManifestTask`]s lists
//! the fragments and writes one manifest per object naming all of its pieces.
//!
//! The segmentation layer, the mesher, the Draco codec and the storage
//! backend are traits, so the pipeline runs against any of them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chunk_mesher::{MeshTask, MeshTaskConfig, TaskContext, LocalStorage};
//! use glam::I64Vec3;
//!
//! let storage = LocalStorage::new("/data/layer");
//! let task = MeshTask::new(
//!     I64Vec3::splat(448),
//!     I64Vec3::ZERO,
//!     MeshTaskConfig::default().with_mesh_dir("mesh_mip_0"),
//! )?;
//!
//! task.execute(TaskContext {
//!     volume: &my_layer,
//!     mesher: &mut my_mesher,
//!     storage: &storage,
//!     draco: None,
//! })?;
//!
//! // Once every chunk is done:
//! for prefix in chunk_mesher::covering_prefixes(1) {
//!     chunk_mesher::ManifestTask::new(prefix, 0)
//!         .with_mesh_dir("mesh_mip_0")
//!         .execute(&storage)?;
//! }
//! ```

pub mod error;
pub mod export;
pub mod labels;
pub mod manifest;
pub mod mesher;
pub mod quantization;
pub mod storage;
pub mod task;
pub mod types;
pub mod upload;

// Re-export main types for convenience
pub use error::{MeshTaskError, Result};
pub use export::{DracoEncoder, Encoding};
pub use labels::{LabelPreprocessor, RemapTable, RenumberMap};
pub use manifest::{covering_prefixes, ManifestReport, ManifestTask};
pub use mesher::{Mesh, Mesher};
pub use quantization::{BinSizeDivisor, DracoSettings};
pub use storage::{Compression, LocalStorage, MemoryStorage, ObjectStorage};
pub use task::{DownloadOptions, MeshTask, MeshTaskConfig, MeshTaskReport, TaskContext, VolumeSource};
pub use types::{Bbox, BoundingBox, LabelId, LabelVolume};
pub use upload::{FragmentLayout, ShardSpec};
