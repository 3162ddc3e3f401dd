//! The surface mesher seam and per-object mesh postprocessing.
//!
//! Marching cubes and simplification run in an external mesher. A task owns
//! one [`Mesher`] for its lifetime and erases each object after pulling it,
//! since the mesher keeps every object's surface until told otherwise.

pub mod geometry;
pub mod postprocess;

#[cfg(test)]
pub(crate) mod testing;

pub use geometry::Mesh;
pub use postprocess::{placement, EncodedMesh, MeshPostprocessor};

use crate::error::Result;
use crate::types::{LabelId, LabelVolume};

/// An external surface mesher, exclusively owned by one task.
pub trait Mesher {
    /// Extract surfaces for every label in a single-channel volume.
    ///
    /// Vertices come back in physical units relative to the volume's first
    /// voxel.
    fn mesh(&mut self, labels: &LabelVolume) -> Result<()>;

    /// Ids with a surface currently held.
    fn ids(&self) -> Vec<LabelId>;

    /// Simplified mesh for one id.
    ///
    /// `simplification_factor` is the target triangle reduction and
    /// `max_simplification_error` the furthest, in physical units, a vertex
    /// may move while simplifying.
    fn get_mesh(
        &mut self,
        id: LabelId,
        simplification_factor: u32,
        max_simplification_error: f64,
    ) -> Result<Mesh>;

    /// Release the storage held for one id.
    fn erase(&mut self, id: LabelId);
}
