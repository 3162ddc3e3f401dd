//! Per-object placement, bounds and encoding of meshes pulled from a [`Mesher`].

use super::{Mesh, Mesher};
use crate::error::{MeshTaskError, Result};
use crate::export::MeshEncoder;
use crate::labels::RenumberMap;
use crate::types::{BoundingBox, LabelId};
use glam::{DVec3, I64Vec3, Vec3};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// One object's encoded fragment for this chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMesh {
    pub bytes: Vec<u8>,
    /// Physical bounds after placement.
    pub bounds: BoundingBox,
}

/// Places each mesh in dataset coordinates and encodes it.
#[derive(Debug, Clone, Copy)]
pub struct MeshPostprocessor<'a> {
    /// Physical offset added to every vertex.
    pub offset: Vec3,
    pub encoder: MeshEncoder<'a>,
    pub simplification_factor: u32,
    pub max_simplification_error: f64,
}

/// Physical position of the first voxel handed to the mesher.
///
/// `origin` is the voxel corner of the meshed data, i.e. the task box minimum
/// less the low padding.
pub fn placement(origin: I64Vec3, resolution: DVec3) -> Vec3 {
    (origin.as_dvec3() * resolution).as_vec3()
}

impl<'a> MeshPostprocessor<'a> {
    /// Fetch, erase, place and encode one object.
    ///
    /// The mesher's copy is erased before anything else happens so a failure
    /// further down never leaves it holding the object. Returns `None` for an
    /// object whose mesh has no vertices.
    pub fn create_mesh<M: Mesher + ?Sized>(
        &self,
        mesher: &mut M,
        id: LabelId,
    ) -> Result<Option<EncodedMesh>> {
        let mesh = mesher.get_mesh(id, self.simplification_factor, self.max_simplification_error);
        mesher.erase(id);
        let mut mesh: Mesh = mesh?;

        if !mesh.is_valid() {
            return Err(MeshTaskError::Mesher(format!(
                "mesh for {} references missing vertices",
                id
            )));
        }

        mesh.translate(self.offset);
        let Some(bounds) = mesh.bounds() else {
            log::warn!("mesher returned an empty mesh for {}", id);
            return Ok(None);
        };

        let bytes = self.encoder.encode(&mesh)?;
        Ok(Some(EncodedMesh { bytes, bounds }))
    }

    /// Process every object the mesher holds, keyed by original label id.
    ///
    /// With a renumber map, mesher ids are compact and get mapped back; an id
    /// missing from the map is an error. Without one, mesher ids are used as is.
    pub fn create_meshes<M: Mesher + ?Sized>(
        &self,
        mesher: &mut M,
        renumber: Option<&RenumberMap>,
        progress: bool,
    ) -> Result<BTreeMap<LabelId, EncodedMesh>> {
        let mut ids = mesher.ids();
        ids.sort_unstable();

        let pb = if progress {
            ProgressBar::new(ids.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} objects {msg}")
        {
            pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ "));
        }
        pb.set_message("Mesh");

        let mut meshes = BTreeMap::new();
        for id in ids {
            let original = match renumber {
                Some(map) => map.original(id).ok_or_else(|| {
                    MeshTaskError::Mesher(format!("mesher produced unknown id {}", id))
                })?,
                None => id,
            };
            if let Some(encoded) = self.create_mesh(mesher, id)? {
                meshes.insert(original, encoded);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(meshes)
    }
}
