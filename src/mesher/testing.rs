//! Test doubles for the external collaborators.

use super::{Mesh, Mesher};
use crate::error::{MeshTaskError, Result};
use crate::export::DracoEncoder;
use crate::quantization::DracoSettings;
use crate::types::{LabelId, LabelVolume, BACKGROUND};
use crate::upload::ShardSpec;
use glam::{DVec3, Vec3};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Meshes every label as the cuboid enclosing its voxels.
#[derive(Debug)]
pub struct BoxMesher {
    resolution: DVec3,
    meshes: BTreeMap<LabelId, Mesh>,
    erased: Vec<LabelId>,
    meshed_volumes: usize,
}

impl BoxMesher {
    pub fn new(resolution: DVec3) -> Self {
        Self {
            resolution,
            meshes: BTreeMap::new(),
            erased: Vec::new(),
            meshed_volumes: 0,
        }
    }

    pub fn erased(&self) -> &[LabelId] {
        &self.erased
    }

    pub fn meshed_volumes(&self) -> usize {
        self.meshed_volumes
    }

    fn cuboid(&self, min: [usize; 3], max: [usize; 3]) -> Mesh {
        let lo = DVec3::new(min[0] as f64, min[1] as f64, min[2] as f64) * self.resolution;
        let hi = DVec3::new(max[0] as f64 + 1.0, max[1] as f64 + 1.0, max[2] as f64 + 1.0)
            * self.resolution;
        let (lo, hi) = (lo.as_vec3(), hi.as_vec3());

        let mut mesh = Mesh::new();
        for i in 0..8u32 {
            mesh.add_vertex(Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            ));
        }
        mesh.add_quad(0, 2, 3, 1);
        mesh.add_quad(4, 5, 7, 6);
        mesh.add_quad(0, 1, 5, 4);
        mesh.add_quad(2, 6, 7, 3);
        mesh.add_quad(0, 4, 6, 2);
        mesh.add_quad(1, 3, 7, 5);
        mesh
    }
}

impl Mesher for BoxMesher {
    fn mesh(&mut self, labels: &LabelVolume) -> Result<()> {
        self.meshed_volumes += 1;
        let [sx, sy, sz] = labels.size();
        let mut extents: BTreeMap<LabelId, ([usize; 3], [usize; 3])> = BTreeMap::new();
        for z in 0..sz {
            for y in 0..sy {
                for x in 0..sx {
                    let label = labels.get(x, y, z);
                    if label == BACKGROUND {
                        continue;
                    }
                    let e = extents.entry(label).or_insert(([x, y, z], [x, y, z]));
                    e.0 = [e.0[0].min(x), e.0[1].min(y), e.0[2].min(z)];
                    e.1 = [e.1[0].max(x), e.1[1].max(y), e.1[2].max(z)];
                }
            }
        }
        for (label, (min, max)) in extents {
            let mesh = self.cuboid(min, max);
            self.meshes.insert(label, mesh);
        }
        Ok(())
    }

    fn ids(&self) -> Vec<LabelId> {
        self.meshes.keys().copied().collect()
    }

    fn get_mesh(&mut self, id: LabelId, _: u32, _: f64) -> Result<Mesh> {
        self.meshes
            .get(&id)
            .cloned()
            .ok_or_else(|| MeshTaskError::Mesher(format!("no mesh for {}", id)))
    }

    fn erase(&mut self, id: LabelId) {
        self.meshes.remove(&id);
        self.erased.push(id);
    }
}

/// Stands in for the Draco codec: records settings and emits a tagged buffer.
#[derive(Default)]
pub struct RecordingDraco {
    pub calls: Mutex<Vec<DracoSettings>>,
}

impl DracoEncoder for RecordingDraco {
    fn encode(&self, positions: &[f32], faces: &[u32], settings: &DracoSettings) -> Result<Vec<u8>> {
        self.calls.lock().push(*settings);
        let mut out = b"DRACO".to_vec();
        out.extend_from_slice(&(positions.len() as u32).to_le_bytes());
        out.extend_from_slice(&(faces.len() as u32).to_le_bytes());
        Ok(out)
    }
}

/// Concatenates fragments and names the shard after the id it is asked about.
pub struct ConcatShard;

impl ShardSpec for ConcatShard {
    fn synthesize_shard(&self, meshes: &BTreeMap<LabelId, Vec<u8>>) -> Result<Vec<u8>> {
        Ok(meshes.values().flatten().copied().collect())
    }

    fn filename(&self, id: LabelId) -> String {
        format!("{}.shard", id)
    }
}
