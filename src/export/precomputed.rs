//! Neuroglancer legacy precomputed mesh fragments.
//!
//! Layout (little-endian):
//!   u32            vertex_count
//!   f32[3 * n]     vertex positions
//!   u32[...]       triangle indices, three per face, to end of buffer

use crate::error::{MeshTaskError, Result};
use crate::mesher::Mesh;
use glam::Vec3;

/// Serialize a mesh into the precomputed fragment layout.
pub fn encode(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + mesh.vertex_count() * 12 + mesh.triangle_count() * 12);
    out.extend_from_slice(&(mesh.vertex_count() as u32).to_le_bytes());
    for v in &mesh.vertices {
        for c in v.to_array() {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
    for face in &mesh.faces {
        for i in face {
            out.extend_from_slice(&i.to_le_bytes());
        }
    }
    out
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| MeshTaskError::Encode("truncated precomputed mesh".to_string()))
}

/// Parse a precomputed fragment back into a mesh.
pub fn decode(buf: &[u8]) -> Result<Mesh> {
    let vertex_count = read_u32(buf, 0)? as usize;
    let faces_start = 4 + vertex_count * 12;
    if buf.len() < faces_start || (buf.len() - faces_start) % 12 != 0 {
        return Err(MeshTaskError::Encode(format!(
            "precomputed mesh of {} bytes does not hold {} vertices and whole faces",
            buf.len(),
            vertex_count
        )));
    }

    let mut mesh = Mesh::new();
    for vertex in buf[4..faces_start].chunks_exact(12) {
        let c = |k: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&vertex[k * 4..k * 4 + 4]);
            f32::from_le_bytes(word)
        };
        mesh.add_vertex(Vec3::new(c(0), c(1), c(2)));
    }

    let mut at = faces_start;
    while at < buf.len() {
        mesh.add_triangle(read_u32(buf, at)?, read_u32(buf, at + 4)?, read_u32(buf, at + 8)?);
        at += 12;
    }

    if !mesh.is_valid() {
        return Err(MeshTaskError::Encode(
            "precomputed mesh references a missing vertex".to_string(),
        ));
    }
    Ok(mesh)
}
