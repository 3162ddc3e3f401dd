//! Triangle meshes as returned by the surface mesher.

use crate::types::BoundingBox;
use glam::Vec3;

/// A triangle mesh for one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Triangles as vertex index triples.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex, returning its index.
    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Append a face.
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.faces.push([i0, i1, i2]);
    }

    /// Add a quad (two triangles) by vertex indices, wound CCW.
    pub fn add_quad(&mut self, i0: u32, i1: u32, i2: u32, i3: u32) {
        self.add_triangle(i0, i2, i1);
        self.add_triangle(i0, i3, i2);
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True when there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shift every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    /// Per-axis extent of the vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().copied())
    }

    /// Positions as a flat `x, y, z, x, y, z, ...` array.
    pub fn positions_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.to_array()).collect()
    }

    /// Face indices as a flat array.
    pub fn faces_flat(&self) -> Vec<u32> {
        self.faces.iter().flat_map(|f| f.iter().copied()).collect()
    }

    /// Every face references an existing vertex.
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.faces.iter().flatten().all(|&i| i < n)
    }
}
