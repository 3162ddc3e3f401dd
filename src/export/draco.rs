//! Draco encoding seam.
//!
//! The Draco codec itself lives outside this crate; callers plug in an
//! implementation of [`DracoEncoder`].

use crate::error::Result;
use crate::mesher::Mesh;
use crate::quantization::DracoSettings;

/// Encodes flat vertex and face arrays into a Draco bitstream.
pub trait DracoEncoder {
    fn encode(&self, positions: &[f32], faces: &[u32], settings: &DracoSettings) -> Result<Vec<u8>>;
}

/// Encode a mesh with the chunk's quantization settings.
pub fn encode(encoder: &dyn DracoEncoder, mesh: &Mesh, settings: &DracoSettings) -> Result<Vec<u8>> {
    encoder.encode(&mesh.positions_flat(), &mesh.faces_flat(), settings)
}
