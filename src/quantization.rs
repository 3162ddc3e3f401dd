//! Draco quantization parameters derived from chunk geometry.
//!
//! Adjacent chunks are encoded independently, so their quantization grids must
//! line up exactly where their meshes meet. Everything here works in integer
//! physical units; Draco rejects a range that is not exactly
//! `bin_size * (2^bits - 1)`.

use glam::{DVec3, I64Vec3};
use serde::{Deserialize, Serialize};

/// Solved quantization grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quantization {
    pub bits: u32,
    pub range: u64,
    pub bin_size: u64,
}

impl Quantization {
    pub fn num_bins(&self) -> u64 {
        num_bins(self.bits)
    }
}

fn num_bins(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Smallest `b` with `(2^b - 1) * max_bin_size >= min_range`.
fn minimum_bits(min_range: u64, max_bin_size: u64) -> u32 {
    let mut bits = 1;
    while bits < 63 && num_bins(bits).saturating_mul(max_bin_size) < min_range {
        bits += 1;
    }
    bits
}

/// Solve for quantization bits, range and bin size.
///
/// `min_range` is the physical extent the grid has to cover and `max_bin_size`
/// the coarsest bin that still keeps vertices within the mesher's accuracy.
/// Both are clamped to at least 1. When `bits` is given it is used as the
/// starting precision.
pub fn solve(min_range: u64, max_bin_size: u64, bits: Option<u32>) -> Quantization {
    let min_range = min_range.max(1);
    let max_bin_size = max_bin_size.max(1);
    let bits = bits
        .unwrap_or_else(|| minimum_bits(min_range, max_bin_size))
        .clamp(1, 63);

    let bins = num_bins(bits);
    let mut bin_size = min_range.div_ceil(bins);
    let mut range = bin_size * bins;

    // Vertices may land exactly on the far face, so one extra bin of headroom
    // is needed.
    if range < min_range + bin_size {
        if bin_size == max_bin_size && bits < 63 {
            return solve(min_range, max_bin_size, Some(bits + 1));
        }
        bin_size += 1;
        range += bins;
    }

    Quantization {
        bits,
        range,
        bin_size,
    }
}

/// How the maximum bin size is derived from the dataset resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSizeDivisor {
    /// `floor(min(resolution) / sqrt(2))`
    #[default]
    Sqrt2,
    /// `floor(min(resolution) / 2)`, used by newer graphene datasets.
    Two,
}

impl BinSizeDivisor {
    fn value(self) -> f64 {
        match self {
            BinSizeDivisor::Sqrt2 => std::f64::consts::SQRT_2,
            BinSizeDivisor::Two => 2.0,
        }
    }
}

/// Largest bin the mesher's vertex displacement can tolerate.
pub fn max_bin_size(resolution: DVec3, divisor: BinSizeDivisor) -> u64 {
    let size = (resolution.min_element() / divisor.value()).floor();
    if size >= 1.0 {
        size as u64
    } else {
        1
    }
}

/// Largest physical extent of a chunk of `voxels` along any axis.
pub fn min_quantization_range(voxels: I64Vec3, resolution: DVec3) -> u64 {
    let extent = (voxels.as_dvec3() * resolution).max_element().ceil();
    if extent >= 1.0 {
        extent as u64
    } else {
        1
    }
}

/// Snap a physical offset down onto the bin grid.
pub fn quantization_origin(offset: DVec3, bin_size: u64) -> I64Vec3 {
    let offset = offset.floor().as_i64vec3();
    let bin = bin_size.max(1) as i64;
    offset - I64Vec3::new(
        offset.x.rem_euclid(bin),
        offset.y.rem_euclid(bin),
        offset.z.rem_euclid(bin),
    )
}

/// Full set of parameters handed to the Draco encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DracoSettings {
    pub quantization_bits: u32,
    pub quantization_range: u64,
    pub quantization_origin: I64Vec3,
    pub bin_size: u64,
    pub compression_level: u32,
    pub create_metadata: bool,
}

/// Geometry of one chunk as seen by the encoder.
#[derive(Debug, Clone, Copy)]
pub struct ChunkGeometry {
    /// Nominal chunk size in voxels.
    pub shape: I64Vec3,
    /// Nominal chunk offset in voxels.
    pub offset: I64Vec3,
    /// Extra voxels meshed beyond `shape` (low plus high padding).
    pub overlap: i64,
    pub resolution: DVec3,
    pub divisor: BinSizeDivisor,
}

impl DracoSettings {
    pub fn for_chunk(geometry: &ChunkGeometry, compression_level: u32, create_metadata: bool) -> Self {
        let min_range = min_quantization_range(
            geometry.shape + I64Vec3::splat(geometry.overlap),
            geometry.resolution,
        );
        let max_bin = max_bin_size(geometry.resolution, geometry.divisor);
        let solved = solve(min_range, max_bin, None);
        let origin = quantization_origin(
            geometry.offset.as_dvec3() * geometry.resolution,
            solved.bin_size,
        );

        Self {
            quantization_bits: solved.bits,
            quantization_range: solved.range,
            quantization_origin: origin,
            bin_size: solved.bin_size,
            compression_level,
            create_metadata,
        }
    }
}
