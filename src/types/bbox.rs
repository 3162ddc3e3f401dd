//! Axis-aligned boxes in voxel and physical space.

use glam::{DVec3, I64Vec3, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer box in voxel space, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bbox {
    pub min: I64Vec3,
    pub max: I64Vec3,
}

impl Bbox {
    pub fn new(min: I64Vec3, max: I64Vec3) -> Self {
        Self { min, max }
    }

    /// Box starting at `offset` and spanning `shape` voxels.
    pub fn from_offset_shape(offset: I64Vec3, shape: I64Vec3) -> Self {
        Self {
            min: offset,
            max: offset + shape,
        }
    }

    /// Size along each axis.
    pub fn size(&self) -> I64Vec3 {
        self.max - self.min
    }

    /// Number of voxels enclosed.
    pub fn volume(&self) -> i64 {
        let size = self.size().max(I64Vec3::ZERO);
        size.x * size.y * size.z
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Intersect with `bounds`.
    ///
    /// The result is always contained in `bounds`; a box that lies entirely
    /// outside collapses to an empty box on the nearest face.
    pub fn clamp(&self, bounds: &Bbox) -> Bbox {
        let min = self.min.clamp(bounds.min, bounds.max);
        let max = self.max.clamp(bounds.min, bounds.max).max(min);
        Bbox { min, max }
    }

    /// Grow by `low` voxels below the minimum corner and `high` above the maximum.
    pub fn padded(&self, low: i64, high: i64) -> Bbox {
        Bbox {
            min: self.min - I64Vec3::splat(low),
            max: self.max + I64Vec3::splat(high),
        }
    }

    /// Midpoint in voxel coordinates.
    pub fn center(&self) -> DVec3 {
        (self.min.as_dvec3() + self.max.as_dvec3()) / 2.0
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains_bbox(&self, other: &Bbox) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Minimum and maximum corners scaled into physical units.
    pub fn to_physical(&self, resolution: DVec3) -> (DVec3, DVec3) {
        (
            self.min.as_dvec3() * resolution,
            self.max.as_dvec3() * resolution,
        )
    }

    /// Filename-safe encoding: `{x0}-{x1}_{y0}-{y1}_{z0}-{z1}`.
    ///
    /// Fragment keys of adjacent chunks depend on this string, so its format
    /// must not change.
    pub fn to_filename(&self) -> String {
        format!(
            "{}-{}_{}-{}_{}-{}",
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z
        )
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bbox([{}, {}, {}], [{}, {}, {}])",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

/// An axis-aligned bounding box in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl Iterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut has_points = false;

        for p in points {
            has_points = true;
            min = min.min(p);
            max = max.max(p);
        }

        if has_points {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// `[min_x, min_y, min_z, max_x, max_y, max_z]`, the spatial index layout.
    pub fn to_list(&self) -> [f32; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }
}
