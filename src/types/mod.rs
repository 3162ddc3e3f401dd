//! Shared types used throughout the library.

mod bbox;
mod volume;

pub use bbox::{Bbox, BoundingBox};
pub use volume::LabelVolume;

/// A segmentation label. `0` is background.
pub type LabelId = u64;

/// The background label.
pub const BACKGROUND: LabelId = 0;
