//! Label cleanup ahead of meshing.
//!
//! [`ops`] holds the primitive set and mapping operations; [`preprocess`]
//! chains them into the per-chunk pipeline.

pub mod ops;
pub mod preprocess;

pub use ops::RenumberMap;
pub use preprocess::{LabelPreprocessor, RemapTable};
