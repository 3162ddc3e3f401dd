//! Sharded mesh storage seam.

use crate::error::Result;
use crate::types::LabelId;
use std::collections::BTreeMap;

/// Chunk-graph layer whose meshes a direct shard upload produces.
pub const INITIAL_LAYER_ID: u32 = 2;

/// A dataset's sharding scheme.
///
/// Shard layout and the id-to-shard hash are defined by the dataset, not by
/// this crate.
pub trait ShardSpec {
    /// Pack many objects' fragments into one shard file.
    fn synthesize_shard(&self, meshes: &BTreeMap<LabelId, Vec<u8>>) -> Result<Vec<u8>>;

    /// Shard filename holding `id`.
    fn filename(&self, id: LabelId) -> String;
}
