//! Cleanup and relabeling applied to a downloaded chunk before meshing.

use super::ops::{self, RenumberMap};
use crate::types::{LabelId, LabelVolume, BACKGROUND};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Agglomeration table mapping original ids to target ids.
///
/// Background always maps to background. Ids outside the table become
/// background when the table is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<LabelId, LabelId>", into = "HashMap<LabelId, LabelId>")]
pub struct RemapTable {
    mapping: HashMap<LabelId, LabelId>,
}

impl RemapTable {
    pub fn new(mapping: HashMap<LabelId, LabelId>) -> Self {
        let mut mapping = mapping;
        mapping.insert(BACKGROUND, BACKGROUND);
        Self { mapping }
    }

    pub fn get(&self, id: LabelId) -> Option<LabelId> {
        self.mapping.get(&id).copied()
    }

    /// Ids the table knows about, background included.
    pub fn domain(&self) -> HashSet<LabelId> {
        self.mapping.keys().copied().collect()
    }

    /// Mask everything outside the table, then relabel.
    pub fn apply(&self, volume: &mut LabelVolume) {
        ops::mask_except(volume, &self.domain());
        ops::remap(volume, &self.mapping);
    }
}

impl From<HashMap<LabelId, LabelId>> for RemapTable {
    fn from(mapping: HashMap<LabelId, LabelId>) -> Self {
        RemapTable::new(mapping)
    }
}

impl From<RemapTable> for HashMap<LabelId, LabelId> {
    fn from(table: RemapTable) -> Self {
        table.mapping
    }
}

/// Dust removal, agglomeration, allow-list and dense renumbering, in that order.
///
/// Dust is counted on the raw labels, before any agglomeration merges small
/// pieces into larger objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelPreprocessor<'a> {
    /// Labels with strictly fewer voxels are dropped.
    pub dust_threshold: Option<u64>,
    pub remap_table: Option<&'a RemapTable>,
    /// Keep only these ids (after remapping). An empty list keeps everything.
    pub object_ids: Option<&'a [LabelId]>,
}

impl<'a> LabelPreprocessor<'a> {
    pub fn remove_dust(&self, volume: &mut LabelVolume) {
        let Some(threshold) = self.dust_threshold else {
            return;
        };
        let dust: HashSet<LabelId> = ops::unique_with_counts(volume)
            .into_iter()
            .filter(|&(id, count)| id != BACKGROUND && count < threshold)
            .map(|(id, _)| id)
            .collect();
        if !dust.is_empty() {
            log::debug!("removing {} dust labels below {} voxels", dust.len(), threshold);
        }
        ops::mask(volume, &dust);
    }

    /// Run every configured step. Returns `None` if nothing survives.
    pub fn process(&self, volume: &mut LabelVolume) -> Option<RenumberMap> {
        self.remove_dust(volume);

        if let Some(table) = self.remap_table {
            table.apply(volume);
        }

        if let Some(ids) = self.object_ids.filter(|ids| !ids.is_empty()) {
            let keep: HashSet<LabelId> = ids.iter().copied().collect();
            ops::mask_except(volume, &keep);
        }

        if !volume.has_foreground() {
            return None;
        }

        Some(ops::renumber(volume))
    }
}
