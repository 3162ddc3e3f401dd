//! In-place set and mapping operations over label volumes.

use crate::types::{LabelId, LabelVolume, BACKGROUND};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Voxel count for every label present, background included.
pub fn unique_with_counts(volume: &LabelVolume) -> BTreeMap<LabelId, u64> {
    let mut counts = BTreeMap::new();
    for &label in volume.labels() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Set every voxel whose label is in `ids` to background.
pub fn mask(volume: &mut LabelVolume, ids: &HashSet<LabelId>) {
    if ids.is_empty() {
        return;
    }
    for label in volume.labels_mut() {
        if ids.contains(label) {
            *label = BACKGROUND;
        }
    }
}

/// Set every voxel whose label is not in `keep` to background.
pub fn mask_except(volume: &mut LabelVolume, keep: &HashSet<LabelId>) {
    for label in volume.labels_mut() {
        if !keep.contains(label) {
            *label = BACKGROUND;
        }
    }
}

/// Relabel through `table`. Labels missing from the table are left alone.
pub fn remap(volume: &mut LabelVolume, table: &HashMap<LabelId, LabelId>) {
    for label in volume.labels_mut() {
        if let Some(&target) = table.get(label) {
            *label = target;
        }
    }
}

/// Bijection between compact ids handed to the mesher and the original ids.
///
/// Compact ids are contiguous from 1 in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenumberMap {
    originals: Vec<LabelId>,
}

impl RenumberMap {
    /// Original id for a compact id.
    pub fn original(&self, compact: LabelId) -> Option<LabelId> {
        if compact == BACKGROUND {
            return Some(BACKGROUND);
        }
        usize::try_from(compact - 1)
            .ok()
            .and_then(|i| self.originals.get(i).copied())
    }

    /// Number of foreground labels.
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// `(compact, original)` pairs in compact order.
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, LabelId)> + '_ {
        self.originals
            .iter()
            .enumerate()
            .map(|(i, &original)| (i as LabelId + 1, original))
    }

    /// Undo [`renumber`] on a volume that still holds compact ids.
    pub fn restore(&self, volume: &mut LabelVolume) {
        for label in volume.labels_mut() {
            if let Some(original) = self.original(*label) {
                *label = original;
            }
        }
    }
}

/// Relabel foreground ids to `1..=n`, returning the map back to the originals.
pub fn renumber(volume: &mut LabelVolume) -> RenumberMap {
    let mut compact: HashMap<LabelId, LabelId> = HashMap::new();
    let mut originals = Vec::new();

    for label in volume.labels_mut() {
        if *label == BACKGROUND {
            continue;
        }
        let next = originals.len() as LabelId + 1;
        let id = *compact.entry(*label).or_insert_with(|| {
            originals.push(*label);
            next
        });
        *label = id;
    }

    RenumberMap { originals }
}
