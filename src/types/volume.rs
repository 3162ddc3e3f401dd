//! Dense label volumes.

use crate::error::{MeshTaskError, Result};

/// A dense `[x, y, z, channel]` array of label ids.
///
/// Storage is column-major (x varies fastest), matching how segmentation
/// chunks are laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVolume {
    shape: [usize; 4],
    labels: Vec<u64>,
}

impl LabelVolume {
    pub fn new(shape: [usize; 4], labels: Vec<u64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if labels.len() != expected {
            return Err(MeshTaskError::Download(format!(
                "volume of shape {:?} needs {} labels, got {}",
                shape,
                expected,
                labels.len()
            )));
        }
        Ok(Self { shape, labels })
    }

    /// All-background volume with a single channel.
    pub fn zeros(size: [usize; 3]) -> Self {
        let shape = [size[0], size[1], size[2], 1];
        Self {
            shape,
            labels: vec![0; shape.iter().product()],
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Spatial extent, ignoring channels.
    pub fn size(&self) -> [usize; 3] {
        [self.shape[0], self.shape[1], self.shape[2]]
    }

    pub fn labels(&self) -> &[u64] {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut [u64] {
        &mut self.labels
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize, c: usize) -> usize {
        x + self.shape[0] * (y + self.shape[1] * (z + self.shape[2] * c))
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u64 {
        self.labels[self.index(x, y, z, 0)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, label: u64) {
        let i = self.index(x, y, z, 0);
        self.labels[i] = label;
    }

    /// True if any voxel holds a non-background label.
    pub fn has_foreground(&self) -> bool {
        self.labels.iter().any(|&l| l != 0)
    }

    /// Extract a single channel as its own volume.
    pub fn channel(&self, c: usize) -> Option<LabelVolume> {
        if c >= self.shape[3] {
            return None;
        }
        let per_channel = self.shape[0] * self.shape[1] * self.shape[2];
        let start = per_channel * c;
        Some(LabelVolume {
            shape: [self.shape[0], self.shape[1], self.shape[2], 1],
            labels: self.labels[start..start + per_channel].to_vec(),
        })
    }

    /// Consume the volume, keeping only channel 0.
    pub fn into_first_channel(mut self) -> LabelVolume {
        let per_channel = self.shape[0] * self.shape[1] * self.shape[2];
        self.labels.truncate(per_channel);
        self.shape[3] = 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_is_x_fastest() {
        let volume = LabelVolume::new([2, 2, 1, 1], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(volume.get(1, 0, 0), 2);
        assert_eq!(volume.get(0, 1, 0), 3);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        assert!(LabelVolume::new([2, 2, 2, 1], vec![0; 7]).is_err());
    }

    #[test]
    fn test_channels() {
        let volume = LabelVolume::new([1, 1, 2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(volume.channel(1).unwrap().labels(), &[3, 4]);
        assert!(volume.channel(2).is_none());
        assert_eq!(volume.into_first_channel().labels(), &[1, 2]);
    }

    #[test]
    fn test_foreground() {
        let mut volume = LabelVolume::zeros([4, 4, 4]);
        assert!(!volume.has_foreground());
        volume.set(3, 3, 3, 9);
        assert!(volume.has_foreground());
    }
}
