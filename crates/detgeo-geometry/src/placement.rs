//! Placement tree: the chain of rigid transforms from the world volume
//! down to each sensitive element, with one overwriteable alignment
//! delta per volume.

use std::fmt;
use std::sync::Arc;

use glam::DAffine3;
use parking_lot::RwLock;

use crate::error::BuildError;

/// Index of a volume in a [`PlacementTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(pub u32);

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug)]
struct Volume {
    parent: Option<VolumeId>,
    local: DAffine3,
    delta: RwLock<DAffine3>,
}

/// Arena of volumes, parents strictly before children.
///
/// `absolute(v) = absolute(parent) · local(v) · delta(v)`. Placements are
/// frozen at build time; only deltas change afterwards, through a
/// per-volume `RwLock` so readers never see a torn transform.
#[derive(Debug)]
pub struct PlacementTree {
    volumes: Vec<Volume>,
}

// Compile-time assertion: PlacementTree must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<PlacementTree>();
};

impl PlacementTree {
    /// Number of volumes.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether the tree holds no volumes.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Whether `volume` belongs to this tree.
    pub fn contains(&self, volume: VolumeId) -> bool {
        (volume.0 as usize) < self.volumes.len()
    }

    fn get(&self, volume: VolumeId) -> Option<&Volume> {
        self.volumes.get(volume.0 as usize)
    }

    /// Parent of `volume`, `None` for roots and unknown volumes.
    pub fn parent(&self, volume: VolumeId) -> Option<VolumeId> {
        self.get(volume)?.parent
    }

    /// Placement of `volume` relative to its parent.
    pub fn local(&self, volume: VolumeId) -> Option<DAffine3> {
        self.get(volume).map(|v| v.local)
    }

    /// Current alignment delta of `volume`.
    pub fn delta(&self, volume: VolumeId) -> Option<DAffine3> {
        self.get(volume).map(|v| *v.delta.read())
    }

    /// Replace the alignment delta of `volume`. Returns `false` for
    /// unknown volumes.
    pub fn set_delta(&self, volume: VolumeId, delta: DAffine3) -> bool {
        match self.get(volume) {
            Some(v) => {
                *v.delta.write() = delta;
                true
            }
            None => false,
        }
    }

    /// Reset every delta to identity.
    pub fn reset_deltas(&self) {
        for v in &self.volumes {
            *v.delta.write() = DAffine3::IDENTITY;
        }
    }

    /// Aligned volume-to-world transform.
    pub fn absolute(&self, volume: VolumeId) -> Option<DAffine3> {
        self.compose(volume, true)
    }

    /// Volume-to-world transform ignoring every delta.
    pub fn default_absolute(&self, volume: VolumeId) -> Option<DAffine3> {
        self.compose(volume, false)
    }

    fn compose(&self, volume: VolumeId, aligned: bool) -> Option<DAffine3> {
        let mut chain = Vec::new();
        let mut cursor = Some(volume);
        while let Some(id) = cursor {
            let v = self.get(id)?;
            chain.push(v);
            cursor = v.parent;
        }
        Some(chain.iter().rev().fold(DAffine3::IDENTITY, |acc, v| {
            if aligned {
                acc * v.local * *v.delta.read()
            } else {
                acc * v.local
            }
        }))
    }
}

/// Single-threaded builder for a [`PlacementTree`].
#[derive(Debug, Default)]
pub struct PlacementTreeBuilder {
    volumes: Vec<Volume>,
}

impl PlacementTreeBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level volume placed in the world frame.
    pub fn add_root(&mut self, placement: DAffine3) -> VolumeId {
        self.push(None, placement)
    }

    /// Add a volume placed relative to `parent`.
    pub fn add_child(
        &mut self,
        parent: VolumeId,
        placement: DAffine3,
    ) -> Result<VolumeId, BuildError> {
        if (parent.0 as usize) >= self.volumes.len() {
            return Err(BuildError::UnknownVolume { volume: parent.0 });
        }
        Ok(self.push(Some(parent), placement))
    }

    fn push(&mut self, parent: Option<VolumeId>, local: DAffine3) -> VolumeId {
        let id = VolumeId(self.volumes.len() as u32);
        self.volumes.push(Volume {
            parent,
            local,
            delta: RwLock::new(DAffine3::IDENTITY),
        });
        id
    }

    /// Number of volumes added so far.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether no volume has been added.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Freeze the placements.
    pub fn finish(self) -> Arc<PlacementTree> {
        Arc::new(PlacementTree {
            volumes: self.volumes,
        })
    }
}
