//! Record-driven detector construction.
//!
//! A [`DetectorLayout`] is the flat form in which placement data arrives
//! from the database layer: named designs plus one [`VolumeRecord`] per
//! placed volume, keyed by its expanded-id path. [`build_detector`]
//! turns it into a linked [`ElementManager`].

use std::collections::HashMap;
use std::sync::Arc;

use detgeo_core::ExpandedId;
use detgeo_ident::IdentifierHelper;
use glam::DAffine3;
use indexmap::IndexMap;

use crate::config::ManagerConfig;
use crate::design::Design;
use crate::element::SpatialElement;
use crate::error::BuildError;
use crate::manager::{ElementManager, ElementManagerBuilder};
use crate::placement::{PlacementTreeBuilder, VolumeId};

/// One placed volume.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeRecord {
    /// Expanded-id prefix naming the volume, outermost field first. The
    /// empty path is the world volume.
    pub path: ExpandedId,
    /// Placement relative to the nearest recorded ancestor.
    pub placement: DAffine3,
    /// Alignment level, if the volume is alignable.
    pub alignable_level: Option<u8>,
    /// Design name, for sensitive volumes at the hash level.
    pub design: Option<String>,
}

impl VolumeRecord {
    /// A plain, non-alignable volume.
    pub fn new(path: &[i32], placement: DAffine3) -> Self {
        Self {
            path: ExpandedId::from_slice(path),
            placement,
            alignable_level: None,
            design: None,
        }
    }

    /// Mark the volume alignable at `level`.
    pub fn alignable(mut self, level: u8) -> Self {
        self.alignable_level = Some(level);
        self
    }

    /// Make the volume a sensitive element of design `name`.
    pub fn sensitive(mut self, name: impl Into<String>) -> Self {
        self.design = Some(name.into());
        self
    }
}

/// Designs and volume records for one detector.
#[derive(Clone, Debug, Default)]
pub struct DetectorLayout {
    /// Designs by name.
    pub designs: IndexMap<String, Arc<Design>>,
    /// Every placed volume, in any order.
    pub volumes: Vec<VolumeRecord>,
}

impl DetectorLayout {
    /// An empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a design under its own name.
    pub fn design(mut self, design: Design) -> Self {
        self.designs.insert(design.name.clone(), Arc::new(design));
        self
    }

    /// Add a volume record.
    pub fn volume(mut self, record: VolumeRecord) -> Self {
        self.volumes.push(record);
        self
    }
}

/// Build a linked [`ElementManager`] from `layout`.
///
/// Records are placed parent-first: each volume's parent is the record
/// with the longest proper prefix of its path, or none. Every non-empty
/// path must be a legal identifier prefix. Records carrying a design at
/// the hash-level depth become elements; alignable records register
/// under `(level, compose(path))`.
pub fn build_detector(
    helper: Arc<IdentifierHelper>,
    layout: &DetectorLayout,
    config: ManagerConfig,
) -> Result<ElementManager, BuildError> {
    let result = build(helper, layout, config);
    if let Err(e) = &result {
        tracing::warn!(error = %e, "detector build failed");
    }
    result
}

fn build(
    helper: Arc<IdentifierHelper>,
    layout: &DetectorLayout,
    config: ManagerConfig,
) -> Result<ElementManager, BuildError> {
    let mut records: Vec<&VolumeRecord> = layout.volumes.iter().collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));

    let mut tree = PlacementTreeBuilder::new();
    let mut by_path: HashMap<&[i32], VolumeId> = HashMap::with_capacity(records.len());
    let mut placed: Vec<(&VolumeRecord, VolumeId)> = Vec::with_capacity(records.len());

    for record in records {
        let path = record.path.as_slice();
        if !path.is_empty() {
            helper.compose(path)?;
        }
        if by_path.contains_key(path) {
            return Err(BuildError::DuplicateVolume {
                path: format!("{path:?}"),
            });
        }
        let parent = (0..path.len())
            .rev()
            .find_map(|depth| by_path.get(&path[..depth]).copied());
        let volume = match parent {
            Some(parent) => tree.add_child(parent, record.placement)?,
            None => tree.add_root(record.placement),
        };
        by_path.insert(path, volume);
        placed.push((record, volume));
    }

    let placements = tree.finish();
    let mut builder =
        ElementManagerBuilder::new(Arc::clone(&helper), Arc::clone(&placements), config);
    let depth = helper.hash_level() + 1;

    for &(record, volume) in &placed {
        let id = helper.compose(&record.path)?;
        if let Some(name) = &record.design {
            if record.path.len() == depth {
                let design = layout
                    .designs
                    .get(name)
                    .ok_or_else(|| BuildError::MissingDesign { name: name.clone() })?;
                let index = helper.hash_of(id).ok_or(BuildError::UnknownId { id })?;
                let element = SpatialElement::new(
                    id,
                    index,
                    Arc::clone(design),
                    Arc::clone(&placements),
                    volume,
                    DAffine3::IDENTITY,
                )?;
                builder.add_element(element)?;
            } else {
                tracing::warn!(
                    path = ?record.path,
                    design = %name,
                    "design on a volume above the hash level ignored"
                );
            }
        }
        if let Some(level) = record.alignable_level {
            builder.register_alignable(level, id, volume)?;
        }
    }

    tracing::debug!(
        volumes = placements.len(),
        designs = layout.designs.len(),
        "placement tree built"
    );
    Ok(builder.init_neighbours())
}
