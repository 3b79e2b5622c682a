//! Dense element arena, neighbour wiring and the alignment registry.
//!
//! Construction is split across two types. [`ElementManagerBuilder`]
//! accepts elements and alignable registrations; consuming it with
//! [`init_neighbours`](ElementManagerBuilder::init_neighbours) wires
//! every neighbour link exactly once and yields the queryable
//! [`ElementManager`]. Neighbour and alignment queries do not exist on
//! the builder, so they cannot run before linking.

use std::sync::Arc;

use detgeo_core::{CompactId, DenseIndex, Direction};
use detgeo_ident::IdentifierHelper;
use glam::DAffine3;
use indexmap::IndexMap;

use crate::alignment::{AlignableLink, AlignmentDelta, AlignmentSummary, Frame};
use crate::config::{LocalFramePolicy, ManagerConfig};
use crate::element::SpatialElement;
use crate::error::{AlignError, BuildError};
use crate::placement::{PlacementTree, VolumeId};

/// Level-0 links by dense index; higher levels by `(level, id)`.
#[derive(Debug)]
struct LinkRegistry {
    elements: Vec<Option<AlignableLink>>,
    upper: IndexMap<(u8, CompactId), AlignableLink>,
}

impl LinkRegistry {
    fn new(slots: usize) -> Self {
        Self {
            elements: vec![None; slots],
            upper: IndexMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.elements.iter().flatten().count() + self.upper.len()
    }
}

/// Build-phase element container.
#[derive(Debug)]
pub struct ElementManagerBuilder {
    helper: Arc<IdentifierHelper>,
    placements: Arc<PlacementTree>,
    config: ManagerConfig,
    elements: Vec<Option<SpatialElement>>,
    links: LinkRegistry,
}

impl ElementManagerBuilder {
    /// An empty builder with one slot per id at the helper's hash level.
    pub fn new(
        helper: Arc<IdentifierHelper>,
        placements: Arc<PlacementTree>,
        config: ManagerConfig,
    ) -> Self {
        let slots = helper.len();
        Self {
            helper,
            placements,
            config,
            elements: (0..slots).map(|_| None).collect(),
            links: LinkRegistry::new(slots),
        }
    }

    /// The identifier helper elements are indexed by.
    pub fn helper(&self) -> &Arc<IdentifierHelper> {
        &self.helper
    }

    /// The shared placement tree.
    pub fn placements(&self) -> &Arc<PlacementTree> {
        &self.placements
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.elements.iter().flatten().count()
    }

    /// Insert `element` at its dense index.
    ///
    /// Fails if the index is out of bounds, the slot is taken, the id
    /// does not match the table, or the element was built against a
    /// different placement tree.
    pub fn add_element(&mut self, element: SpatialElement) -> Result<(), BuildError> {
        let index = element.index();
        let len = self.elements.len();
        let expected = self
            .helper
            .id_of(index)
            .ok_or(BuildError::IndexOutOfBounds { index, len })?;
        if expected != element.id() {
            return Err(BuildError::IdMismatch {
                index,
                expected,
                found: element.id(),
            });
        }
        if !Arc::ptr_eq(element.placements(), &self.placements) {
            return Err(BuildError::ForeignPlacement { index });
        }
        let slot = self
            .elements
            .get_mut(index.get())
            .ok_or(BuildError::IndexOutOfBounds { index, len })?;
        if slot.is_some() {
            return Err(BuildError::DuplicateElement { index });
        }
        *slot = Some(element);
        Ok(())
    }

    /// Register `volume` as the alignable for `(level, id)`, freezing its
    /// default absolute transform as the link's reference.
    ///
    /// Level-0 ids must be enumerated by the helper. Each key may be
    /// registered once.
    pub fn register_alignable(
        &mut self,
        level: u8,
        id: CompactId,
        volume: VolumeId,
    ) -> Result<(), BuildError> {
        let reference = self
            .placements
            .default_absolute(volume)
            .ok_or(BuildError::UnknownVolume { volume: volume.0 })?;

        if level == 0 {
            let index = self.helper.hash_of(id).ok_or(BuildError::UnknownId { id })?;
            let slot = self
                .links
                .elements
                .get_mut(index.get())
                .ok_or(BuildError::UnknownId { id })?;
            if slot.is_some() {
                return Err(BuildError::DuplicateAlignable { level, id });
            }
            *slot = Some(AlignableLink::new(level, id, volume, reference, Some(index)));
        } else {
            if self.links.upper.contains_key(&(level, id)) {
                return Err(BuildError::DuplicateAlignable { level, id });
            }
            self.links
                .upper
                .insert((level, id), AlignableLink::new(level, id, volume, reference, None));
        }
        tracing::trace!(level, id = %id, volume = %volume, "alignable registered");
        Ok(())
    }

    /// Wire every neighbour link from the helper's tables and finish the
    /// build. Links to empty slots stay `None`.
    pub fn init_neighbours(mut self) -> ElementManager {
        let occupied: Vec<bool> = self.elements.iter().map(Option::is_some).collect();
        let mut wired = 0usize;
        for element in self.elements.iter_mut().flatten() {
            for dir in Direction::ALL {
                let target = self
                    .helper
                    .neighbour(element.index(), dir)
                    .filter(|t| occupied.get(t.get()).copied().unwrap_or(false));
                wired += usize::from(target.is_some());
                element.set_neighbour(dir, target);
            }
        }
        let populated = occupied.iter().filter(|&&o| o).count();
        tracing::info!(
            elements = populated,
            slots = self.elements.len(),
            links = self.links.len(),
            neighbours = wired,
            "element manager linked"
        );
        ElementManager {
            helper: self.helper,
            placements: self.placements,
            config: self.config,
            elements: self.elements,
            links: self.links,
            populated,
        }
    }
}

/// Linked element container: dense elements, neighbours and alignment.
///
/// Safe to share across threads. Geometry reads are lock-free on a warm
/// cache; alignment updates are expected from one calibration actor at
/// a time and become visible to readers after
/// [`invalidate_all`](Self::invalidate_all).
#[derive(Debug)]
pub struct ElementManager {
    helper: Arc<IdentifierHelper>,
    placements: Arc<PlacementTree>,
    config: ManagerConfig,
    elements: Vec<Option<SpatialElement>>,
    links: LinkRegistry,
    populated: usize,
}

// Compile-time assertion: ElementManager must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ElementManager>();
};

impl ElementManager {
    /// Number of slots (ids at the hash level).
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.populated
    }

    /// The identifier helper.
    pub fn helper(&self) -> &Arc<IdentifierHelper> {
        &self.helper
    }

    /// The shared placement tree.
    pub fn placements(&self) -> &Arc<PlacementTree> {
        &self.placements
    }

    /// Active configuration.
    pub fn config(&self) -> ManagerConfig {
        self.config
    }

    /// Element at `index`, if populated.
    pub fn element(&self, index: DenseIndex) -> Option<&SpatialElement> {
        self.elements.get(index.get())?.as_ref()
    }

    /// Element with compact id `id`, if enumerated and populated.
    pub fn element_by_id(&self, id: CompactId) -> Option<&SpatialElement> {
        self.element(self.helper.hash_of(id)?)
    }

    /// Every populated element in dense-index order.
    pub fn elements(&self) -> impl Iterator<Item = &SpatialElement> + '_ {
        self.elements.iter().flatten()
    }

    /// Neighbour of `element` in `dir`.
    pub fn neighbour(&self, element: &SpatialElement, dir: Direction) -> Option<&SpatialElement> {
        self.element(element.neighbour(dir)?)
    }

    /// Link registered under `(level, id)`.
    ///
    /// A prefix id packs to the same value as its first child's id (the
    /// omitted fields pack as zero bits), so `[0, 1]` and `[0, 1, 0]` share a
    /// [`CompactId`]. Only `level` tells their links apart.
    pub fn link(&self, level: u8, id: CompactId) -> Option<&AlignableLink> {
        if level == 0 {
            let index = self.helper.hash_of(id)?;
            self.links.elements.get(index.get())?.as_ref()
        } else {
            self.links.upper.get(&(level, id))
        }
    }

    /// Every registered link: level 0 in dense order, then the rest in
    /// registration order.
    pub fn links(&self) -> impl Iterator<Item = &AlignableLink> + '_ {
        self.links
            .elements
            .iter()
            .flatten()
            .chain(self.links.upper.values())
    }

    /// Stored volume-local delta of the link at `(level, id)`.
    pub fn delta(&self, level: u8, id: CompactId) -> Option<DAffine3> {
        let link = self.link(level, id)?;
        self.placements.delta(link.volume())
    }

    /// Convert `delta` from `frame` into the link's volume frame and
    /// store it, replacing any previous delta.
    ///
    /// The target is looked up with [`link`](Self::link); a `level` that
    /// does not match the intended volume can land on an aliased link.
    ///
    /// Caches are not invalidated; call [`invalidate_all`](Self::invalidate_all)
    /// (or use [`apply_deltas`](Self::apply_deltas)) once the update
    /// cycle is complete.
    pub fn apply_delta(
        &self,
        level: u8,
        id: CompactId,
        delta: DAffine3,
        frame: Frame,
    ) -> Result<(), AlignError> {
        let link = self.link(level, id).ok_or(AlignError::NoLink { level, id })?;
        let recon_to_global = match link.element() {
            Some(index) => {
                let element = self
                    .element(index)
                    .ok_or(AlignError::MissingElement { id })?;
                match self.config.local_frame {
                    LocalFramePolicy::Default => element.default_recon_to_global(),
                    LocalFramePolicy::Aligned => element.recon_to_global(),
                }
            }
            None => link.reference(),
        };
        let local = link.local_delta(delta, frame, recon_to_global);
        self.placements.set_delta(link.volume(), local);
        tracing::trace!(level, id = %id, ?frame, "alignment delta applied");
        Ok(())
    }

    /// Apply a batch of deltas, then invalidate every cache.
    ///
    /// Entries without a link or element are skipped and counted.
    pub fn apply_deltas<I>(&self, batch: I) -> AlignmentSummary
    where
        I: IntoIterator<Item = AlignmentDelta>,
    {
        let mut summary = AlignmentSummary::default();
        for d in batch {
            match self.apply_delta(d.level, d.id, d.delta, d.frame) {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    tracing::debug!(error = %e, "alignment delta skipped");
                    summary.skipped += 1;
                }
            }
        }
        self.invalidate_all();
        tracing::debug!(
            applied = summary.applied,
            skipped = summary.skipped,
            "alignment batch applied"
        );
        summary
    }

    /// Invalidate every element's cached geometry.
    pub fn invalidate_all(&self) {
        for element in self.elements() {
            element.invalidate();
        }
    }

    /// Eagerly recompute every element's cached geometry.
    pub fn update_all(&self) {
        for element in self.elements() {
            element.update();
        }
    }
}
