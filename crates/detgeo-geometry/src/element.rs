//! One addressable sensitive element and its cached derived geometry.

use std::f64::consts::PI;
use std::sync::Arc;

use detgeo_core::{CompactId, DenseIndex, Direction};
use glam::{DAffine3, DMat3, DVec3};

use crate::cache::Cache;
use crate::design::Design;
use crate::error::BuildError;
use crate::placement::{PlacementTree, VolumeId};

/// Global cylindrical extent of an element, from its corner samples.
///
/// `phi_min`/`phi_max` are measured around the azimuth of the corner
/// centroid, so an element straddling `±π` yields a contiguous interval
/// that may extend past `π`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    /// Smallest transverse radius.
    pub r_min: f64,
    /// Largest transverse radius.
    pub r_max: f64,
    /// Smallest global z.
    pub z_min: f64,
    /// Largest global z.
    pub z_max: f64,
    /// Smallest azimuth.
    pub phi_min: f64,
    /// Largest azimuth.
    pub phi_max: f64,
}

impl Extent {
    fn from_points(points: &[DVec3]) -> Self {
        let centroid = points.iter().copied().sum::<DVec3>() / points.len().max(1) as f64;
        let phi_ref = centroid.y.atan2(centroid.x);
        let mut e = Self {
            r_min: f64::INFINITY,
            r_max: f64::NEG_INFINITY,
            z_min: f64::INFINITY,
            z_max: f64::NEG_INFINITY,
            phi_min: f64::INFINITY,
            phi_max: f64::NEG_INFINITY,
        };
        for p in points {
            let r = p.truncate().length();
            let phi = phi_ref + wrap_angle(p.y.atan2(p.x) - phi_ref);
            e.r_min = e.r_min.min(r);
            e.r_max = e.r_max.max(r);
            e.z_min = e.z_min.min(p.z);
            e.z_max = e.z_max.max(p.z);
            e.phi_min = e.phi_min.min(phi);
            e.phi_max = e.phi_max.max(phi);
        }
        e
    }
}

/// Map an angle into `(-π, π]`.
fn wrap_angle(a: f64) -> f64 {
    let wrapped = (a + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Inverse of a rigid transform via the transpose of its linear part.
/// Always finite, including for singular inputs.
pub(crate) fn rigid_inverse(t: &DAffine3) -> DAffine3 {
    let m = t.matrix3.transpose();
    DAffine3::from_mat3_translation(m, -(m * t.translation))
}

/// Every derived quantity of an element, computed together and
/// published as a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryBundle {
    /// Hit frame to global.
    pub hit_to_global: DAffine3,
    /// Reconstruction frame to global.
    pub recon_to_global: DAffine3,
    /// Global to reconstruction frame.
    pub global_to_recon: DAffine3,
    /// Origin of the reconstruction frame in global coordinates.
    pub center: DVec3,
    /// Unit phi axis in global coordinates.
    pub phi_axis: DVec3,
    /// Unit eta axis in global coordinates.
    pub eta_axis: DVec3,
    /// Unit normal (depth axis) in global coordinates.
    pub normal: DVec3,
    /// Cylindrical extent.
    pub extent: Extent,
}

impl GeometryBundle {
    /// Derive the bundle from a hit-to-global transform and a design.
    pub fn compute(hit_to_global: DAffine3, design: &Design) -> Self {
        let recon_to_hit = design.recon_to_hit();
        let recon_to_global = hit_to_global * DAffine3::from_mat3(recon_to_hit);
        let global_to_recon = rigid_inverse(&recon_to_global);
        let center = recon_to_global.translation;
        let corners: Vec<DVec3> = design
            .corners()
            .into_iter()
            .map(|c| recon_to_global.transform_point3(c))
            .collect();
        Self {
            hit_to_global,
            recon_to_global,
            global_to_recon,
            center,
            phi_axis: recon_to_global.matrix3.x_axis.normalize_or_zero(),
            eta_axis: recon_to_global.matrix3.y_axis.normalize_or_zero(),
            normal: recon_to_global.matrix3.z_axis.normalize_or_zero(),
            extent: Extent::from_points(&corners),
        }
    }
}

/// One addressable element: identity, neighbour links and lazily
/// cached geometry.
///
/// The element's hit frame sits at a fixed offset inside a placement
/// volume. The default hit-to-global transform is captured at
/// construction; the aligned one follows the placement tree's deltas
/// and is folded into the cached [`GeometryBundle`] on the next read
/// after [`invalidate`](SpatialElement::invalidate).
#[derive(Debug)]
pub struct SpatialElement {
    id: CompactId,
    index: DenseIndex,
    design: Arc<Design>,
    placements: Arc<PlacementTree>,
    volume: VolumeId,
    hit_offset: DAffine3,
    default_hit_to_global: DAffine3,
    neighbours: [Option<DenseIndex>; 4],
    cache: Cache<GeometryBundle>,
}

// Compile-time assertion: SpatialElement must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SpatialElement>();
};

impl SpatialElement {
    /// Create an element whose hit frame is `hit_offset` inside `volume`.
    ///
    /// Fails if `volume` is not part of `placements`.
    pub fn new(
        id: CompactId,
        index: DenseIndex,
        design: Arc<Design>,
        placements: Arc<PlacementTree>,
        volume: VolumeId,
        hit_offset: DAffine3,
    ) -> Result<Self, BuildError> {
        let base = placements
            .default_absolute(volume)
            .ok_or(BuildError::UnknownVolume { volume: volume.0 })?;
        Ok(Self {
            id,
            index,
            design,
            placements,
            volume,
            hit_offset,
            default_hit_to_global: base * hit_offset,
            neighbours: [None; 4],
            cache: Cache::new(),
        })
    }

    /// Compact id.
    pub fn id(&self) -> CompactId {
        self.id
    }

    /// Dense index.
    pub fn index(&self) -> DenseIndex {
        self.index
    }

    /// Shared design.
    pub fn design(&self) -> &Arc<Design> {
        &self.design
    }

    /// Placement volume.
    pub fn volume(&self) -> VolumeId {
        self.volume
    }

    pub(crate) fn placements(&self) -> &Arc<PlacementTree> {
        &self.placements
    }

    /// Neighbour index in `dir`.
    pub fn neighbour(&self, dir: Direction) -> Option<DenseIndex> {
        self.neighbours[dir.slot()]
    }

    pub(crate) fn set_neighbour(&mut self, dir: Direction, target: Option<DenseIndex>) {
        self.neighbours[dir.slot()] = target;
    }

    /// Previous neighbour along eta.
    pub fn prev_eta(&self) -> Option<DenseIndex> {
        self.neighbour(Direction::PrevEta)
    }

    /// Next neighbour along eta.
    pub fn next_eta(&self) -> Option<DenseIndex> {
        self.neighbour(Direction::NextEta)
    }

    /// Previous neighbour along phi.
    pub fn prev_phi(&self) -> Option<DenseIndex> {
        self.neighbour(Direction::PrevPhi)
    }

    /// Next neighbour along phi.
    pub fn next_phi(&self) -> Option<DenseIndex> {
        self.neighbour(Direction::NextPhi)
    }

    fn aligned_hit_to_global(&self) -> DAffine3 {
        self.placements
            .absolute(self.volume)
            .map(|abs| abs * self.hit_offset)
            .unwrap_or(self.default_hit_to_global)
    }

    /// The cached geometry, recomputed first if invalid.
    pub fn bundle(&self) -> Arc<GeometryBundle> {
        self.cache
            .get_or_compute(|| GeometryBundle::compute(self.aligned_hit_to_global(), &self.design))
    }

    /// Whether the cached geometry is currently valid.
    pub fn is_cached(&self) -> bool {
        self.cache.is_valid()
    }

    /// Drop the cached geometry; the next read recomputes.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Recompute and republish the cached geometry now.
    pub fn update(&self) -> Arc<GeometryBundle> {
        self.cache
            .refresh(|| GeometryBundle::compute(self.aligned_hit_to_global(), &self.design))
    }

    /// Center in global coordinates.
    pub fn center(&self) -> DVec3 {
        self.bundle().center
    }

    /// Unit eta axis in global coordinates.
    pub fn eta_axis(&self) -> DVec3 {
        self.bundle().eta_axis
    }

    /// Unit phi axis in global coordinates.
    pub fn phi_axis(&self) -> DVec3 {
        self.bundle().phi_axis
    }

    /// Unit normal in global coordinates.
    pub fn normal(&self) -> DVec3 {
        self.bundle().normal
    }

    /// Cylindrical extent.
    pub fn extent(&self) -> Extent {
        self.bundle().extent
    }

    /// Aligned hit-to-global transform.
    pub fn hit_to_global(&self) -> DAffine3 {
        self.bundle().hit_to_global
    }

    /// Aligned reconstruction-to-global transform.
    pub fn recon_to_global(&self) -> DAffine3 {
        self.bundle().recon_to_global
    }

    /// Aligned global-to-reconstruction transform.
    pub fn global_to_recon(&self) -> DAffine3 {
        self.bundle().global_to_recon
    }

    /// A reconstruction-frame point in global coordinates.
    pub fn local_to_global(&self, p: DVec3) -> DVec3 {
        self.bundle().recon_to_global.transform_point3(p)
    }

    /// A global point in the reconstruction frame.
    pub fn global_to_local(&self, p: DVec3) -> DVec3 {
        self.bundle().global_to_recon.transform_point3(p)
    }

    /// Hit-to-global transform captured at construction, ignoring deltas.
    pub fn default_hit_to_global(&self) -> DAffine3 {
        self.default_hit_to_global
    }

    /// Reconstruction-to-global transform ignoring deltas.
    pub fn default_recon_to_global(&self) -> DAffine3 {
        self.default_hit_to_global * DAffine3::from_mat3(self.design.recon_to_hit())
    }

    /// Linear part of the reconstruction-to-hit mapping.
    pub fn recon_to_hit(&self) -> DMat3 {
        self.design.recon_to_hit()
    }
}
