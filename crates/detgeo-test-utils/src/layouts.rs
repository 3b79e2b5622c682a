//! Detector layouts matching the fixture dictionaries.

use std::f64::consts::{FRAC_PI_2, PI};

use detgeo_geometry::{
    build_detector, AxisMapping, Design, DetectorLayout, ElementManager, HitAxis, ManagerConfig,
    Shape, SignedAxis, VolumeRecord,
};
use glam::{DAffine3, DVec3};

use crate::{
    barrel_endcap_helper, grid_helper, BARREL_ETA, BARREL_LAYERS, BARREL_PHI, ENDCAP_DISKS,
    ENDCAP_PHI, ENDCAP_RINGS,
};

pub const GRID_PITCH: f64 = 2.0;
pub const BARREL_RADIUS: f64 = 30.0;
pub const BARREL_LAYER_GAP: f64 = 10.0;
pub const BARREL_ETA_PITCH: f64 = 6.0;
pub const ENDCAP_Z: f64 = 100.0;
pub const ENDCAP_DISK_GAP: f64 = 20.0;
pub const ENDCAP_R_MIN: f64 = 40.0;
pub const ENDCAP_RING_WIDTH: f64 = 20.0;

fn at(x: f64, y: f64, z: f64) -> DAffine3 {
    DAffine3::from_translation(DVec3::new(x, y, z))
}

pub fn pixel_design() -> Design {
    Design::new(
        "pixel",
        Shape::Box {
            half_width: 0.5,
            half_length: 1.0,
        },
        0.2,
    )
}

/// Flat grid in the `z = 0` plane. Row `r` sits at `y = r * GRID_PITCH`
/// (alignable level 1), module `m` at `x = m * GRID_PITCH` within it
/// (alignable level 0).
pub fn grid_layout(rows: i32, modules: i32) -> DetectorLayout {
    let mut layout = DetectorLayout::new()
        .design(pixel_design())
        .volume(VolumeRecord::new(&[], DAffine3::IDENTITY));
    for row in 0..rows {
        let y = row as f64 * GRID_PITCH;
        layout = layout.volume(VolumeRecord::new(&[row], at(0.0, y, 0.0)).alignable(1));
        for module in 0..modules {
            layout = layout.volume(
                VolumeRecord::new(&[row, module], at(module as f64 * GRID_PITCH, 0.0, 0.0))
                    .alignable(0)
                    .sensitive("pixel"),
            );
        }
    }
    layout
}

pub fn grid_manager(rows: i32, modules: i32, config: ManagerConfig) -> ElementManager {
    build_detector(grid_helper(rows, modules), &grid_layout(rows, modules), config).unwrap()
}

/// Barrel module: phi tangential, eta along the stave, normal radial.
/// The stave frame has local `x` radial, so the hit frame is permuted.
pub fn barrel_design() -> Design {
    Design::new(
        "barrel",
        Shape::Box {
            half_width: 1.0,
            half_length: 3.0,
        },
        0.3,
    )
    .with_axes(AxisMapping {
        phi: SignedAxis::plus(HitAxis::Y),
        eta: SignedAxis::plus(HitAxis::Z),
        depth: SignedAxis::plus(HitAxis::X),
    })
}

/// Endcap wedge for `ring`: an annulus sector around the beam axis with
/// eta radial.
pub fn wedge_design(ring: i32) -> Design {
    let r_min = ENDCAP_R_MIN + ring as f64 * ENDCAP_RING_WIDTH;
    Design::new(
        format!("wedge{ring}"),
        Shape::Annulus {
            r_min,
            r_max: r_min + ENDCAP_RING_WIDTH,
            half_phi: PI / ENDCAP_PHI as f64,
        },
        0.3,
    )
    .with_axes(AxisMapping {
        phi: SignedAxis::minus(HitAxis::Y),
        eta: SignedAxis::plus(HitAxis::X),
        depth: SignedAxis::plus(HitAxis::Z),
    })
}

/// Azimuth of the center of phi module `k` out of `n`.
pub fn phi_center(k: i32, n: i32) -> f64 {
    2.0 * PI * (k as f64 + 0.5) / n as f64
}

/// Layout for [`barrel_endcap_helper`](crate::barrel_endcap_helper).
///
/// Alignable levels: 2 for layers and disks, 1 for staves and endcap
/// sectors, 0 for modules.
pub fn barrel_endcap_layout() -> DetectorLayout {
    let mut layout = DetectorLayout::new().design(barrel_design());
    for ring in 0..ENDCAP_RINGS {
        layout = layout.design(wedge_design(ring));
    }

    layout = layout.volume(VolumeRecord::new(&[0], DAffine3::IDENTITY));
    for layer in 0..BARREL_LAYERS {
        let radius = BARREL_RADIUS + layer as f64 * BARREL_LAYER_GAP;
        layout = layout.volume(VolumeRecord::new(&[0, layer], DAffine3::IDENTITY).alignable(2));
        for phi in 0..BARREL_PHI {
            let stave = DAffine3::from_rotation_z(phi_center(phi, BARREL_PHI))
                * at(radius, 0.0, 0.0);
            layout = layout.volume(VolumeRecord::new(&[0, layer, phi], stave).alignable(1));
            for eta in BARREL_ETA {
                let z = eta as f64 * BARREL_ETA_PITCH;
                layout = layout.volume(
                    VolumeRecord::new(&[0, layer, phi, eta], at(0.0, 0.0, z))
                        .alignable(0)
                        .sensitive("barrel"),
                );
            }
        }
    }

    for side in [-2i32, 2] {
        let sign = f64::from(side.signum());
        layout = layout.volume(VolumeRecord::new(&[side], at(0.0, 0.0, sign * ENDCAP_Z)));
        for disk in 0..ENDCAP_DISKS {
            let z = sign * disk as f64 * ENDCAP_DISK_GAP;
            layout = layout.volume(VolumeRecord::new(&[side, disk], at(0.0, 0.0, z)).alignable(2));
            for phi in 0..ENDCAP_PHI {
                // Sector frame: local +x points at the sector's center azimuth.
                let sector = DAffine3::from_rotation_z(phi_center(phi, ENDCAP_PHI));
                layout =
                    layout.volume(VolumeRecord::new(&[side, disk, phi], sector).alignable(1));
                for ring in 0..ENDCAP_RINGS {
                    layout = layout.volume(
                        VolumeRecord::new(&[side, disk, phi, ring], DAffine3::IDENTITY)
                            .alignable(0)
                            .sensitive(format!("wedge{ring}")),
                    );
                }
            }
        }
    }
    layout
}

pub fn barrel_endcap_manager(config: ManagerConfig) -> ElementManager {
    build_detector(barrel_endcap_helper(), &barrel_endcap_layout(), config).unwrap()
}

/// A rotation small enough to keep the fixtures' geometry recognisable.
pub fn small_rotation() -> DAffine3 {
    let axis = DVec3::new(1.0, 2.0, 3.0).normalize();
    DAffine3::from_axis_angle(axis, 1e-3) * at(0.01, -0.02, 0.03)
}

/// Quarter turn about `z`.
pub fn quarter_turn() -> DAffine3 {
    DAffine3::from_rotation_z(FRAC_PI_2)
}
