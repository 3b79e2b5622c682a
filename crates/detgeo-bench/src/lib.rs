//! Benchmark profiles for detgeo.
//!
//! - [`reference_helper`]: 10 layers x 48 phi x 24 eta barrel (11,520 modules)
//! - [`stress_helper`]: 40 layers x 96 phi x 50 eta barrel (192,000 modules)
//! - [`barrel_manager`]: a linked manager over either profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::f64::consts::PI;
use std::sync::Arc;

use detgeo_core::CompactId;
use detgeo_geometry::{
    build_detector, AxisMapping, Design, DetectorLayout, ElementManager, HitAxis, ManagerConfig,
    Shape, SignedAxis, VolumeRecord,
};
use detgeo_ident::{
    DictionarySchema, FieldDef, FieldRange, IdentifierConfig, IdentifierHelper, RangeDictionary,
};
use glam::{DAffine3, DVec3};

/// Barrel dimensions: layers, phi modules per layer, eta modules per stave.
#[derive(Clone, Copy, Debug)]
pub struct BarrelProfile {
    /// Number of layers.
    pub layers: i32,
    /// Phi modules per layer; phi wraps.
    pub phi: i32,
    /// Eta modules per stave.
    pub eta: i32,
}

/// 11,520 modules.
pub const REFERENCE: BarrelProfile = BarrelProfile {
    layers: 10,
    phi: 48,
    eta: 24,
};

/// 192,000 modules.
pub const STRESS: BarrelProfile = BarrelProfile {
    layers: 40,
    phi: 96,
    eta: 50,
};

/// `layer / phi_module / eta_module`, hashed at `eta_module`.
pub fn barrel_helper(p: BarrelProfile) -> Arc<IdentifierHelper> {
    let schema = DictionarySchema::new()
        .field(FieldDef::new("layer"))
        .field(FieldDef::new("phi_module").wrapping())
        .field(FieldDef::new("eta_module"))
        .region(vec![
            FieldRange::bounded(0, p.layers - 1),
            FieldRange::bounded(0, p.phi - 1),
            FieldRange::bounded(0, p.eta - 1),
        ]);
    let dict = RangeDictionary::from_schema(schema).unwrap();
    let config = IdentifierConfig::new("eta_module")
        .eta("eta_module")
        .phi("phi_module");
    Arc::new(IdentifierHelper::new(Arc::new(dict), config).unwrap())
}

/// Helper for [`REFERENCE`].
pub fn reference_helper() -> Arc<IdentifierHelper> {
    barrel_helper(REFERENCE)
}

/// Helper for [`STRESS`].
pub fn stress_helper() -> Arc<IdentifierHelper> {
    barrel_helper(STRESS)
}

/// Staves at radius `30 + 5 * layer`, modules every 4 units along z.
pub fn barrel_layout(p: BarrelProfile) -> DetectorLayout {
    let module = Design::new(
        "module",
        Shape::Box {
            half_width: 1.0,
            half_length: 2.0,
        },
        0.3,
    )
    .with_axes(AxisMapping {
        phi: SignedAxis::plus(HitAxis::Y),
        eta: SignedAxis::plus(HitAxis::Z),
        depth: SignedAxis::plus(HitAxis::X),
    });
    let mut layout = DetectorLayout::new().design(module);
    for layer in 0..p.layers {
        let radius = 30.0 + 5.0 * layer as f64;
        layout = layout.volume(VolumeRecord::new(&[layer], DAffine3::IDENTITY).alignable(2));
        for phi in 0..p.phi {
            let angle = 2.0 * PI * (phi as f64 + 0.5) / p.phi as f64;
            let stave = DAffine3::from_rotation_z(angle)
                * DAffine3::from_translation(DVec3::new(radius, 0.0, 0.0));
            layout = layout.volume(VolumeRecord::new(&[layer, phi], stave).alignable(1));
            for eta in 0..p.eta {
                let z = 4.0 * (eta as f64 - 0.5 * (p.eta - 1) as f64);
                let place = DAffine3::from_translation(DVec3::new(0.0, 0.0, z));
                layout = layout.volume(
                    VolumeRecord::new(&[layer, phi, eta], place)
                        .alignable(0)
                        .sensitive("module"),
                );
            }
        }
    }
    layout
}

/// A linked manager for profile `p`.
pub fn barrel_manager(p: BarrelProfile) -> ElementManager {
    build_detector(barrel_helper(p), &barrel_layout(p), ManagerConfig::default()).unwrap()
}

/// Every `step`-th id at the hash level, as lookup keys.
pub fn sample_ids(helper: &IdentifierHelper, step: usize) -> Vec<CompactId> {
    helper.ids().iter().step_by(step.max(1)).copied().collect()
}
