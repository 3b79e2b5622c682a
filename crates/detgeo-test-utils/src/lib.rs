//! Test fixtures for detgeo development.
//!
//! Provides reusable dictionaries, identifier helpers and detector
//! layouts:
//!
//! - [`grid_helper`]: flat `row x module x cell` grid hashed at `module`.
//! - [`barrel_endcap_helper`]: context-dependent barrel/endcap schema
//!   with a gapped eta range and wrapping phi.
//! - [`layouts`]: matching [`DetectorLayout`](detgeo_geometry::DetectorLayout)s.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod layouts;

use std::sync::Arc;

use detgeo_ident::{
    DictionarySchema, FieldDef, FieldRange, IdentifierConfig, IdentifierHelper, RangeDictionary,
};

/// Barrel eta modules; there is no module at eta 0.
pub const BARREL_ETA: [i32; 4] = [-2, -1, 1, 2];
pub const BARREL_LAYERS: i32 = 3;
pub const BARREL_PHI: i32 = 8;
pub const ENDCAP_DISKS: i32 = 2;
pub const ENDCAP_PHI: i32 = 4;
pub const ENDCAP_RINGS: i32 = 2;

/// `rows x modules x 1 cell`, no wrapping.
pub fn grid_schema(rows: i32, modules: i32) -> DictionarySchema {
    DictionarySchema::new()
        .field(FieldDef::new("row"))
        .field(FieldDef::new("module"))
        .field(FieldDef::new("cell"))
        .region(vec![
            FieldRange::bounded(0, rows - 1),
            FieldRange::bounded(0, modules - 1),
            FieldRange::single(0),
        ])
}

pub fn grid_dictionary(rows: i32, modules: i32) -> Arc<RangeDictionary> {
    Arc::new(RangeDictionary::from_schema(grid_schema(rows, modules)).unwrap())
}

/// Hashed at `module`; rows step eta, modules step phi.
pub fn grid_helper(rows: i32, modules: i32) -> Arc<IdentifierHelper> {
    Arc::new(
        IdentifierHelper::new(
            grid_dictionary(rows, modules),
            IdentifierConfig::new("module").eta("row").phi("module"),
        )
        .unwrap(),
    )
}

/// Fields `side / layer / phi_module / eta_module`.
///
/// Barrel (`side = 0`): [`BARREL_LAYERS`] layers, [`BARREL_PHI`] phi
/// modules, eta modules [`BARREL_ETA`]. Endcaps (`side = ±2`):
/// [`ENDCAP_DISKS`] disks, [`ENDCAP_PHI`] phi modules and
/// [`ENDCAP_RINGS`] rings numbered from 0. Phi wraps.
pub fn barrel_endcap_schema() -> DictionarySchema {
    DictionarySchema::new()
        .field(FieldDef::new("side"))
        .field(FieldDef::new("layer"))
        .field(FieldDef::new("phi_module").wrapping())
        .field(FieldDef::new("eta_module"))
        .region(vec![
            FieldRange::single(0),
            FieldRange::bounded(0, BARREL_LAYERS - 1),
            FieldRange::bounded(0, BARREL_PHI - 1),
            FieldRange::values_of(BARREL_ETA),
        ])
        .region(vec![
            FieldRange::values_of([-2, 2]),
            FieldRange::bounded(0, ENDCAP_DISKS - 1),
            FieldRange::bounded(0, ENDCAP_PHI - 1),
            FieldRange::bounded(0, ENDCAP_RINGS - 1),
        ])
}

pub fn barrel_endcap_dictionary() -> Arc<RangeDictionary> {
    Arc::new(RangeDictionary::from_schema(barrel_endcap_schema()).unwrap())
}

/// Hashed at `eta_module`.
pub fn barrel_endcap_helper() -> Arc<IdentifierHelper> {
    Arc::new(
        IdentifierHelper::new(
            barrel_endcap_dictionary(),
            IdentifierConfig::new("eta_module")
                .eta("eta_module")
                .phi("phi_module"),
        )
        .unwrap(),
    )
}

/// Number of modules in [`barrel_endcap_schema`].
pub fn barrel_endcap_count() -> usize {
    let barrel = BARREL_LAYERS * BARREL_PHI * BARREL_ETA.len() as i32;
    let endcaps = 2 * ENDCAP_DISKS * ENDCAP_PHI * ENDCAP_RINGS;
    (barrel + endcaps) as usize
}
