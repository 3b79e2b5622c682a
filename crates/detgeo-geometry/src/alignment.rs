//! Alignable links and alignment deltas.
//!
//! An [`AlignableLink`] binds a `(level, id)` key to one volume of the
//! placement tree and freezes that volume's default absolute transform
//! (the reference) at registration. Every incoming delta is converted
//! into the volume's own frame against that frozen reference and then
//! stored, replacing the previous one.

use detgeo_core::{CompactId, DenseIndex};
use glam::DAffine3;

use crate::element::rigid_inverse;
use crate::placement::VolumeId;

/// Frame in which an incoming delta is expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Frame {
    /// The fixed global frame.
    #[default]
    Global,
    /// The element's reconstruction frame (or the volume's own frame
    /// above level 0).
    Local,
}

/// Registry entry for one alignable volume.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignableLink {
    level: u8,
    id: CompactId,
    volume: VolumeId,
    reference: DAffine3,
    element: Option<DenseIndex>,
}

impl AlignableLink {
    pub(crate) fn new(
        level: u8,
        id: CompactId,
        volume: VolumeId,
        reference: DAffine3,
        element: Option<DenseIndex>,
    ) -> Self {
        Self {
            level,
            id,
            volume,
            reference,
            element,
        }
    }

    /// Alignment level; 0 is the element level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Aligned id.
    pub fn id(&self) -> CompactId {
        self.id
    }

    /// The volume whose delta this link owns.
    pub fn volume(&self) -> VolumeId {
        self.volume
    }

    /// Default absolute transform frozen at registration.
    pub fn reference(&self) -> DAffine3 {
        self.reference
    }

    /// Dense index of the element, for level-0 links.
    pub fn element(&self) -> Option<DenseIndex> {
        self.element
    }

    /// Convert `delta` into the volume-local delta to store.
    ///
    /// Global: `ref⁻¹ · G · ref`. Local: `ref⁻¹ · R · D · R⁻¹ · ref`
    /// with `R = recon_to_global`.
    pub fn local_delta(
        &self,
        delta: DAffine3,
        frame: Frame,
        recon_to_global: DAffine3,
    ) -> DAffine3 {
        let ref_inv = rigid_inverse(&self.reference);
        match frame {
            Frame::Global => ref_inv * delta * self.reference,
            Frame::Local => {
                let recon_inv = rigid_inverse(&recon_to_global);
                ref_inv * recon_to_global * delta * recon_inv * self.reference
            }
        }
    }
}

/// One entry of an alignment update stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignmentDelta {
    /// Alignment level.
    pub level: u8,
    /// Target id at that level.
    pub id: CompactId,
    /// Frame of `delta`.
    pub frame: Frame,
    /// Rigid correction.
    pub delta: DAffine3,
}

impl AlignmentDelta {
    /// A global-frame delta.
    pub fn global(level: u8, id: CompactId, delta: DAffine3) -> Self {
        Self {
            level,
            id,
            frame: Frame::Global,
            delta,
        }
    }

    /// A local-frame delta.
    pub fn local(level: u8, id: CompactId, delta: DAffine3) -> Self {
        Self {
            level,
            id,
            frame: Frame::Local,
            delta,
        }
    }
}

/// Outcome of a batched update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    /// Deltas stored.
    pub applied: usize,
    /// Deltas with no link or no element.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn link(reference: DAffine3) -> AlignableLink {
        AlignableLink::new(1, CompactId(7), VolumeId(0), reference, None)
    }

    #[test]
    fn global_delta_conjugates_by_reference() {
        let reference = DAffine3::from_translation(DVec3::new(0.0, 50.0, 0.0))
            * DAffine3::from_rotation_z(FRAC_PI_2);
        let g = DAffine3::from_translation(DVec3::new(0.0, 1.0, 0.0));
        let l = link(reference).local_delta(g, Frame::Global, reference);
        // Applying L in the volume frame equals applying G globally.
        let lhs = reference * l;
        let rhs = g * reference;
        assert!(lhs.abs_diff_eq(rhs, 1e-12));
        // Global +y is the rotated volume's local +x.
        assert!(l.translation.abs_diff_eq(DVec3::X, 1e-12));
    }

    #[test]
    fn local_delta_in_own_frame_is_unchanged() {
        let reference = DAffine3::from_translation(DVec3::new(3.0, 4.0, 5.0));
        let d = DAffine3::from_rotation_x(0.01);
        let l = link(reference).local_delta(d, Frame::Local, reference);
        assert!(l.abs_diff_eq(d, 1e-12));
    }

    #[test]
    fn local_delta_uses_recon_frame() {
        let reference = DAffine3::from_translation(DVec3::new(10.0, 0.0, 0.0));
        // Recon frame rotated 90° about z relative to the volume.
        let recon = reference * DAffine3::from_rotation_z(FRAC_PI_2);
        let d = DAffine3::from_translation(DVec3::X);
        let l = link(reference).local_delta(d, Frame::Local, recon);
        // Recon +x is volume +y.
        assert!(l.translation.abs_diff_eq(DVec3::Y, 1e-12));
        let moved = reference * l * DAffine3::from_rotation_z(FRAC_PI_2);
        assert!(moved.abs_diff_eq(recon * d, 1e-12));
    }

    // ── Random rigid transforms ─────────────────────────────────

    fn arb_rigid() -> impl Strategy<Value = DAffine3> {
        (
            prop::array::uniform3(-1.0f64..1.0),
            -PI..PI,
            prop::array::uniform3(-2.0f64..2.0),
        )
            .prop_filter("axis needs a direction", |(axis, _, _)| {
                DVec3::from_array(*axis).length() > 1e-3
            })
            .prop_map(|(axis, angle, t)| {
                DAffine3::from_translation(DVec3::from_array(t))
                    * DAffine3::from_axis_angle(DVec3::from_array(axis).normalize(), angle)
            })
    }

    proptest! {
        #[test]
        fn global_conversion_commutes_with_reference(
            reference in arb_rigid(),
            g in arb_rigid(),
        ) {
            let l = link(reference).local_delta(g, Frame::Global, reference);
            prop_assert!((reference * l).abs_diff_eq(g * reference, 1e-9));
        }

        #[test]
        fn local_conversion_acts_in_the_recon_frame(
            reference in arb_rigid(),
            offset in arb_rigid(),
            d in arb_rigid(),
        ) {
            let recon = reference * offset;
            let l = link(reference).local_delta(d, Frame::Local, recon);
            prop_assert!((reference * l * offset).abs_diff_eq(recon * d, 1e-9));
        }

        #[test]
        fn local_delta_equals_its_global_form(
            reference in arb_rigid(),
            d in arb_rigid(),
        ) {
            let link = link(reference);
            let local = link.local_delta(d, Frame::Local, reference);
            let global = reference * d * rigid_inverse(&reference);
            let converted = link.local_delta(global, Frame::Global, reference);
            prop_assert!(local.abs_diff_eq(converted, 1e-9));
        }
    }
}
