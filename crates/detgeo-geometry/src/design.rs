//! Shared element designs: shape, thickness and axis conventions.
//!
//! A [`Design`] is immutable and shared by every element of the same
//! type. Its shape is declared in the element's reconstruction frame:
//! `x` runs along phi, `y` along eta, `z` along depth (the normal). The
//! [`AxisMapping`] relates that frame to the hit frame in which the
//! placement transform is expressed.

use std::f64::consts::PI;

use glam::{DMat3, DVec3};

/// One axis of the hit frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitAxis {
    /// Hit-frame x.
    X,
    /// Hit-frame y.
    Y,
    /// Hit-frame z.
    Z,
}

impl HitAxis {
    fn unit(self) -> DVec3 {
        match self {
            Self::X => DVec3::X,
            Self::Y => DVec3::Y,
            Self::Z => DVec3::Z,
        }
    }
}

/// A hit-frame axis with a sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignedAxis {
    /// The hit-frame axis.
    pub axis: HitAxis,
    /// Whether the reconstruction axis points along `-axis`.
    pub negative: bool,
}

impl SignedAxis {
    /// `+axis`.
    pub const fn plus(axis: HitAxis) -> Self {
        Self {
            axis,
            negative: false,
        }
    }

    /// `-axis`.
    pub const fn minus(axis: HitAxis) -> Self {
        Self {
            axis,
            negative: true,
        }
    }

    /// The signed unit vector in the hit frame.
    pub fn vector(self) -> DVec3 {
        if self.negative {
            -self.axis.unit()
        } else {
            self.axis.unit()
        }
    }
}

/// Which signed hit-frame axis carries each reconstruction axis.
///
/// A mapping that reuses a hit axis is degenerate: the resulting
/// transforms are singular but finite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AxisMapping {
    /// Hit axis carrying the reconstruction phi axis (`x`).
    pub phi: SignedAxis,
    /// Hit axis carrying the reconstruction eta axis (`y`).
    pub eta: SignedAxis,
    /// Hit axis carrying the reconstruction depth axis (`z`).
    pub depth: SignedAxis,
}

impl AxisMapping {
    /// Hit frame and reconstruction frame coincide.
    pub const IDENTITY: Self = Self {
        phi: SignedAxis::plus(HitAxis::X),
        eta: SignedAxis::plus(HitAxis::Y),
        depth: SignedAxis::plus(HitAxis::Z),
    };

    /// Linear map from reconstruction coordinates to hit coordinates.
    pub fn recon_to_hit(&self) -> DMat3 {
        DMat3::from_cols(self.phi.vector(), self.eta.vector(), self.depth.vector())
    }

    /// Whether the three axes are distinct.
    pub fn is_proper(&self) -> bool {
        self.phi.axis != self.eta.axis
            && self.eta.axis != self.depth.axis
            && self.phi.axis != self.depth.axis
    }
}

impl Default for AxisMapping {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Outline of an element in its reconstruction frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Rectangle centred on the origin.
    Box {
        /// Half extent along phi.
        half_width: f64,
        /// Half extent along eta.
        half_length: f64,
    },
    /// Trapezoid centred on the origin, narrow at `-eta`.
    Trapezoid {
        /// Half width at `-half_length`.
        min_half_width: f64,
        /// Half width at `+half_length`.
        max_half_width: f64,
        /// Half extent along eta.
        half_length: f64,
    },
    /// Annulus sector around the frame origin, symmetric about `+eta`.
    Annulus {
        /// Inner radius.
        r_min: f64,
        /// Outer radius.
        r_max: f64,
        /// Half opening angle in radians.
        half_phi: f64,
    },
    /// Any other solid, approximated by its bounding box.
    Other {
        /// Half extents along phi, eta and depth.
        half_extents: DVec3,
    },
}

impl Shape {
    /// Sample points of the outline in the `z = 0` plane, plus any
    /// depth the shape declares itself.
    fn outline(&self) -> Vec<DVec3> {
        match *self {
            Self::Box {
                half_width,
                half_length,
            } => vec![
                DVec3::new(-half_width, -half_length, 0.0),
                DVec3::new(half_width, -half_length, 0.0),
                DVec3::new(half_width, half_length, 0.0),
                DVec3::new(-half_width, half_length, 0.0),
            ],
            Self::Trapezoid {
                min_half_width,
                max_half_width,
                half_length,
            } => vec![
                DVec3::new(-min_half_width, -half_length, 0.0),
                DVec3::new(min_half_width, -half_length, 0.0),
                DVec3::new(max_half_width, half_length, 0.0),
                DVec3::new(-max_half_width, half_length, 0.0),
            ],
            Self::Annulus {
                r_min,
                r_max,
                half_phi,
            } => {
                let half_phi = half_phi.clamp(0.0, PI);
                let steps = ANNULUS_STEPS;
                let mut points = Vec::with_capacity(2 * (steps + 1));
                for r in [r_min, r_max] {
                    for i in 0..=steps {
                        let phi = -half_phi + 2.0 * half_phi * i as f64 / steps as f64;
                        points.push(DVec3::new(r * phi.sin(), r * phi.cos(), 0.0));
                    }
                }
                points
            }
            Self::Other { half_extents: h } => {
                let mut points = Vec::with_capacity(8);
                for sz in [-1.0, 1.0] {
                    for sy in [-1.0, 1.0] {
                        for sx in [-1.0, 1.0] {
                            points.push(DVec3::new(sx * h.x, sy * h.y, sz * h.z));
                        }
                    }
                }
                points
            }
        }
    }
}

/// Arc samples per annulus edge.
const ANNULUS_STEPS: usize = 8;

/// Shape, thickness and axis convention shared by a family of elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Design {
    /// Name used by layouts to refer to this design.
    pub name: String,
    /// Outline in the reconstruction frame.
    pub shape: Shape,
    /// Extent along depth.
    pub thickness: f64,
    /// Hit-frame ↔ reconstruction-frame axis mapping.
    pub axes: AxisMapping,
}

impl Design {
    /// A design with the identity axis mapping.
    pub fn new(name: impl Into<String>, shape: Shape, thickness: f64) -> Self {
        Self {
            name: name.into(),
            shape,
            thickness,
            axes: AxisMapping::IDENTITY,
        }
    }

    /// Replace the axis mapping.
    pub fn with_axes(mut self, axes: AxisMapping) -> Self {
        self.axes = axes;
        self
    }

    /// Linear map from reconstruction to hit coordinates.
    pub fn recon_to_hit(&self) -> DMat3 {
        self.axes.recon_to_hit()
    }

    /// Corner samples of the solid in the reconstruction frame.
    ///
    /// Planar shapes are extruded by `±thickness / 2` along depth.
    /// Non-finite or negative dimensions are passed through; the
    /// resulting extents are degenerate but well defined.
    pub fn corners(&self) -> Vec<DVec3> {
        let outline = self.shape.outline();
        if let Shape::Other { .. } = self.shape {
            return outline;
        }
        let half = 0.5 * self.thickness;
        outline
            .iter()
            .flat_map(|p| [*p - DVec3::Z * half, *p + DVec3::Z * half])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mapping_is_identity_matrix() {
        assert_eq!(AxisMapping::IDENTITY.recon_to_hit(), DMat3::IDENTITY);
        assert!(AxisMapping::IDENTITY.is_proper());
    }

    #[test]
    fn signed_mapping_permutes_axes() {
        // Hit frame: x = depth, y = phi, z = eta.
        let axes = AxisMapping {
            phi: SignedAxis::plus(HitAxis::Y),
            eta: SignedAxis::minus(HitAxis::Z),
            depth: SignedAxis::plus(HitAxis::X),
        };
        let m = axes.recon_to_hit();
        assert_eq!(m * DVec3::X, DVec3::Y);
        assert_eq!(m * DVec3::Y, -DVec3::Z);
        assert_eq!(m * DVec3::Z, DVec3::X);
        assert!((m.determinant().abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_mapping_is_flagged_not_rejected() {
        let axes = AxisMapping {
            phi: SignedAxis::plus(HitAxis::X),
            eta: SignedAxis::plus(HitAxis::X),
            depth: SignedAxis::plus(HitAxis::Z),
        };
        assert!(!axes.is_proper());
        assert_eq!(axes.recon_to_hit().determinant(), 0.0);
    }

    #[test]
    fn box_corners_are_extruded() {
        let d = Design::new(
            "pixel",
            Shape::Box {
                half_width: 1.0,
                half_length: 2.0,
            },
            0.4,
        );
        let corners = d.corners();
        assert_eq!(corners.len(), 8);
        let max = corners.iter().fold(DVec3::splat(f64::MIN), |a, b| a.max(*b));
        assert_eq!(max, DVec3::new(1.0, 2.0, 0.2));
    }

    #[test]
    fn annulus_samples_span_radii_and_angle() {
        let d = Design::new(
            "wedge",
            Shape::Annulus {
                r_min: 10.0,
                r_max: 20.0,
                half_phi: 0.1,
            },
            0.0,
        );
        let corners = d.corners();
        let radii: Vec<f64> = corners.iter().map(|p| p.truncate().length()).collect();
        let r_min = radii.iter().cloned().fold(f64::INFINITY, f64::min);
        let r_max = radii.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!((r_min - 10.0).abs() < 1e-9);
        assert!((r_max - 20.0).abs() < 1e-9);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        assert!((max_x - 20.0 * 0.1f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn other_shape_uses_its_own_depth() {
        let d = Design::new(
            "blob",
            Shape::Other {
                half_extents: DVec3::new(1.0, 1.0, 3.0),
            },
            100.0,
        );
        let max_z = d.corners().iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(max_z, 3.0);
    }
}
