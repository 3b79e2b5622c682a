//! Per-field edge behaviour for neighbour derivation.

use serde::{Deserialize, Serialize};

/// How a hierarchy field behaves at the edge of its legal range when
/// neighbours are derived.
///
/// `Absorb` means the first legal value has no previous neighbour and the
/// last has no next one. `Wrap` closes the range into a ring, which is the
/// natural choice for azimuthal (phi) fields.
///
/// # Examples
///
/// ```
/// use detgeo_core::EdgeBehavior;
///
/// assert_eq!(EdgeBehavior::default(), EdgeBehavior::Absorb);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeBehavior {
    /// Out-of-range neighbour is omitted (fewer neighbours at edges).
    #[default]
    Absorb,
    /// Out-of-range neighbour wraps to the opposite end of the range.
    Wrap,
}
