//! Identifier helper configuration.

/// Whether [`compose`](crate::IdentifierHelper::compose) validates field
/// values against the dictionary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangeCheck {
    /// Reject illegal values with a `RangeError`.
    #[default]
    Checked,
    /// Pack illegal values anyway; the resulting id is out of range.
    Unchecked,
}

/// Configuration for [`IdentifierHelper`](crate::IdentifierHelper).
///
/// Field names are resolved against the dictionary at initialization;
/// unknown names fail with `SchemaError::UnknownField`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierConfig {
    /// Field whose level defines the dense index (e.g. `"module"`).
    pub hash_level: String,
    /// Field stepped by the eta neighbour directions. `None` disables
    /// eta neighbours.
    pub eta_field: Option<String>,
    /// Field stepped by the phi neighbour directions. `None` disables
    /// phi neighbours.
    pub phi_field: Option<String>,
    /// Range-check policy for composed ids. Default: `Checked`.
    pub range_check: RangeCheck,
}

impl IdentifierConfig {
    /// Config hashing at `hash_level`, with no neighbour fields and
    /// checked composition.
    pub fn new(hash_level: impl Into<String>) -> Self {
        Self {
            hash_level: hash_level.into(),
            eta_field: None,
            phi_field: None,
            range_check: RangeCheck::Checked,
        }
    }

    /// Set the eta neighbour field.
    pub fn eta(mut self, field: impl Into<String>) -> Self {
        self.eta_field = Some(field.into());
        self
    }

    /// Set the phi neighbour field.
    pub fn phi(mut self, field: impl Into<String>) -> Self {
        self.phi_field = Some(field.into());
        self
    }

    /// Set the range-check policy.
    pub fn range_check(mut self, check: RangeCheck) -> Self {
        self.range_check = check;
        self
    }
}
