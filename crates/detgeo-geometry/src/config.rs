//! Element manager configuration.

/// Which reconstruction-to-global transform converts a local-frame
/// delta into the stored child-local delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocalFramePolicy {
    /// The default (un-aligned) transform frozen at construction.
    #[default]
    Default,
    /// The element's current aligned transform.
    Aligned,
}

/// Configuration for an [`ElementManager`](crate::ElementManager).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Local-frame delta conversion policy. Default: `Default`.
    pub local_frame: LocalFramePolicy,
}

impl ManagerConfig {
    /// Config with the given local-frame policy.
    pub fn new(local_frame: LocalFramePolicy) -> Self {
        Self { local_frame }
    }
}
