use alloc::string::String;

use thiserror::Error;

/// Errors reported by the windowing engine.
///
/// Geometry and registry errors abort the current watch cycle. The caller may retry by
/// replacing the collection again.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RecycleError {
    /// The first materialized node reported a height that cannot drive the window math
    /// (zero, negative, or not finite).
    #[error("invalid item geometry: measured height {measured}")]
    InvalidGeometry { measured: f32 },

    /// A window operation tried to reach an index outside `[0, len - 1]`.
    ///
    /// Signed so that stepping above the first item reports `-1`.
    #[error("index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A registry lookup found a record whose visual was invalidated by the host.
    #[error("registry entry for index {index} refers to an invalidated visual")]
    StaleRegistryEntry { index: usize },

    /// A host collaborator failed while the watch cycle was being built.
    #[error("host failed while materializing index {index}: {source}")]
    Host {
        index: usize,
        #[source]
        source: HostError,
    },

    /// A window-dependent operation ran before any collection was installed.
    #[error("no collection is being watched")]
    NotInitialized,
}

/// Failures surfaced by the host rendering layer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host layer is busy")]
    Busy,

    #[error("visual handle is no longer valid")]
    InvalidHandle,

    #[error("{0}")]
    Other(String),
}

impl HostError {
    /// Whether retrying on a later scroll sample may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy)
    }
}
