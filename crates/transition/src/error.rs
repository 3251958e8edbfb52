use multiverse_common::{DVec3, DimensionId};
use multiverse_kernel::LifecycleError;

/// Errors that abort a transition or join.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("no collision-free position in dimension {dimension} within {attempts} steps above {start}")]
    NoFreePosition {
        dimension: DimensionId,
        start: DVec3,
        attempts: u32,
    },
}
