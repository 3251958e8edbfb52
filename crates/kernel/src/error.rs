use multiverse_common::DimensionId;

/// Errors from dimension registration, lookup and hotloading.
///
/// Registration errors mean the host registered things in the wrong order or
/// twice during startup; they are not recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("provider type {0} is already registered")]
    DuplicateProvider(i32),
    #[error("provider type {id} derives name {name:?}, which is already taken")]
    DuplicateTypeName { id: i32, name: String },
    #[error("failed to register dimension {0}: one is already registered")]
    DuplicateDimension(DimensionId),
    #[error("dimension {dimension}: provider type {provider} does not exist")]
    UnknownProviderKind { dimension: DimensionId, provider: i32 },
    #[error("dimension {0} does not exist")]
    UnknownDimension(DimensionId),
    #[error("dimension id {0} is already marked in use")]
    AlreadyRegistered(DimensionId),
    #[error("cannot hotload dimension {0}: surface dimension is not loaded")]
    SurfaceNotLoaded(DimensionId),
    #[error("host failed to create world for dimension {dimension}: {reason}")]
    WorldCreation {
        dimension: DimensionId,
        reason: String,
    },
}
