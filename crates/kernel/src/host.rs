//! Seams to the embedding host.

use multiverse_common::DimensionId;
use std::path::Path;
use std::sync::Arc;

use crate::error::LifecycleError;
use crate::registry::DimensionDescriptor;

/// A live world instance owned by the host simulation.
///
/// Instances are shared as `Arc<W>`; the leak tracker keeps `Weak` references
/// that may be upgraded while other threads drop the last strong handle.
pub trait WorldInstance: Send + Sync + 'static {
    /// Human-readable name used in logs and leak reports.
    fn world_name(&self) -> &str;

    /// Directory the world saves into, if it has one.
    fn save_dir(&self) -> Option<&Path> {
        None
    }
}

/// The host's catalog of dimension types.
pub trait DimensionCatalog {
    /// Called once for every provider type registered.
    fn register_dimension_type(&mut self, descriptor: &DimensionDescriptor);
}

/// Catalog that ignores announcements.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCatalog;

impl DimensionCatalog for NullCatalog {
    fn register_dimension_type(&mut self, _descriptor: &DimensionDescriptor) {}
}

/// Instantiates worlds for hotloaded dimensions.
pub trait WorldFactory<W: WorldInstance> {
    /// Create a world for `dimension`, sharing save data with `surface`.
    fn create_world(
        &mut self,
        dimension: DimensionId,
        descriptor: &DimensionDescriptor,
        surface: &Arc<W>,
    ) -> Result<Arc<W>, LifecycleError>;

    /// World-loaded announcement, sent once the world is live.
    fn world_loaded(&mut self, _dimension: DimensionId, _world: &Arc<W>) {}
}
