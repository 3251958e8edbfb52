//! Shared identifiers, positions and configuration for the multiverse engine.

mod config;
mod types;

pub use config::{ConfigError, EngineConfig};
pub use types::{ActorId, BlockPos, DimensionId, Location};

pub use glam::DVec3;
