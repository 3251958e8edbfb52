use std::path::{Path, PathBuf};
use std::sync::Arc;

use multiverse_common::{DimensionId, EngineConfig};
use multiverse_kernel::{NullCatalog, WorldInstance, WorldLifecycleContext};

/// A world that knows its dimension and, optionally, a save directory.
#[derive(Debug)]
pub struct FakeWorld {
    pub name: String,
    pub dimension: DimensionId,
    pub save_dir: Option<PathBuf>,
}

impl FakeWorld {
    pub fn new(name: impl Into<String>, dimension: DimensionId) -> Self {
        Self {
            name: name.into(),
            dimension,
            save_dir: None,
        }
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl WorldInstance for FakeWorld {
    fn world_name(&self) -> &str {
        &self.name
    }

    fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }
}

/// Default context with the surface world already live.
pub fn surface_context() -> WorldLifecycleContext<FakeWorld> {
    let mut ctx = WorldLifecycleContext::new(EngineConfig::default(), Box::new(NullCatalog));
    ctx.set_world(
        DimensionId::SURFACE,
        Some(FakeWorld::new("overworld", DimensionId::SURFACE).shared()),
    );
    ctx
}
