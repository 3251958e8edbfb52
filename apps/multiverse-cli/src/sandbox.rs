//! In-process host used by the CLI: flat worlds, no geometry below y=64.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use multiverse_common::{ActorId, BlockPos, DVec3, DimensionId};
use multiverse_kernel::{
    DimensionCatalog, DimensionDescriptor, LifecycleError, WorldFactory, WorldInstance,
};
use multiverse_transition::{
    ActorState, Audience, EventSink, JoinMessage, PlayerJoinEvent, SyncSink, SyncUpdate,
    TransitionHost, WorldConditions,
};

const GROUND: f64 = 64.0;

#[derive(Debug)]
pub struct SandboxWorld {
    name: String,
    dimension: DimensionId,
    save_dir: Option<PathBuf>,
}

impl SandboxWorld {
    pub fn surface(save_dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            name: "overworld".into(),
            dimension: DimensionId::SURFACE,
            save_dir: Some(save_dir.to_path_buf()),
        })
    }
}

impl WorldInstance for SandboxWorld {
    fn world_name(&self) -> &str {
        &self.name
    }

    fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }
}

/// Logs every dimension type the kernel announces.
pub struct LoggingCatalog;

impl DimensionCatalog for LoggingCatalog {
    fn register_dimension_type(&mut self, descriptor: &DimensionDescriptor) {
        tracing::debug!(
            provider = descriptor.id,
            name = %descriptor.name,
            keep_loaded = descriptor.keep_loaded,
            "dimension type announced"
        );
    }
}

#[derive(Debug, Default)]
pub struct SandboxHost {
    attached: Vec<(DimensionId, ActorId)>,
}

impl SandboxHost {
    pub fn attached(&self) -> &[(DimensionId, ActorId)] {
        &self.attached
    }
}

impl WorldFactory<SandboxWorld> for SandboxHost {
    fn create_world(
        &mut self,
        dimension: DimensionId,
        descriptor: &DimensionDescriptor,
        surface: &Arc<SandboxWorld>,
    ) -> Result<Arc<SandboxWorld>, LifecycleError> {
        Ok(Arc::new(SandboxWorld {
            name: descriptor.name.clone(),
            dimension,
            save_dir: surface
                .save_dir
                .as_ref()
                .map(|dir| dir.join(format!("DIM{dimension}"))),
        }))
    }

    fn world_loaded(&mut self, dimension: DimensionId, world: &Arc<SandboxWorld>) {
        println!("  loaded dimension {dimension} as {:?}", world.world_name());
    }
}

impl TransitionHost<SandboxWorld> for SandboxHost {
    fn can_respawn_here(&self, world: &SandboxWorld) -> bool {
        world.dimension != DimensionId::END
    }

    fn respawn_dimension(&self, _world: &SandboxWorld, _actor: &ActorState) -> DimensionId {
        DimensionId::SURFACE
    }

    fn spawn_point(&self, _world: &SandboxWorld) -> BlockPos {
        BlockPos::new(0, GROUND as i32, 0)
    }

    fn randomized_spawn_point(&self, world: &SandboxWorld) -> BlockPos {
        self.spawn_point(world)
    }

    fn resolve_bed_spawn(
        &self,
        _world: &SandboxWorld,
        bed: BlockPos,
        _forced: bool,
    ) -> Option<BlockPos> {
        Some(bed)
    }

    fn collides(&self, _world: &SandboxWorld, _actor: &ActorState, position: DVec3) -> bool {
        position.y < GROUND
    }

    fn load_area(&mut self, _world: &SandboxWorld, _position: DVec3) {}

    fn world_conditions(&self, _world: &SandboxWorld) -> WorldConditions {
        WorldConditions::default()
    }

    fn detach(&mut self, world: &SandboxWorld, actor: &ActorState) {
        self.attached
            .retain(|(dim, id)| !(*dim == world.dimension && *id == actor.id));
    }

    fn attach(&mut self, world: &SandboxWorld, actor: &ActorState) {
        self.attached.push((world.dimension, actor.id));
    }
}

/// Prints sync updates and broadcasts as they are sent.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    pub sent: usize,
}

impl SyncSink for ConsoleSink {
    fn send(&mut self, _actor: ActorId, update: SyncUpdate) {
        self.sent += 1;
        println!("    -> {}", update.kind());
    }
}

impl EventSink for ConsoleSink {
    fn post_join(&mut self, _event: &mut PlayerJoinEvent) {}

    fn broadcast(&mut self, audience: &Audience, message: &JoinMessage) {
        println!("  [{audience:?}] {message}");
    }
}
