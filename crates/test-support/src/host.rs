use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use multiverse_common::{ActorId, BlockPos, DVec3, DimensionId};
use multiverse_kernel::{DimensionDescriptor, LifecycleError, WorldFactory};
use multiverse_transition::{ActorState, TransitionHost, WorldConditions};

use crate::world::FakeWorld;

/// A host-side effect recorded by [`FakeHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Created(DimensionId),
    Loaded(DimensionId),
    LoadArea(DimensionId, DVec3),
    Detached(DimensionId, ActorId),
    Attached(DimensionId, ActorId),
}

/// Configurable host rules keyed by dimension, recording every effect.
#[derive(Debug)]
pub struct FakeHost {
    pub calls: Vec<HostCall>,
    /// Global spawn per dimension; unlisted dimensions spawn at `(0, 64, 0)`.
    pub spawn_points: BTreeMap<DimensionId, BlockPos>,
    pub randomized_spawn: BlockPos,
    /// Dimensions that cannot host a respawn, and where to send actors instead.
    pub respawn_redirects: BTreeMap<DimensionId, DimensionId>,
    /// Dimensions where every bed is obstructed.
    pub obstructed_beds: BTreeSet<DimensionId>,
    /// Positions below this height collide.
    pub solid_below: BTreeMap<DimensionId, f64>,
    pub conditions: BTreeMap<DimensionId, WorldConditions>,
    /// Dimensions whose world creation fails.
    pub failing_creates: BTreeSet<DimensionId>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            spawn_points: BTreeMap::new(),
            randomized_spawn: BlockPos::new(3, 65, -2),
            respawn_redirects: BTreeMap::new(),
            obstructed_beds: BTreeSet::new(),
            solid_below: BTreeMap::new(),
            conditions: BTreeMap::new(),
            failing_creates: BTreeSet::new(),
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached_to(&self, actor: ActorId) -> Vec<DimensionId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Attached(dim, id) if *id == actor => Some(*dim),
                _ => None,
            })
            .collect()
    }

    pub fn detached_from(&self, actor: ActorId) -> Vec<DimensionId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Detached(dim, id) if *id == actor => Some(*dim),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> Vec<DimensionId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Created(dim) => Some(*dim),
                _ => None,
            })
            .collect()
    }
}

impl WorldFactory<FakeWorld> for FakeHost {
    fn create_world(
        &mut self,
        dimension: DimensionId,
        descriptor: &DimensionDescriptor,
        surface: &Arc<FakeWorld>,
    ) -> Result<Arc<FakeWorld>, LifecycleError> {
        if self.failing_creates.contains(&dimension) {
            return Err(LifecycleError::WorldCreation {
                dimension,
                reason: "creation disabled in fake host".into(),
            });
        }
        self.calls.push(HostCall::Created(dimension));
        let mut world = FakeWorld::new(descriptor.name.clone(), dimension);
        world.save_dir = surface
            .save_dir
            .as_ref()
            .map(|dir| dir.join(format!("DIM{dimension}")));
        Ok(world.shared())
    }

    fn world_loaded(&mut self, dimension: DimensionId, _world: &Arc<FakeWorld>) {
        self.calls.push(HostCall::Loaded(dimension));
    }
}

impl TransitionHost<FakeWorld> for FakeHost {
    fn can_respawn_here(&self, world: &FakeWorld) -> bool {
        !self.respawn_redirects.contains_key(&world.dimension)
    }

    fn respawn_dimension(&self, world: &FakeWorld, _actor: &ActorState) -> DimensionId {
        self.respawn_redirects
            .get(&world.dimension)
            .copied()
            .unwrap_or(DimensionId::SURFACE)
    }

    fn spawn_point(&self, world: &FakeWorld) -> BlockPos {
        self.spawn_points
            .get(&world.dimension)
            .copied()
            .unwrap_or(BlockPos::new(0, 64, 0))
    }

    fn randomized_spawn_point(&self, _world: &FakeWorld) -> BlockPos {
        self.randomized_spawn
    }

    fn resolve_bed_spawn(
        &self,
        world: &FakeWorld,
        bed: BlockPos,
        _forced: bool,
    ) -> Option<BlockPos> {
        if self.obstructed_beds.contains(&world.dimension) {
            None
        } else {
            Some(bed)
        }
    }

    fn collides(&self, world: &FakeWorld, _actor: &ActorState, position: DVec3) -> bool {
        self.solid_below
            .get(&world.dimension)
            .is_some_and(|floor| position.y < *floor)
    }

    fn load_area(&mut self, world: &FakeWorld, position: DVec3) {
        self.calls.push(HostCall::LoadArea(world.dimension, position));
    }

    fn world_conditions(&self, world: &FakeWorld) -> WorldConditions {
        self.conditions
            .get(&world.dimension)
            .cloned()
            .unwrap_or_default()
    }

    fn detach(&mut self, world: &FakeWorld, actor: &ActorState) {
        self.calls.push(HostCall::Detached(world.dimension, actor.id));
    }

    fn attach(&mut self, world: &FakeWorld, actor: &ActorState) {
        self.calls.push(HostCall::Attached(world.dimension, actor.id));
    }
}
