//! The named phases of a transition.
//!
//! Each phase takes the typed result of the one before it. Phases 1 and 2
//! only read; from phase 3 on the actor is out of every world until phase 6
//! attaches it again.

use std::sync::Arc;

use glam::DVec3;
use multiverse_common::{DimensionId, Location};
use multiverse_kernel::{WorldInstance, WorldLifecycleContext};

use crate::actor::ActorState;
use crate::error::TransitionError;
use crate::host::TransitionHost;
use crate::sync::{SyncSink, SyncUpdate, client_dimension, time_and_weather};

/// Offset from a resolved bed block to the actor's feet.
const BED_OFFSET: DVec3 = DVec3::new(0.5, 0.1, 0.5);

/// Phase 1 result: the world the actor is headed for.
pub struct ValidatedTarget<W> {
    pub dimension: DimensionId,
    pub world: Arc<W>,
    /// The originally requested dimension, when it could not host a respawn.
    pub redirected_from: Option<DimensionId>,
}

/// Phase 2 result: where an actor leaving the terminal dimension comes out.
pub struct TerminalExit<W> {
    pub dimension: DimensionId,
    pub world: Arc<W>,
    pub position: DVec3,
    /// True when the actor's personal respawn location was used.
    pub personal: bool,
}

/// Phase 3 result: what is needed to put the actor back if a later phase fails.
pub struct Detached<W> {
    pub source: DimensionId,
    pub source_world: Option<Arc<W>>,
    /// The actor as it was when it left the source world.
    pub snapshot: ActorState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnSource {
    Bed,
    /// The actor had a bed here but it could not be used.
    InvalidBed,
    GlobalSpawn,
    TerminalExit,
}

/// Phase 4 result: the uncorrected arrival position.
pub struct SpawnResolution<W> {
    pub dimension: DimensionId,
    pub world: Arc<W>,
    pub position: DVec3,
    pub source: SpawnSource,
}

/// Phase 6 result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    pub dimension: DimensionId,
    /// The id advertised to the actor's endpoint.
    pub client_dimension: DimensionId,
    pub position: DVec3,
    pub source: SpawnSource,
}

/// Live world for `dimension`, hotloading it when registered but unloaded.
pub fn resolve_world<W, H>(
    ctx: &mut WorldLifecycleContext<W>,
    host: &mut H,
    dimension: DimensionId,
) -> Result<Arc<W>, TransitionError>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    if let Some(world) = ctx.world(dimension) {
        return Ok(Arc::clone(world));
    }
    tracing::debug!(%dimension, "target not loaded, hotloading");
    Ok(ctx.init_dimension(dimension, host)?)
}

/// Phase 1: resolve the target, redirecting once if it cannot host a respawn.
pub fn validate_target<W, H>(
    ctx: &mut WorldLifecycleContext<W>,
    host: &mut H,
    actor: &ActorState,
    requested: DimensionId,
) -> Result<ValidatedTarget<W>, TransitionError>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    let world = resolve_world(ctx, host, requested)?;
    if host.can_respawn_here(&world) {
        return Ok(ValidatedTarget {
            dimension: requested,
            world,
            redirected_from: None,
        });
    }

    let fallback = host.respawn_dimension(&world, actor);
    tracing::debug!(
        from = %requested,
        to = %fallback,
        "target cannot host a respawn, redirecting"
    );
    let world = resolve_world(ctx, host, fallback)?;
    Ok(ValidatedTarget {
        dimension: fallback,
        world,
        redirected_from: Some(requested),
    })
}

/// Phase 2: the actor's respawn location if it lies in the surface
/// dimension, otherwise the target's global spawn.
pub fn reconcile_terminal_exit<W, H>(
    ctx: &mut WorldLifecycleContext<W>,
    host: &mut H,
    actor: &ActorState,
    target: &ValidatedTarget<W>,
) -> Result<TerminalExit<W>, TransitionError>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    if let Some(Location {
        dimension,
        position,
    }) = actor
        .respawn_point
        .filter(|loc| loc.dimension == DimensionId::SURFACE)
    {
        let world = resolve_world(ctx, host, dimension)?;
        return Ok(TerminalExit {
            dimension,
            world,
            position,
            personal: true,
        });
    }

    let spawn = host.spawn_point(&target.world);
    Ok(TerminalExit {
        dimension: target.dimension,
        world: Arc::clone(&target.world),
        position: spawn.as_dvec3(),
        personal: false,
    })
}

/// Phase 3: take the actor out of its source world.
pub fn detach<W, H>(
    ctx: &WorldLifecycleContext<W>,
    host: &mut H,
    actor: &ActorState,
    source: DimensionId,
) -> Detached<W>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    let source_world = ctx.world(source).cloned();
    match &source_world {
        Some(world) => host.detach(world, actor),
        None => tracing::warn!(
            %source,
            actor = %actor.name,
            "source dimension not loaded, nothing to detach from"
        ),
    }
    Detached {
        source,
        source_world,
        snapshot: actor.clone(),
    }
}

/// Phase 4: pick the arrival position in the target.
///
/// A usable bed wins and is re-recorded; an unusable one is reported to the
/// actor and the global spawn is used instead. Actors not coming back from
/// the terminal dimension are reset.
pub fn resolve_spawn<W, H>(
    host: &H,
    actor: &mut ActorState,
    target: ValidatedTarget<W>,
    exit: Option<TerminalExit<W>>,
    sync: &mut dyn SyncSink,
) -> SpawnResolution<W>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    let returning = exit.is_some();
    let resolution = match exit {
        Some(exit) => SpawnResolution {
            dimension: exit.dimension,
            world: exit.world,
            position: exit.position,
            source: SpawnSource::TerminalExit,
        },
        None => {
            let global = host.spawn_point(&target.world).as_dvec3();
            let (position, source) = match actor.bed_spawn(target.dimension) {
                Some(bed) => match host.resolve_bed_spawn(&target.world, bed.position, bed.forced)
                {
                    Some(resolved) => {
                        actor.set_bed_spawn(target.dimension, bed.position, bed.forced);
                        (resolved.as_dvec3() + BED_OFFSET, SpawnSource::Bed)
                    }
                    None => {
                        tracing::debug!(
                            dimension = %target.dimension,
                            actor = %actor.name,
                            "bed spawn obstructed"
                        );
                        sync.send(actor.id, SyncUpdate::SpawnPointInvalid);
                        (global, SpawnSource::InvalidBed)
                    }
                },
                None => (global, SpawnSource::GlobalSpawn),
            };
            SpawnResolution {
                dimension: target.dimension,
                world: target.world,
                position,
                source,
            }
        }
    };

    actor.dimension = resolution.dimension;
    if !returning {
        actor.reset();
    }
    actor.yaw = 0.0;
    actor.pitch = 0.0;
    resolution
}

/// Phase 5: raise the position one block at a time until it is free.
///
/// Checks at most `max_rise + 1` heights.
pub fn resolve_collision<W, H>(
    host: &mut H,
    actor: &ActorState,
    spawn: &SpawnResolution<W>,
    max_rise: u32,
) -> Result<DVec3, TransitionError>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    host.load_area(&spawn.world, spawn.position);
    let mut position = spawn.position;
    for _ in 0..=max_rise {
        if !host.collides(&spawn.world, actor, position) {
            return Ok(position);
        }
        position.y += 1.0;
    }
    Err(TransitionError::NoFreePosition {
        dimension: spawn.dimension,
        start: spawn.position,
        attempts: max_rise,
    })
}

/// Undo phases 3 to 5 after a later phase failed.
///
/// Everything phase 4 changed, including the reset and a re-recorded bed,
/// is rolled back before the actor rejoins its source world.
pub fn reattach<W, H>(host: &mut H, actor: &mut ActorState, detached: &Detached<W>)
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    actor.clone_from(&detached.snapshot);
    if let Some(world) = &detached.source_world {
        host.attach(world, actor);
    }
}

/// Phase 6: attach to the target and bring the endpoint in sync.
pub fn attach_and_notify<W, H>(
    ctx: &WorldLifecycleContext<W>,
    host: &mut H,
    actor: &mut ActorState,
    spawn: SpawnResolution<W>,
    position: DVec3,
    sync: &mut dyn SyncSink,
) -> Result<Arrival, TransitionError>
where
    W: WorldInstance,
    H: TransitionHost<W>,
{
    let descriptor = ctx.descriptor_for(spawn.dimension)?;
    let advertised = client_dimension(spawn.dimension, &descriptor.kind, actor.capability_aware);
    let provider = descriptor.id;

    actor.position = position;
    host.attach(&spawn.world, actor);

    let conditions = host.world_conditions(&spawn.world);
    if actor.capability_aware {
        sync.send(
            actor.id,
            SyncUpdate::DimensionRegistration {
                dimension: advertised,
                provider,
            },
        );
    }
    sync.send(
        actor.id,
        SyncUpdate::Respawn {
            dimension: advertised,
            difficulty: conditions.difficulty,
            game_mode: actor.game_mode,
            terrain: conditions.terrain.clone(),
        },
    );
    sync.send(
        actor.id,
        SyncUpdate::Difficulty {
            difficulty: conditions.difficulty,
            locked: conditions.difficulty_locked,
        },
    );
    for update in time_and_weather(&conditions) {
        sync.send(actor.id, update);
    }
    sync.send(
        actor.id,
        SyncUpdate::PlayerPosition {
            position,
            yaw: actor.yaw,
            pitch: actor.pitch,
        },
    );
    sync.send(
        actor.id,
        SyncUpdate::SpawnPosition(host.spawn_point(&spawn.world)),
    );
    sync.send(actor.id, SyncUpdate::Experience(actor.experience));

    Ok(Arrival {
        dimension: spawn.dimension,
        client_dimension: advertised,
        position,
        source: spawn.source,
    })
}
