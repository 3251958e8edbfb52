use std::sync::Arc;

use multiverse_common::{DimensionId, Location};
use multiverse_kernel::{LifecycleError, WorldInstance, WorldLifecycleContext};

use crate::actor::ActorState;
use crate::coordinator::TransitionCoordinator;
use crate::error::TransitionError;
use crate::host::{Audience, EventSink, JoinMessage, PlayerJoinEvent, TransitionHost};
use crate::sync::{SyncSink, SyncUpdate, client_dimension, time_and_weather};

/// What a completed join settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub location: Location,
    pub client_dimension: DimensionId,
    pub message: JoinMessage,
    pub audience: Audience,
    /// True when the saved dimension was not loaded and the actor was moved to the surface.
    pub relocated: bool,
}

/// Connection details of a joining actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinRequest<'a> {
    /// Name stored in the host's profile cache, if the actor was seen before.
    pub cached_name: Option<&'a str>,
    pub remote_address: Option<&'a str>,
}

impl TransitionCoordinator {
    /// Bring a newly connected actor into the world.
    pub fn join<W, H>(
        &self,
        ctx: &WorldLifecycleContext<W>,
        host: &mut H,
        actor: &mut ActorState,
        request: JoinRequest<'_>,
        sync: &mut dyn SyncSink,
        events: &mut dyn EventSink,
    ) -> Result<JoinOutcome, TransitionError>
    where
        W: WorldInstance,
        H: TransitionHost<W>,
    {
        let span = tracing::info_span!("join", actor = %actor.name, dimension = %actor.dimension);
        let _enter = span.enter();

        let relocated = ctx.world(actor.dimension).is_none();
        if relocated {
            let surface = surface_world(ctx, actor.dimension)?;
            tracing::info!(
                saved = %actor.dimension,
                "saved dimension not loaded, joining at surface spawn"
            );
            actor.dimension = DimensionId::SURFACE;
            actor.position = host.randomized_spawn_point(&surface).as_dvec3();
        }

        let message = join_message(actor, request.cached_name);
        let mut event = PlayerJoinEvent {
            actor: actor.id,
            location: actor.location(),
            message,
            audience: Audience::default(),
        };
        events.post_join(&mut event);
        if ctx.world(event.location.dimension).is_some() {
            actor.dimension = event.location.dimension;
            actor.position = event.location.position;
        } else {
            tracing::warn!(
                dimension = %event.location.dimension,
                "join location rewritten to an unloaded dimension, ignoring"
            );
        }

        tracing::info!(
            actor = %actor.name,
            remote = request.remote_address.unwrap_or("local"),
            position = %actor.position,
            "actor logged in"
        );

        let world = match ctx.world(actor.dimension) {
            Some(world) => Arc::clone(world),
            None => surface_world(ctx, actor.dimension)?,
        };
        let descriptor = ctx.descriptor_for(actor.dimension)?;
        let advertised =
            client_dimension(actor.dimension, &descriptor.kind, actor.capability_aware);
        let conditions = host.world_conditions(&world);

        if actor.capability_aware {
            sync.send(
                actor.id,
                SyncUpdate::DimensionRegistration {
                    dimension: advertised,
                    provider: descriptor.id,
                },
            );
        }
        sync.send(
            actor.id,
            SyncUpdate::JoinGame {
                dimension: advertised,
                game_mode: actor.game_mode,
                hardcore: conditions.hardcore,
                difficulty: conditions.difficulty,
                max_players: self.max_players,
                terrain: conditions.terrain.clone(),
            },
        );
        sync.send(actor.id, SyncUpdate::Brand(self.server_brand.clone()));
        sync.send(
            actor.id,
            SyncUpdate::Difficulty {
                difficulty: conditions.difficulty,
                locked: conditions.difficulty_locked,
            },
        );
        sync.send(actor.id, SyncUpdate::SpawnPosition(host.spawn_point(&world)));
        sync.send(actor.id, SyncUpdate::Abilities(actor.abilities));
        sync.send(actor.id, SyncUpdate::HeldItem(actor.selected_slot));

        events.broadcast(&event.audience, &event.message);

        host.attach(&world, actor);
        sync.send(
            actor.id,
            SyncUpdate::PlayerPosition {
                position: actor.position,
                yaw: actor.yaw,
                pitch: actor.pitch,
            },
        );
        for update in time_and_weather(&conditions) {
            sync.send(actor.id, update);
        }

        Ok(JoinOutcome {
            location: actor.location(),
            client_dimension: advertised,
            message: event.message,
            audience: event.audience,
            relocated,
        })
    }
}

fn surface_world<W: WorldInstance>(
    ctx: &WorldLifecycleContext<W>,
    requested: DimensionId,
) -> Result<Arc<W>, TransitionError> {
    match ctx.world(DimensionId::SURFACE) {
        Some(world) => Ok(Arc::clone(world)),
        None => {
            tracing::error!(%requested, "cannot join: surface is not loaded");
            Err(LifecycleError::SurfaceNotLoaded(requested).into())
        }
    }
}

/// `Renamed` when the cached profile name differs ignoring case.
fn join_message(actor: &ActorState, cached_name: Option<&str>) -> JoinMessage {
    match cached_name {
        Some(previous) if !actor.name.eq_ignore_ascii_case(previous) => JoinMessage::Renamed {
            name: actor.name.clone(),
            previous: previous.to_string(),
        },
        _ => JoinMessage::Joined {
            name: actor.name.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiverse_common::DVec3;

    #[test]
    fn same_name_any_case_is_plain_join() {
        let actor = ActorState::new("Steve", DimensionId::SURFACE, DVec3::ZERO);
        assert_eq!(
            join_message(&actor, Some("steve")),
            JoinMessage::Joined {
                name: "Steve".into()
            }
        );
        assert_eq!(
            join_message(&actor, None),
            JoinMessage::Joined {
                name: "Steve".into()
            }
        );
    }

    #[test]
    fn different_cached_name_is_rename() {
        let actor = ActorState::new("Steve", DimensionId::SURFACE, DVec3::ZERO);
        assert_eq!(
            join_message(&actor, Some("Notch")),
            JoinMessage::Renamed {
                name: "Steve".into(),
                previous: "Notch".into()
            }
        );
    }
}
