//! Host-side rules and sinks a transition consults.

use std::fmt;

use multiverse_common::{ActorId, BlockPos, DVec3, DimensionId, Location};
use multiverse_kernel::{WorldFactory, WorldInstance};

use crate::actor::ActorState;
use crate::sync::WorldConditions;

/// Simulation rules and actor tracking owned by the host.
///
/// Extends [`WorldFactory`] so unloaded targets can be hotloaded mid-transition.
pub trait TransitionHost<W: WorldInstance>: WorldFactory<W> {
    /// Whether actors may respawn in this world.
    fn can_respawn_here(&self, world: &W) -> bool;

    /// Where to send an actor instead when `world` cannot host a respawn.
    fn respawn_dimension(&self, world: &W, actor: &ActorState) -> DimensionId;

    /// Global spawn coordinate of the world.
    fn spawn_point(&self, world: &W) -> BlockPos;

    /// Spawn coordinate with the world's fuzz applied, used for first joins.
    fn randomized_spawn_point(&self, world: &W) -> BlockPos;

    /// Nearest usable position next to a bed, or `None` if it is obstructed.
    fn resolve_bed_spawn(&self, world: &W, bed: BlockPos, forced: bool) -> Option<BlockPos>;

    /// Whether the actor's bounding box at `position` intersects geometry.
    fn collides(&self, world: &W, actor: &ActorState, position: DVec3) -> bool;

    /// Make sure the area around `position` is loaded before collision checks.
    fn load_area(&mut self, world: &W, position: DVec3);

    fn world_conditions(&self, world: &W) -> WorldConditions;

    /// Remove the actor from the world's trackers and the connected list.
    fn detach(&mut self, world: &W, actor: &ActorState);

    /// Register the actor with the world's trackers and the connected list.
    fn attach(&mut self, world: &W, actor: &ActorState);
}

/// Announcement broadcast when an actor joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinMessage {
    Joined { name: String },
    /// The actor's cached profile name differs from the current one.
    Renamed { name: String, previous: String },
    Custom(String),
}

impl fmt::Display for JoinMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joined { name } => write!(f, "{name} joined the game"),
            Self::Renamed { name, previous } => {
                write!(f, "{name} (formerly known as {previous}) joined the game")
            }
            Self::Custom(text) => f.write_str(text),
        }
    }
}

/// Who receives a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Audience {
    #[default]
    Everyone,
    Dimension(DimensionId),
    Actors(Vec<ActorId>),
    Nobody,
}

/// Posted before a joining actor is announced. Listeners may rewrite any field.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerJoinEvent {
    pub actor: ActorId,
    pub location: Location,
    pub message: JoinMessage,
    pub audience: Audience,
}

/// The host's event bus and chat delivery.
pub trait EventSink {
    fn post_join(&mut self, event: &mut PlayerJoinEvent);

    fn broadcast(&mut self, audience: &Audience, message: &JoinMessage);
}
