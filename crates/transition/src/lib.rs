//! Moving actors between dimensions, and bringing new actors in.
//!
//! A transition runs six phases in order: target validation, terminal-return
//! reconciliation, detachment, spawn resolution, collision resolution, then
//! attachment and notification.
//!
//! # Invariants
//! - An actor is attached to at most one world at a time.
//! - Once detached, an actor is always attached again: to the target on
//!   success, to its source world on failure.
//! - Sync updates reach the endpoint in a fixed order per flow.

pub mod actor;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod join;
pub mod phases;
pub mod request;
pub mod sync;

pub use actor::{Abilities, ActorState, BedSpawn, Experience, GameMode};
pub use coordinator::TransitionCoordinator;
pub use error::TransitionError;
pub use host::{Audience, EventSink, JoinMessage, PlayerJoinEvent, TransitionHost};
pub use join::{JoinOutcome, JoinRequest};
pub use phases::{Arrival, SpawnSource};
pub use request::TransitionRequest;
pub use sync::{
    BorderState, Difficulty, SyncSink, SyncUpdate, WorldConditions, client_dimension,
    time_and_weather,
};
