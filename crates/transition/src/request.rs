use multiverse_common::{ActorId, DimensionId};

use crate::actor::ActorState;

/// One attempt to move an actor. Consumed by a single transition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub actor: ActorId,
    pub source: DimensionId,
    pub target: DimensionId,
    /// The actor is leaving the terminal (end-like) dimension after finishing it.
    pub return_from_terminal: bool,
}

impl TransitionRequest {
    /// Request to move `actor` from where it currently is to `target`.
    pub fn new(actor: &ActorState, target: DimensionId) -> Self {
        Self {
            actor: actor.id,
            source: actor.dimension,
            target,
            return_from_terminal: false,
        }
    }

    pub fn returning_from_terminal(mut self) -> Self {
        self.return_from_terminal = true;
        self
    }
}
