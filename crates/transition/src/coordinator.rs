use multiverse_common::EngineConfig;
use multiverse_kernel::{WorldInstance, WorldLifecycleContext};

use crate::actor::ActorState;
use crate::error::TransitionError;
use crate::host::TransitionHost;
use crate::phases::{self, Arrival};
use crate::request::TransitionRequest;
use crate::sync::SyncSink;

/// Runs transitions and joins against a lifecycle context.
#[derive(Debug, Clone)]
pub struct TransitionCoordinator {
    pub(crate) max_collision_rise: u32,
    pub(crate) server_brand: String,
    pub(crate) max_players: u32,
}

impl TransitionCoordinator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_collision_rise: config.max_collision_rise,
            server_brand: config.server_brand.clone(),
            max_players: config.max_players,
        }
    }

    /// Move `actor` as described by `request`.
    ///
    /// Failures before detachment leave the actor untouched. A failure after
    /// it puts the actor back into its source world at its old position
    /// before the error is returned.
    pub fn transition<W, H>(
        &self,
        ctx: &mut WorldLifecycleContext<W>,
        host: &mut H,
        actor: &mut ActorState,
        request: &TransitionRequest,
        sync: &mut dyn SyncSink,
    ) -> Result<Arrival, TransitionError>
    where
        W: WorldInstance,
        H: TransitionHost<W>,
    {
        let span = tracing::info_span!(
            "transition",
            actor = %actor.name,
            from = %request.source,
            to = %request.target,
            terminal = request.return_from_terminal,
        );
        let _enter = span.enter();

        let target = phases::validate_target(ctx, host, actor, request.target)?;
        let exit = if request.return_from_terminal {
            Some(phases::reconcile_terminal_exit(ctx, host, actor, &target)?)
        } else {
            None
        };

        let detached = phases::detach(ctx, host, actor, request.source);
        let spawn = phases::resolve_spawn(host, actor, target, exit, sync);
        let result = phases::resolve_collision(host, actor, &spawn, self.max_collision_rise)
            .and_then(|position| {
                phases::attach_and_notify(ctx, host, actor, spawn, position, sync)
            });

        match result {
            Ok(arrival) => {
                tracing::info!(
                    dimension = %arrival.dimension,
                    client_dimension = %arrival.client_dimension,
                    source = ?arrival.source,
                    "transition complete"
                );
                Ok(arrival)
            }
            Err(e) => {
                tracing::warn!(error = %e, "transition failed, returning actor to source");
                phases::reattach(host, actor, &detached);
                Err(e)
            }
        }
    }
}
