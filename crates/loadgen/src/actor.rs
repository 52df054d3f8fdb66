//! The per-actor loop.
//!
//! An actor starts its persona (acquiring an identity), then repeats:
//! sample an action, perform it, sleep a randomized interval. Cancellation
//! is observed between actions and during the sleep; a request already in
//! flight always runs to completion.

use crate::config::WaitRange;
use crate::context::WorkloadContext;
use crate::personas::{
    ActivePersona, ActorRng, ExpertPersona, IdlePersona, Persona, PersonaError, PersonaKind,
};
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What an actor did before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSummary {
    pub kind: PersonaKind,
    pub username: String,
    pub actions_performed: u64,
}

/// Spawn one actor of the given persona on the current runtime.
pub fn spawn_actor(
    kind: PersonaKind,
    ctx: WorkloadContext,
    cancel: CancellationToken,
) -> JoinHandle<Result<ActorSummary, PersonaError>> {
    tokio::spawn(async move {
        let mut rng = ActorRng::from_entropy();
        run_actor(kind, &ctx, &cancel, &mut rng).await
    })
}

/// Start a persona of `kind` and drive it until `cancel` fires.
///
/// Fails only if the persona cannot obtain an identity; that failure is
/// confined to this actor.
pub async fn run_actor(
    kind: PersonaKind,
    ctx: &WorkloadContext,
    cancel: &CancellationToken,
    rng: &mut ActorRng,
) -> Result<ActorSummary, PersonaError> {
    let wait = ctx.config.persona(kind).wait;
    let started = match kind {
        PersonaKind::Idle => match IdlePersona::start(ctx, rng).await {
            Ok(persona) => Ok(drive(persona, ctx, wait, cancel, rng).await),
            Err(e) => Err(e),
        },
        PersonaKind::Active => match ActivePersona::start(ctx, rng).await {
            Ok(persona) => Ok(drive(persona, ctx, wait, cancel, rng).await),
            Err(e) => Err(e),
        },
        PersonaKind::Expert => match ExpertPersona::start(ctx, rng).await {
            Ok(persona) => Ok(drive(persona, ctx, wait, cancel, rng).await),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = &started {
        warn!(persona = %kind, error = %e, "Actor failed to start");
    }
    started
}

/// Run `persona`'s action loop until cancelled.
pub async fn drive<P: Persona>(
    mut persona: P,
    ctx: &WorkloadContext,
    wait: WaitRange,
    cancel: &CancellationToken,
    rng: &mut ActorRng,
) -> ActorSummary {
    let kind = persona.kind();
    let username = persona.identity().username.clone();
    info!(persona = %kind, %username, "Actor started");

    let mut actions_performed = 0u64;
    while !cancel.is_cancelled() {
        let action = persona.actions().sample(rng);
        debug!(persona = %kind, ?action, "Performing action");
        persona.perform(action, ctx, rng).await;
        actions_performed += 1;

        let pause = wait.sample(rng);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    info!(persona = %kind, %username, actions_performed, "Actor stopped");
    ActorSummary {
        kind,
        username,
        actions_performed,
    }
}
