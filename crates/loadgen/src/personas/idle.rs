//! Idle persona: a browser tab left open, polling every few seconds.

use super::{acquire_identity, settle, ActorRng, Persona, PersonaError, PersonaKind};
use crate::context::WorkloadContext;
use crate::weighted::WeightedTable;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helpdesk_types::Identity;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdleAction {
    /// Conversation, message and expert-queue updates in one sweep.
    Poll,
}

impl IdleAction {
    pub const WEIGHTS: [(IdleAction, u32); 1] = [(IdleAction::Poll, 1)];
}

pub struct IdlePersona {
    identity: Arc<Identity>,
    actions: WeightedTable<IdleAction>,
    last_check: Option<DateTime<Utc>>,
}

impl IdlePersona {
    pub fn new(identity: Arc<Identity>) -> Result<Self, PersonaError> {
        Ok(Self {
            identity,
            actions: WeightedTable::new(IdleAction::WEIGHTS.to_vec())?,
            last_check: None,
        })
    }

    /// Acquire an identity and build the persona.
    pub async fn start(ctx: &WorkloadContext, rng: &mut ActorRng) -> Result<Self, PersonaError> {
        Self::new(acquire_identity(ctx, rng).await?)
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    async fn poll(&mut self, ctx: &WorkloadContext) {
        let kind = self.kind();
        let since = self.last_check;
        settle(
            kind,
            "conversation_updates",
            ctx.api.conversation_updates(&self.identity, since).await,
        );
        settle(
            kind,
            "message_updates",
            ctx.api.message_updates(&self.identity, since).await,
        );
        settle(
            kind,
            "expert_queue_updates",
            ctx.api.expert_queue_updates(&self.identity, since).await,
        );
        self.last_check = Some(Utc::now());
    }
}

#[async_trait]
impl Persona for IdlePersona {
    type Action = IdleAction;

    fn kind(&self) -> PersonaKind {
        PersonaKind::Idle
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn actions(&self) -> &WeightedTable<IdleAction> {
        &self.actions
    }

    async fn perform(&mut self, action: IdleAction, ctx: &WorkloadContext, _rng: &mut ActorRng) {
        match action {
            IdleAction::Poll => self.poll(ctx).await,
        }
    }
}
