//! Expert persona: claims waiting conversations from the queue and answers.

use super::{acquire_identity, settle, ActorRng, Persona, PersonaError, PersonaKind};
use crate::context::WorkloadContext;
use crate::weighted::WeightedTable;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helpdesk_types::{ConversationId, Identity};
use rand::seq::SliceRandom;
use std::sync::Arc;

const REPLIES: [&str; 4] = [
    "Let me help you with that.",
    "Here is the solution...",
    "Try this approach...",
    "Have you considered...",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpertAction {
    Claim,
    Respond,
    ViewClaimed,
    Unclaim,
    PollQueue,
    ViewProfile,
    ViewHistory,
}

impl ExpertAction {
    pub const WEIGHTS: [(ExpertAction, u32); 7] = [
        (ExpertAction::Claim, 5),
        (ExpertAction::Respond, 4),
        (ExpertAction::ViewClaimed, 5),
        (ExpertAction::Unclaim, 2),
        (ExpertAction::PollQueue, 2),
        (ExpertAction::ViewProfile, 1),
        (ExpertAction::ViewHistory, 1),
    ];
}

pub struct ExpertPersona {
    identity: Arc<Identity>,
    actions: WeightedTable<ExpertAction>,
    /// Conversations this expert currently holds.
    claimed: Vec<ConversationId>,
    last_check: Option<DateTime<Utc>>,
}

impl ExpertPersona {
    pub fn new(identity: Arc<Identity>) -> Result<Self, PersonaError> {
        Ok(Self {
            identity,
            actions: WeightedTable::new(ExpertAction::WEIGHTS.to_vec())?,
            claimed: Vec::new(),
            last_check: None,
        })
    }

    /// Acquire an identity and build the persona.
    pub async fn start(ctx: &WorkloadContext, rng: &mut ActorRng) -> Result<Self, PersonaError> {
        Self::new(acquire_identity(ctx, rng).await?)
    }

    pub fn claimed(&self) -> &[ConversationId] {
        &self.claimed
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    /// Claim the oldest waiting conversation, if any.
    async fn claim(&mut self, ctx: &WorkloadContext) {
        let Some(queue) = settle(
            self.kind(),
            "expert_queue",
            ctx.api.expert_queue(&self.identity).await,
        ) else {
            return;
        };
        let Some(first) = queue.waiting_conversations.into_iter().next() else {
            return;
        };

        let claimed = settle(
            self.kind(),
            "claim",
            ctx.api.claim(&self.identity, &first.id).await,
        );
        if claimed.is_some() && !self.claimed.contains(&first.id) {
            self.claimed.push(first.id);
        }
    }

    async fn respond(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let Some(conversation) = self.claimed.choose(rng).cloned() else {
            return;
        };
        let reply = REPLIES.choose(rng).copied().unwrap_or(REPLIES[0]);
        let content = format!("Expert response: {} [{}]", reply, Utc::now().to_rfc3339());
        settle(
            self.kind(),
            "send_message",
            ctx.api
                .send_message(&self.identity, &conversation, &content)
                .await,
        );
    }

    async fn view_claimed(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let Some(conversation) = self.claimed.choose(rng).cloned() else {
            return;
        };
        settle(
            self.kind(),
            "list_messages",
            ctx.api.list_messages(&self.identity, &conversation).await,
        );
    }

    /// Return a claimed conversation to the queue.
    async fn unclaim(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let Some(conversation) = self.claimed.choose(rng).cloned() else {
            return;
        };
        let released = settle(
            self.kind(),
            "unclaim",
            ctx.api.unclaim(&self.identity, &conversation).await,
        );
        if released.is_some() {
            self.claimed.retain(|c| *c != conversation);
        }
    }

    async fn poll_queue(&mut self, ctx: &WorkloadContext) {
        settle(
            self.kind(),
            "expert_queue_updates",
            ctx.api
                .expert_queue_updates(&self.identity, self.last_check)
                .await,
        );
        self.last_check = Some(Utc::now());
    }

    async fn view_profile(&mut self, ctx: &WorkloadContext) {
        settle(
            self.kind(),
            "expert_profile",
            ctx.api.expert_profile(&self.identity).await,
        );
    }

    async fn view_history(&mut self, ctx: &WorkloadContext) {
        settle(
            self.kind(),
            "assignment_history",
            ctx.api.assignment_history(&self.identity).await,
        );
    }
}

#[async_trait]
impl Persona for ExpertPersona {
    type Action = ExpertAction;

    fn kind(&self) -> PersonaKind {
        PersonaKind::Expert
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn actions(&self) -> &WeightedTable<ExpertAction> {
        &self.actions
    }

    async fn perform(&mut self, action: ExpertAction, ctx: &WorkloadContext, rng: &mut ActorRng) {
        match action {
            ExpertAction::Claim => self.claim(ctx).await,
            ExpertAction::Respond => self.respond(ctx, rng).await,
            ExpertAction::ViewClaimed => self.view_claimed(ctx, rng).await,
            ExpertAction::Unclaim => self.unclaim(ctx, rng).await,
            ExpertAction::PollQueue => self.poll_queue(ctx).await,
            ExpertAction::ViewProfile => self.view_profile(ctx).await,
            ExpertAction::ViewHistory => self.view_history(ctx).await,
        }
    }
}
