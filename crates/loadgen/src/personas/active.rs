//! Active persona: asks questions and keeps conversations going.

use super::{acquire_identity, settle, ActorRng, Persona, PersonaError, PersonaKind};
use crate::context::WorkloadContext;
use crate::weighted::WeightedTable;
use async_trait::async_trait;
use chrono::Utc;
use helpdesk_types::{ConversationId, Identity};
use indexmap::IndexSet;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

const TOPICS: [&str; 5] = ["Rails", "Ruby", "AWS", "Docker", "Database"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActiveAction {
    CreateConversation,
    SendMessage,
    ListConversations,
    ViewMessages,
    MarkRead,
    WhoAmI,
}

impl ActiveAction {
    pub const WEIGHTS: [(ActiveAction, u32); 6] = [
        (ActiveAction::CreateConversation, 4),
        (ActiveAction::SendMessage, 5),
        (ActiveAction::ListConversations, 4),
        (ActiveAction::ViewMessages, 4),
        (ActiveAction::MarkRead, 1),
        (ActiveAction::WhoAmI, 1),
    ];
}

pub struct ActivePersona {
    identity: Arc<Identity>,
    actions: WeightedTable<ActiveAction>,
    /// Conversations this user started or saw in its own listing.
    conversations: IndexSet<ConversationId>,
}

impl ActivePersona {
    pub fn new(identity: Arc<Identity>) -> Result<Self, PersonaError> {
        Ok(Self {
            identity,
            actions: WeightedTable::new(ActiveAction::WEIGHTS.to_vec())?,
            conversations: IndexSet::new(),
        })
    }

    /// Acquire an identity and build the persona.
    pub async fn start(ctx: &WorkloadContext, rng: &mut ActorRng) -> Result<Self, PersonaError> {
        Self::new(acquire_identity(ctx, rng).await?)
    }

    pub fn conversations(&self) -> &IndexSet<ConversationId> {
        &self.conversations
    }

    fn random_own<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ConversationId> {
        if self.conversations.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.conversations.len());
        self.conversations.get_index(idx).cloned()
    }

    async fn create_conversation(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let topic = TOPICS.choose(rng).copied().unwrap_or(TOPICS[0]);
        let title = format!("Question about {} - {}", topic, Utc::now().to_rfc3339());
        let created = settle(
            self.kind(),
            "create_conversation",
            ctx.api.create_conversation(&self.identity, &title).await,
        );
        if let Some(conversation) = created {
            if conversation.id.as_str().is_empty() {
                return;
            }
            self.conversations.insert(conversation.id.clone());
            ctx.registry.add_conversation(conversation.id);
        }
    }

    async fn send_message(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let Some(conversation) = self.random_own(rng) else {
            debug!(persona = %self.kind(), "No conversation to message yet");
            return;
        };
        let content = format!("Message at {}", Utc::now().to_rfc3339());
        settle(
            self.kind(),
            "send_message",
            ctx.api
                .send_message(&self.identity, &conversation, &content)
                .await,
        );
    }

    async fn list_conversations(&mut self, ctx: &WorkloadContext) {
        let listed = settle(
            self.kind(),
            "list_conversations",
            ctx.api.list_conversations(&self.identity).await,
        );
        for conversation in listed.into_iter().flatten() {
            if !conversation.id.as_str().is_empty() {
                self.conversations.insert(conversation.id);
            }
        }
    }

    /// Read one conversation: an own one if any, else one another actor
    /// created.
    async fn view_messages(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let conversation = match self.random_own(rng) {
            Some(conversation) => conversation,
            None => match ctx.registry.random_conversation(rng) {
                Some(conversation) => conversation,
                None => {
                    debug!(persona = %self.kind(), "No known conversation to view");
                    return;
                }
            },
        };
        settle(
            self.kind(),
            "list_messages",
            ctx.api.list_messages(&self.identity, &conversation).await,
        );
    }

    /// Mark the first unread message someone else sent in an own conversation.
    async fn mark_read(&mut self, ctx: &WorkloadContext, rng: &mut ActorRng) {
        let Some(conversation) = self.random_own(rng) else {
            return;
        };
        let Some(messages) = settle(
            self.kind(),
            "list_messages",
            ctx.api.list_messages(&self.identity, &conversation).await,
        ) else {
            return;
        };

        let unread = messages
            .into_iter()
            .find(|m| !m.is_read && m.sender_id != self.identity.user_id);
        if let Some(message) = unread {
            settle(
                self.kind(),
                "mark_read",
                ctx.api.mark_read(&self.identity, &message.id).await,
            );
        }
    }

    async fn who_am_i(&mut self, ctx: &WorkloadContext) {
        settle(
            self.kind(),
            "current_user",
            ctx.api.current_user(&self.identity).await,
        );
    }
}

#[async_trait]
impl Persona for ActivePersona {
    type Action = ActiveAction;

    fn kind(&self) -> PersonaKind {
        PersonaKind::Active
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn actions(&self) -> &WeightedTable<ActiveAction> {
        &self.actions
    }

    async fn perform(&mut self, action: ActiveAction, ctx: &WorkloadContext, rng: &mut ActorRng) {
        match action {
            ActiveAction::CreateConversation => self.create_conversation(ctx, rng).await,
            ActiveAction::SendMessage => self.send_message(ctx, rng).await,
            ActiveAction::ListConversations => self.list_conversations(ctx).await,
            ActiveAction::ViewMessages => self.view_messages(ctx, rng).await,
            ActiveAction::MarkRead => self.mark_read(ctx, rng).await,
            ActiveAction::WhoAmI => self.who_am_i(ctx).await,
        }
    }
}
