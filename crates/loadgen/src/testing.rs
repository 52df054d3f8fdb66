//! In-memory [`ChatApi`] for driving persona scripts in tests.

use crate::client::{ChatApi, ClientError};
use crate::config::LoadConfig;
use crate::context::WorkloadContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helpdesk_types::{
    AuthResponse, Conversation, ConversationId, Credentials, ExpertQueue, Identity, Message,
    MessageId, UserId, UserSummary,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Scripted backend. Records every call by endpoint name.
#[derive(Default)]
pub struct FakeChatApi {
    refuse_register: bool,
    refuse_login: bool,
    fail_actions: bool,
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
    since_params: Mutex<Vec<Option<DateTime<Utc>>>>,
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<Message>>,
    queue: Mutex<ExpertQueue>,
    marked: Mutex<Vec<MessageId>>,
}

impl FakeChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register answers 422, as for an existing user.
    pub fn refuse_register(mut self) -> Self {
        self.refuse_register = true;
        self
    }

    /// Login answers 401.
    pub fn refuse_login(mut self) -> Self {
        self.refuse_login = true;
        self
    }

    /// Every non-auth endpoint answers 500.
    pub fn fail_actions(mut self) -> Self {
        self.fail_actions = true;
        self
    }

    pub fn with_conversations(self, conversations: Vec<Conversation>) -> Self {
        *self.conversations.lock() = conversations;
        self
    }

    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        *self.messages.lock() = messages;
        self
    }

    pub fn with_queue(self, queue: ExpertQueue) -> Self {
        *self.queue.lock() = queue;
        self
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == endpoint).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn since_params(&self) -> Vec<Option<DateTime<Utc>>> {
        self.since_params.lock().clone()
    }

    pub fn marked(&self) -> Vec<MessageId> {
        self.marked.lock().clone()
    }

    fn record(&self, endpoint: &'static str) -> Result<(), ClientError> {
        self.calls.lock().push(endpoint.to_string());
        if self.fail_actions {
            return Err(ClientError::UnexpectedStatus {
                endpoint,
                status: 500,
            });
        }
        Ok(())
    }

    fn issue_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn auth(&self, credentials: &Credentials) -> AuthResponse {
        AuthResponse {
            user: UserSummary {
                id: UserId(self.issue_id()),
                username: Some(credentials.username.clone()),
            },
            token: format!("token-{}", credentials.username),
        }
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.calls.lock().push("register".into());
        if self.refuse_register {
            return Err(ClientError::UnexpectedStatus {
                endpoint: "/auth/register",
                status: 422,
            });
        }
        Ok(self.auth(credentials))
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.calls.lock().push("login".into());
        if self.refuse_login {
            return Err(ClientError::UnexpectedStatus {
                endpoint: "/auth/login",
                status: 401,
            });
        }
        Ok(self.auth(credentials))
    }

    async fn current_user(&self, _identity: &Identity) -> Result<(), ClientError> {
        self.record("me")
    }

    async fn create_conversation(
        &self,
        _identity: &Identity,
        title: &str,
    ) -> Result<Conversation, ClientError> {
        self.record("create_conversation")?;
        Ok(Conversation {
            id: ConversationId(self.issue_id()),
            title: Some(title.to_string()),
            status: Some("waiting".into()),
            assigned_expert_id: None,
        })
    }

    async fn list_conversations(
        &self,
        _identity: &Identity,
    ) -> Result<Vec<Conversation>, ClientError> {
        self.record("list_conversations")?;
        Ok(self.conversations.lock().clone())
    }

    async fn list_messages(
        &self,
        _identity: &Identity,
        _conversation: &ConversationId,
    ) -> Result<Vec<Message>, ClientError> {
        self.record("list_messages")?;
        Ok(self.messages.lock().clone())
    }

    async fn send_message(
        &self,
        _identity: &Identity,
        _conversation: &ConversationId,
        _content: &str,
    ) -> Result<(), ClientError> {
        self.record("send_message")
    }

    async fn mark_read(&self, _identity: &Identity, message: &MessageId) -> Result<(), ClientError> {
        self.record("mark_read")?;
        self.marked.lock().push(message.clone());
        Ok(())
    }

    async fn conversation_updates(
        &self,
        _identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.since_params.lock().push(since);
        self.record("conversation_updates")
    }

    async fn message_updates(
        &self,
        _identity: &Identity,
        _since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.record("message_updates")
    }

    async fn expert_queue_updates(
        &self,
        _identity: &Identity,
        _since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.record("expert_queue_updates")
    }

    async fn expert_queue(&self, _identity: &Identity) -> Result<ExpertQueue, ClientError> {
        self.record("expert_queue")?;
        Ok(self.queue.lock().clone())
    }

    async fn claim(
        &self,
        _identity: &Identity,
        _conversation: &ConversationId,
    ) -> Result<(), ClientError> {
        self.record("claim")
    }

    async fn unclaim(
        &self,
        _identity: &Identity,
        _conversation: &ConversationId,
    ) -> Result<(), ClientError> {
        self.record("unclaim")
    }

    async fn expert_profile(&self, _identity: &Identity) -> Result<(), ClientError> {
        self.record("expert_profile")
    }

    async fn assignment_history(&self, _identity: &Identity) -> Result<(), ClientError> {
        self.record("assignment_history")
    }
}

/// Context over `api` with a fresh registry.
pub fn test_context(api: Arc<dyn ChatApi>, config: LoadConfig) -> WorkloadContext {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    WorkloadContext::from_config(config, api, &mut rng).expect("valid test config")
}

/// An identity stored in `ctx`'s registry.
pub fn stored_identity(ctx: &WorkloadContext, n: u32) -> Arc<Identity> {
    ctx.registry.store_identity(
        format!("user_{}", n),
        format!("token-{}", n),
        UserId(n.to_string()),
    )
}

pub fn conversation(id: &str) -> Conversation {
    Conversation {
        id: ConversationId::from(id),
        title: None,
        status: Some("waiting".into()),
        assigned_expert_id: None,
    }
}

pub fn message(id: &str, sender: &str, is_read: bool) -> Message {
    Message {
        id: MessageId::from(id),
        conversation_id: None,
        sender_id: UserId::from(sender),
        content: String::new(),
        is_read,
    }
}
