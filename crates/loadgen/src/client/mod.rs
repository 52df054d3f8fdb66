//! Client seam for the help-desk REST API.
//!
//! Personas talk to the backend only through [`ChatApi`], so scripts can run
//! against [`HttpChatApi`] in a real run and an in-memory fake in tests.
//! Each method succeeds only on the status the API documents for it; any
//! other status is a [`ClientError::UnexpectedStatus`].

mod http;

pub use http::HttpChatApi;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helpdesk_types::{
    AuthResponse, Conversation, ConversationId, Credentials, ExpertQueue, Identity, Message,
    MessageId,
};

/// Every endpoint the personas exercise.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /auth/register`, expects 200 or 201.
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;

    /// `POST /auth/login`, expects 200.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;

    /// `GET /auth/me`, expects 200.
    async fn current_user(&self, identity: &Identity) -> Result<(), ClientError>;

    /// `POST /conversations`, expects 201.
    async fn create_conversation(
        &self,
        identity: &Identity,
        title: &str,
    ) -> Result<Conversation, ClientError>;

    /// `GET /conversations`, expects 200.
    async fn list_conversations(&self, identity: &Identity)
        -> Result<Vec<Conversation>, ClientError>;

    /// `GET /conversations/:id/messages`, expects 200.
    async fn list_messages(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
    ) -> Result<Vec<Message>, ClientError>;

    /// `POST /messages`, expects 201.
    async fn send_message(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<(), ClientError>;

    /// `PUT /messages/:id/read`, expects 200.
    async fn mark_read(&self, identity: &Identity, message: &MessageId) -> Result<(), ClientError>;

    /// `GET /api/conversations/updates?userId&since`, expects 200.
    async fn conversation_updates(
        &self,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError>;

    /// `GET /api/messages/updates?userId&since`, expects 200.
    async fn message_updates(
        &self,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError>;

    /// `GET /api/expert-queue/updates?expertId&since`, expects 200.
    async fn expert_queue_updates(
        &self,
        identity: &Identity,
        since: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError>;

    /// `GET /expert/queue`, expects 200.
    async fn expert_queue(&self, identity: &Identity) -> Result<ExpertQueue, ClientError>;

    /// `POST /expert/conversations/:id/claim`, expects 200.
    async fn claim(&self, identity: &Identity, conversation: &ConversationId)
        -> Result<(), ClientError>;

    /// `POST /expert/conversations/:id/unclaim`, expects 200.
    async fn unclaim(
        &self,
        identity: &Identity,
        conversation: &ConversationId,
    ) -> Result<(), ClientError>;

    /// `GET /expert/profile`, expects 200.
    async fn expert_profile(&self, identity: &Identity) -> Result<(), ClientError>;

    /// `GET /expert/assignments/history`, expects 200.
    async fn assignment_history(&self, identity: &Identity) -> Result<(), ClientError>;
}

/// Errors from the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned unexpected status {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    #[error("Failed to decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    #[error("Backend not ready after {0:?}")]
    NotReady(std::time::Duration),
}

impl ClientError {
    /// Status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedStatus { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
