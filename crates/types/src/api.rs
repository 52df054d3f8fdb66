//! Request and response bodies of the help-desk REST API.
//!
//! Only the fields the load generator reads are modelled; unknown fields are
//! ignored so the server can evolve its payloads freely.

use crate::identifiers::{ConversationId, MessageId, UserId};
use serde::{Deserialize, Serialize};

/// Body of `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Response from register/login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

/// The `user` object embedded in auth responses.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of `POST /conversations`.
#[derive(Debug, Clone, Serialize)]
pub struct NewConversation {
    pub title: String,
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub content: String,
}

/// A conversation as rendered by `/conversations` and `/expert/queue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_expert_id: Option<UserId>,
}

/// A message as rendered by `/conversations/:id/messages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    pub sender_id: UserId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
}

/// Response from `GET /expert/queue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertQueue {
    #[serde(default)]
    pub waiting_conversations: Vec<Conversation>,
    #[serde(default)]
    pub assigned_conversations: Vec<Conversation>,
}
