//! Types shared by the help-desk load generator.
//!
//! - **Identifiers**: string-backed ids that tolerate numeric JSON
//! - **Identity**: the credentials a simulated user acts under
//! - **API bodies**: request/response payloads of the REST API

pub mod api;
pub mod identifiers;
pub mod identity;

pub use api::{
    AuthResponse, Conversation, Credentials, ExpertQueue, Message, NewConversation, NewMessage,
    UserSummary,
};
pub use identifiers::{ConversationId, MessageId, UserId};
pub use identity::Identity;
