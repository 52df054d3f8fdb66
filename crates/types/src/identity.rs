//! Issued identities.

use crate::identifiers::UserId;

/// Credentials and ids returned by a successful register or login.
///
/// Immutable once issued. The registry owns the stored copy; personas hold
/// shared references to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Login name, also used as the password by the load generator.
    pub username: String,

    /// Bearer token for authenticated endpoints.
    pub auth_token: String,

    /// Server-side user id.
    pub user_id: UserId,
}

impl Identity {
    pub fn new(username: impl Into<String>, auth_token: impl Into<String>, user_id: UserId) -> Self {
        Self {
            username: username.into(),
            auth_token: auth_token.into(),
            user_id,
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.auth_token)
    }
}
