//! Shared registry of identities and conversations.
//!
//! Lets concurrently running actors discover identities and conversations
//! created by other actors, so simulated users interact instead of each
//! living in isolation.
//!
//! Identities and conversations sit behind independent locks. They are never
//! updated together, and identity traffic must not stall conversation
//! traffic. Guards are scoped to a single in-memory read or write and are
//! never held across a network call.

use helpdesk_types::{ConversationId, Identity, UserId};
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// Process-wide store shared by every actor of a run.
///
/// Append-only: nothing is removed while the run lasts.
#[derive(Debug, Default)]
pub struct Registry {
    /// username -> identity. Indexed so a uniform pick is O(1).
    identities: Mutex<IndexMap<String, Arc<Identity>>>,

    /// Deduplicated known conversation ids.
    conversations: Mutex<IndexSet<ConversationId>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an identity, replacing any earlier entry for the same username.
    ///
    /// Re-registration and re-login overwrite on purpose so the latest token
    /// wins.
    pub fn store_identity(
        &self,
        username: impl Into<String>,
        auth_token: impl Into<String>,
        user_id: UserId,
    ) -> Arc<Identity> {
        let username = username.into();
        let identity = Arc::new(Identity::new(username.clone(), auth_token, user_id));
        self.identities
            .lock()
            .insert(username, Arc::clone(&identity));
        identity
    }

    /// A uniformly random stored identity, or `None` when empty.
    pub fn random_identity<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Identity>> {
        let identities = self.identities.lock();
        if identities.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..identities.len());
        identities.get_index(idx).map(|(_, identity)| Arc::clone(identity))
    }

    /// Look up an identity by username.
    pub fn identity(&self, username: &str) -> Option<Arc<Identity>> {
        self.identities.lock().get(username).cloned()
    }

    pub fn has_identities(&self) -> bool {
        !self.identities.lock().is_empty()
    }

    pub fn identity_count(&self) -> usize {
        self.identities.lock().len()
    }

    /// Record a conversation id. No-op if it is already known.
    pub fn add_conversation(&self, id: ConversationId) {
        self.conversations.lock().insert(id);
    }

    /// A uniformly random known conversation, or `None` when empty.
    pub fn random_conversation<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ConversationId> {
        let conversations = self.conversations.lock();
        if conversations.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..conversations.len());
        conversations.get_index(idx).cloned()
    }

    pub fn has_conversations(&self) -> bool {
        !self.conversations.lock().is_empty()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().len()
    }
}
