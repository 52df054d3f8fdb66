//! Simulated user personas.
//!
//! Each actor runs one persona. On start it either borrows an identity from
//! the shared registry or mints a new one (register, falling back to login).
//! After that it performs weighted random actions until the run stops.
//!
//! Per-action failures are not errors: a request that does not return its
//! expected status simply has no effect this cycle. Only identity
//! acquisition can fail, and that failure ends the one actor.

mod active;
mod expert;
mod idle;

pub use active::{ActiveAction, ActivePersona};
pub use expert::{ExpertAction, ExpertPersona};
pub use idle::{IdleAction, IdlePersona};

use crate::client::ClientError;
use crate::config::LoadConfig;
use crate::context::WorkloadContext;
use crate::weighted::{WeightedError, WeightedTable};
use async_trait::async_trait;
use helpdesk_types::{Credentials, Identity};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Random source owned by one actor.
pub type ActorRng = ChaCha8Rng;

/// The three user classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKind {
    /// Browser open, only polling for updates.
    Idle,
    /// Asks questions: creates conversations and sends messages.
    Active,
    /// Works the expert queue and answers.
    Expert,
}

impl PersonaKind {
    pub const ALL: [PersonaKind; 3] = [PersonaKind::Idle, PersonaKind::Active, PersonaKind::Expert];
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersonaKind::Idle => "idle",
            PersonaKind::Active => "active",
            PersonaKind::Expert => "expert",
        };
        f.write_str(name)
    }
}

/// A scripted behaviour driven by the actor loop.
#[async_trait]
pub trait Persona: Send {
    /// The actions this persona chooses between.
    type Action: Copy + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> PersonaKind;

    /// Identity every request is made as.
    fn identity(&self) -> &Identity;

    /// Relative frequency of each action.
    fn actions(&self) -> &WeightedTable<Self::Action>;

    /// Perform one action. Never fails: unexpected responses are logged and
    /// leave the persona's state untouched.
    async fn perform(&mut self, action: Self::Action, ctx: &WorkloadContext, rng: &mut ActorRng);
}

/// Picks the persona for each newly spawned actor by population weight.
#[derive(Debug, Clone)]
pub struct PersonaMix {
    table: WeightedTable<PersonaKind>,
}

impl PersonaMix {
    pub fn from_config(config: &LoadConfig) -> Result<Self, WeightedError> {
        let entries = PersonaKind::ALL
            .iter()
            .map(|&kind| (kind, config.persona(kind).weight))
            .collect();
        Ok(Self {
            table: WeightedTable::new(entries)?,
        })
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> PersonaKind {
        self.table.sample(rng)
    }

    pub fn table(&self) -> &WeightedTable<PersonaKind> {
        &self.table
    }
}

/// Obtain the identity an actor will act as.
///
/// When the registry already holds identities, the actor borrows a random
/// one unless the new-identity roll succeeds. Otherwise it takes the next
/// generated username (password = username), tries to register, and falls
/// back to login if registration is refused.
pub async fn acquire_identity(
    ctx: &WorkloadContext,
    rng: &mut ActorRng,
) -> Result<Arc<Identity>, PersonaError> {
    if ctx.registry.has_identities() && rng.gen::<f64>() > ctx.config.new_identity_probability {
        if let Some(identity) = ctx.registry.random_identity(rng) {
            debug!(username = %identity.username, "Borrowing existing identity");
            return Ok(identity);
        }
    }

    let username = ctx.usernames.next_username();
    let credentials = Credentials::new(username.clone(), username.clone());

    let auth = match ctx.api.register(&credentials).await {
        Ok(auth) => auth,
        Err(register_err) => {
            debug!(%username, error = %register_err, "Register refused, trying login");
            match ctx.api.login(&credentials).await {
                Ok(auth) => auth,
                Err(source) => {
                    warn!(%username, error = %source, "Could not register or log in");
                    return Err(PersonaError::IdentityUnavailable { username, source });
                }
            }
        }
    };

    info!(%username, user_id = %auth.user.id, "Identity acquired");
    Ok(ctx
        .registry
        .store_identity(username, auth.token, auth.user.id))
}

/// Unwrap an action's response, logging and discarding failures.
pub(crate) fn settle<T>(
    persona: PersonaKind,
    action: &'static str,
    result: Result<T, ClientError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(%persona, action, error = %e, "Request had no effect");
            None
        }
    }
}

/// Errors that end a single actor.
#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    #[error("Failed to register or log in as {username}: {source}")]
    IdentityUnavailable {
        username: String,
        #[source]
        source: ClientError,
    },

    /// A persona's action weights are empty or all zero. The built-in
    /// tables are constant and non-zero, so this only fires if one of them
    /// is edited into an invalid state.
    #[error("Invalid action table: {0}")]
    Actions(#[from] WeightedError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, FakeChatApi};
    use helpdesk_types::UserId;
    use rand::SeedableRng;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_new_identity_is_registered_and_stored() {
        let api = Arc::new(FakeChatApi::new());
        let ctx = test_context(api.clone(), LoadConfig::default().with_username_seed(0));
        let mut rng = ActorRng::seed_from_u64(1);

        let identity = acquire_identity(&ctx, &mut rng).await.unwrap();

        assert_eq!(identity.username, "user_0");
        assert_eq!(api.calls_to("register"), 1);
        assert_eq!(api.calls_to("login"), 0);
        assert_eq!(ctx.registry.identity_count(), 1);
        assert!(logs_contain("Identity acquired"));
    }

    #[tokio::test]
    async fn test_register_refusal_falls_back_to_login() {
        let api = Arc::new(FakeChatApi::new().refuse_register());
        let ctx = test_context(api.clone(), LoadConfig::default());
        let mut rng = ActorRng::seed_from_u64(2);

        let identity = acquire_identity(&ctx, &mut rng).await.unwrap();

        assert_eq!(api.calls_to("register"), 1);
        assert_eq!(api.calls_to("login"), 1);
        assert_eq!(
            ctx.registry.identity(&identity.username).unwrap().auth_token,
            identity.auth_token
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_both_refused_is_fatal() {
        let api = Arc::new(FakeChatApi::new().refuse_register().refuse_login());
        let ctx = test_context(api.clone(), LoadConfig::default());
        let mut rng = ActorRng::seed_from_u64(3);

        let err = acquire_identity(&ctx, &mut rng).await.unwrap_err();

        assert!(matches!(err, PersonaError::IdentityUnavailable { .. }));
        assert!(!ctx.registry.has_identities());
        assert!(logs_contain("Could not register or log in"));
    }

    #[tokio::test]
    async fn test_borrows_when_registry_populated() {
        let api = Arc::new(FakeChatApi::new());
        let ctx = test_context(
            api.clone(),
            LoadConfig::default().with_new_identity_probability(0.0),
        );
        ctx.registry
            .store_identity("user_99", "existing", UserId::from("99"));
        let mut rng = ActorRng::seed_from_u64(4);

        for _ in 0..20 {
            let identity = acquire_identity(&ctx, &mut rng).await.unwrap();
            assert_eq!(identity.username, "user_99");
        }
        assert_eq!(api.calls_to("register"), 0);
    }

    #[tokio::test]
    async fn test_always_new_when_probability_is_one() {
        let api = Arc::new(FakeChatApi::new());
        let ctx = test_context(
            api.clone(),
            LoadConfig::default()
                .with_new_identity_probability(1.0)
                .with_username_seed(0)
                .with_username_stride(1),
        );
        ctx.registry
            .store_identity("user_99", "existing", UserId::from("99"));
        let mut rng = ActorRng::seed_from_u64(5);

        for _ in 0..5 {
            acquire_identity(&ctx, &mut rng).await.unwrap();
        }
        assert_eq!(api.calls_to("register"), 5);
        assert_eq!(ctx.registry.identity_count(), 6);
    }

    #[test]
    fn test_builtin_action_tables_are_valid() {
        let identity = Arc::new(Identity::new("user_1", "token-1", UserId::from("1")));

        let idle = IdlePersona::new(identity.clone()).unwrap();
        let active = ActivePersona::new(identity.clone()).unwrap();
        let expert = ExpertPersona::new(identity).unwrap();

        assert_eq!(idle.actions().total_weight(), 1);
        assert_eq!(active.actions().total_weight(), 19);
        assert_eq!(expert.actions().total_weight(), 20);
    }

    #[test]
    fn test_persona_mix_follows_weights() {
        let mix = PersonaMix::from_config(&LoadConfig::default()).unwrap();
        assert_eq!(mix.table().weight_of(PersonaKind::Idle), 10);
        assert_eq!(mix.table().total_weight(), 14);

        let mut rng = ActorRng::seed_from_u64(6);
        let idle = (0..1400)
            .filter(|_| mix.choose(&mut rng) == PersonaKind::Idle)
            .count();
        assert!((850..1150).contains(&idle), "idle = {}", idle);
    }
}
