//! State shared by every actor of a run.

use crate::client::ChatApi;
use crate::config::LoadConfig;
use crate::registry::Registry;
use crate::usernames::{SharedUsernames, UsernameError, UsernameGenerator};
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Handles an actor needs: the API, the shared registry, the shared
/// username sequence and the run configuration.
///
/// Constructed once per run and cloned into each actor; clones share state.
#[derive(Clone)]
pub struct WorkloadContext {
    pub api: Arc<dyn ChatApi>,
    pub registry: Arc<Registry>,
    pub usernames: Arc<SharedUsernames>,
    pub config: Arc<LoadConfig>,
}

impl WorkloadContext {
    pub fn new(
        api: Arc<dyn ChatApi>,
        registry: Arc<Registry>,
        usernames: Arc<SharedUsernames>,
        config: Arc<LoadConfig>,
    ) -> Self {
        Self {
            api,
            registry,
            usernames,
            config,
        }
    }

    /// Build a fresh context: empty registry and a username generator seeded
    /// from the config, drawing unset parts from `rng`.
    pub fn from_config<R: Rng + ?Sized>(
        config: LoadConfig,
        api: Arc<dyn ChatApi>,
        rng: &mut R,
    ) -> Result<Self, UsernameError> {
        let generator = UsernameGenerator::with_optional(
            config.max_identity_space,
            config.username_seed,
            config.username_stride,
            rng,
        )?;
        info!(
            seed = generator.seed(),
            stride = generator.stride(),
            modulus = generator.modulus(),
            period = generator.period(),
            "Username generator ready"
        );

        Ok(Self::new(
            api,
            Arc::new(Registry::new()),
            Arc::new(SharedUsernames::new(generator)),
            Arc::new(config),
        ))
    }
}
