//! Configuration for a load run.
//!
//! Every field has a default matching the reference workload, so an empty
//! TOML document is a valid configuration:
//!
//! ```toml
//! base_url = "http://localhost:3000"
//! max_identity_space = 10000
//! new_identity_probability = 0.3
//!
//! [personas.active]
//! weight = 3
//! wait = { min = "5s", max = "10s" }
//!
//! [shape]
//! active_duration = "60s"
//! gap_duration = "10s"
//! arrival_rates = [2, 8, 32, 64, 128, 256, 512, 1024]
//! max_users = 30000
//! ```

use crate::personas::PersonaKind;
use crate::shape::ArrivalShape;
use rand::Rng;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Base URL of the chat backend.
    pub base_url: String,

    /// Size of the username space (the generator modulus).
    pub max_identity_space: u64,

    /// Probability that a starting actor mints a new identity even though
    /// the registry already has some to borrow.
    pub new_identity_probability: f64,

    /// Fixed username generator seed. Random when absent.
    pub username_seed: Option<u64>,

    /// Fixed username generator stride. Random prime when absent.
    pub username_stride: Option<u64>,

    /// Per-persona population weight and pacing.
    pub personas: PersonaSettings,

    /// Arrival-rate schedule handed to the external scheduler.
    pub shape: ArrivalShape,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            max_identity_space: 10_000,
            new_identity_probability: 0.3,
            username_seed: None,
            username_stride: None,
            personas: PersonaSettings::default(),
            shape: ArrivalShape::default(),
        }
    }
}

impl LoadConfig {
    /// Create a configuration targeting `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the username space size.
    pub fn with_max_identity_space(mut self, size: u64) -> Self {
        self.max_identity_space = size;
        self
    }

    /// Set the new-identity probability (0.0 to 1.0).
    pub fn with_new_identity_probability(mut self, probability: f64) -> Self {
        self.new_identity_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Pin the username generator seed.
    pub fn with_username_seed(mut self, seed: u64) -> Self {
        self.username_seed = Some(seed);
        self
    }

    /// Pin the username generator stride.
    pub fn with_username_stride(mut self, stride: u64) -> Self {
        self.username_stride = Some(stride);
        self
    }

    /// Replace the settings of one persona.
    pub fn with_persona(mut self, kind: PersonaKind, persona: PersonaConfig) -> Self {
        *self.personas.get_mut(kind) = persona;
        self
    }

    /// Set the arrival shape.
    pub fn with_shape(mut self, shape: ArrivalShape) -> Self {
        self.shape = shape;
        self
    }

    /// Settings for one persona.
    pub fn persona(&self, kind: PersonaKind) -> &PersonaConfig {
        self.personas.get(kind)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url {:?}: {}", self.base_url, e)))?;

        if self.max_identity_space == 0 {
            return Err(ConfigError::Invalid(
                "max_identity_space must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.new_identity_probability) {
            return Err(ConfigError::Invalid(format!(
                "new_identity_probability must be within [0, 1], got {}",
                self.new_identity_probability
            )));
        }
        if self.username_stride == Some(0) {
            return Err(ConfigError::Invalid("username_stride must be non-zero".into()));
        }

        for kind in PersonaKind::ALL {
            let wait = &self.persona(kind).wait;
            if wait.min > wait.max {
                return Err(ConfigError::Invalid(format!(
                    "{} wait min {:?} exceeds max {:?}",
                    kind, wait.min, wait.max
                )));
            }
        }
        if PersonaKind::ALL
            .iter()
            .all(|&kind| self.persona(kind).weight == 0)
        {
            return Err(ConfigError::Invalid(
                "at least one persona needs a positive weight".into(),
            ));
        }

        if self.shape.arrival_rates.is_empty() {
            return Err(ConfigError::Invalid("shape.arrival_rates is empty".into()));
        }
        if self.shape.active_duration.is_zero() {
            return Err(ConfigError::Invalid(
                "shape.active_duration must be positive".into(),
            ));
        }
        if self.shape.checked_schedule_duration().is_none() {
            return Err(ConfigError::Invalid(format!(
                "shape schedule of {} steps of {:?} + {:?} overflows",
                self.shape.arrival_rates.len(),
                self.shape.active_duration,
                self.shape.gap_duration
            )));
        }

        Ok(())
    }
}

/// Settings for all three personas.
///
/// A persona table may set only some of its fields; the rest keep that
/// persona's defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "PersonaOverrides")]
pub struct PersonaSettings {
    pub idle: PersonaConfig,
    pub active: PersonaConfig,
    pub expert: PersonaConfig,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            idle: PersonaConfig::new(10, WaitRange::fixed(Duration::from_secs(5))),
            active: PersonaConfig::new(
                3,
                WaitRange::between(Duration::from_secs(5), Duration::from_secs(10)),
            ),
            expert: PersonaConfig::new(
                1,
                WaitRange::between(Duration::from_secs(10), Duration::from_secs(15)),
            ),
        }
    }
}

impl PersonaSettings {
    pub fn get(&self, kind: PersonaKind) -> &PersonaConfig {
        match kind {
            PersonaKind::Idle => &self.idle,
            PersonaKind::Active => &self.active,
            PersonaKind::Expert => &self.expert,
        }
    }

    pub fn get_mut(&mut self, kind: PersonaKind) -> &mut PersonaConfig {
        match kind {
            PersonaKind::Idle => &mut self.idle,
            PersonaKind::Active => &mut self.active,
            PersonaKind::Expert => &mut self.expert,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PersonaOverrides {
    idle: PersonaOverride,
    active: PersonaOverride,
    expert: PersonaOverride,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PersonaOverride {
    weight: Option<u32>,
    wait: Option<WaitRange>,
}

impl PersonaOverride {
    fn apply(self, base: PersonaConfig) -> PersonaConfig {
        PersonaConfig {
            weight: self.weight.unwrap_or(base.weight),
            wait: self.wait.unwrap_or(base.wait),
        }
    }
}

impl From<PersonaOverrides> for PersonaSettings {
    fn from(overrides: PersonaOverrides) -> Self {
        let base = PersonaSettings::default();
        Self {
            idle: overrides.idle.apply(base.idle),
            active: overrides.active.apply(base.active),
            expert: overrides.expert.apply(base.expert),
        }
    }
}

/// Population weight and pacing of one persona.
#[derive(Clone, Debug)]
pub struct PersonaConfig {
    /// Relative share of spawned actors.
    pub weight: u32,

    /// Pause between consecutive actions.
    pub wait: WaitRange,
}

impl PersonaConfig {
    pub fn new(weight: u32, wait: WaitRange) -> Self {
        Self { weight, wait }
    }
}

/// Inclusive bounds of a uniformly random pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct WaitRange {
    #[serde(deserialize_with = "deserialize_duration")]
    pub min: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub max: Duration,
}

impl WaitRange {
    pub fn between(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn fixed(wait: Duration) -> Self {
        Self::between(wait, wait)
    }

    /// Draw a pause. Inverted bounds collapse to `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// Deserialize a humantime string such as `"10s"` or `"1m 30s"`.
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
