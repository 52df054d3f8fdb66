//! Help-desk Load Workload
//!
//! Persona-based request traffic for the help-desk chat backend. An external
//! load harness owns scheduling, ramp-up and statistics; this crate supplies
//! what each simulated user does and the state they share.
//!
//! # Architecture
//!
//! - **Usernames**: a deterministic `user_N` sequence shared by all actors
//! - **Registry**: identities and conversation ids that actors discover from
//!   each other, behind two independent locks
//! - **Personas**: idle, active and expert scripts choosing weighted actions
//! - **Actors**: one task per simulated user, driving a persona until
//!   cancelled
//! - **Shape**: the stepped arrival-rate schedule the scheduler follows
//!
//! # Example
//!
//! ```ignore
//! use helpdesk_loadgen::{spawn_actor, HttpChatApi, LoadConfig, PersonaMix, WorkloadContext};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = LoadConfig::load("loadgen.toml")?;
//! let api = Arc::new(HttpChatApi::new(config.base_url.clone())?);
//! let mix = PersonaMix::from_config(&config)?;
//! let ctx = WorkloadContext::from_config(config, api, &mut rand::thread_rng())?;
//!
//! let cancel = CancellationToken::new();
//! let kind = mix.choose(&mut rand::thread_rng());
//! let handle = spawn_actor(kind, ctx.clone(), cancel.clone());
//! ```

pub mod actor;
pub mod client;
pub mod config;
pub mod context;
pub mod personas;
pub mod registry;
pub mod shape;
pub mod telemetry;
pub mod usernames;
pub mod weighted;

#[cfg(test)]
mod testing;

pub use actor::{run_actor, spawn_actor, ActorSummary};
pub use client::{ChatApi, ClientError, HttpChatApi};
pub use config::{ConfigError, LoadConfig, PersonaConfig, WaitRange};
pub use context::WorkloadContext;
pub use personas::{Persona, PersonaError, PersonaKind, PersonaMix};
pub use registry::Registry;
pub use shape::{ArrivalShape, ShapeTick};
pub use usernames::{SharedUsernames, UsernameError, UsernameGenerator};
pub use weighted::{WeightedError, WeightedTable};
