//! # influencer-agent
//!
//! Reactive control loop that drives an autonomous "virtual influencer"
//! persona. On a fixed schedule the agent perceives its audience, reflects
//! on sentiment (pivoting the persona's interests when the audience turns
//! sour), scores a topic for return on investment and acts on it with a
//! cheap text post or an expensive verified video.
//!
//! Every external capability (classification, scoring, synthesis,
//! verification, persistence) sits behind a trait in [`interfaces`]; the
//! core never fails because a collaborator did.
//!
//! ## Modules
//!
//! - [`agent`]: [`AgentController`] state machine, scheduler and ROI selector
//! - [`memory`]: [`SentimentMemory`], the rolling history behind pivots
//! - [`persona`]: persona records and the [`PersonaPivotExecutor`]
//! - [`interfaces`]: collaborator traits and stock implementations
//! - [`server`]: axum control surface
//! - [`utilities`]: configuration, errors, JSON extraction

pub mod agent;
pub mod interfaces;
pub mod memory;
pub mod persona;
pub mod server;
pub mod utilities;

pub use agent::{AgentController, AgentLifecycleState, ContentAction, MoodReading, StatusSnapshot, TickOutcome};
pub use interfaces::Collaborators;
pub use memory::SentimentMemory;
pub use persona::{Persona, PersonaId, PersonaPivotExecutor};
pub use utilities::config::AgentConfig;
pub use utilities::errors::{AgentError, CollaboratorError, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
