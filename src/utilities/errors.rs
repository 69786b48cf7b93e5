//! Error types for the influencer agent.
//!
//! Collaborator failures are always resolved to a neutral default at the call
//! site; only [`AgentError`] escapes a tick, and the scheduling loop logs it.

use std::time::Duration;

use thiserror::Error;

use crate::persona::PersonaId;

/// Errors raised while calling an external collaborator.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// No client or credentials are configured for the service.
    #[error("{service} is unavailable")]
    Unavailable { service: &'static str },

    /// The call was made but failed (transport, backend error, ...).
    #[error("{service} call failed: {message}")]
    CallFailed {
        service: &'static str,
        message: String,
    },

    /// The service answered with something that does not validate.
    #[error("{service} returned a malformed response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    /// The call did not complete within the configured deadline.
    #[error("{service} did not answer within {after:?}")]
    TimedOut {
        service: &'static str,
        after: Duration,
    },
}

impl CollaboratorError {
    /// Shorthand for a [`CollaboratorError::CallFailed`].
    pub fn call_failed(service: &'static str, message: impl Into<String>) -> Self {
        Self::CallFailed {
            service,
            message: message.into(),
        }
    }

    /// Shorthand for a [`CollaboratorError::MalformedResponse`].
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            message: message.into(),
        }
    }
}

/// Errors from the persona store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Persona not found.
    #[error("Persona not found: {id}")]
    NotFound { id: PersonaId },

    /// Storage error.
    #[error("Persona store error: {message}")]
    Storage { message: String },
}

/// Errors that abandon a tick.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Underlying persona store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A collaborator error that could not be defaulted at its call site.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The tick panicked; the panic payload is rendered into `message`.
    #[error("tick panicked: {message}")]
    TickPanicked { message: String },
}

/// Errors raised while building an [`AgentConfig`](crate::utilities::config::AgentConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has a value that cannot be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Result alias for tick-level operations.
pub type AgentResult<T> = Result<T, AgentError>;
