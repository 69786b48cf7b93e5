//! Memory subsystem for the agent.
//!
//! Currently a single store: [`SentimentMemory`], the rolling record of what
//! was published and how the audience received it.

pub mod sentiment;

pub use sentiment::{InteractionKind, InteractionRecord, SentimentMemory};
