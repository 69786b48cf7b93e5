//! Agent module.
//!
//! Contains the [`AgentController`] that runs the perceive/decide/act loop,
//! the ROI [`ActionSelector`], the injected-trend mailbox, and the status
//! types the controller publishes.

pub mod controller;
pub mod mailbox;
pub mod selector;
pub mod state;

pub use self::controller::{ActionOutcome, AgentController, TickOutcome};
pub use self::mailbox::TrendMailbox;
pub use self::selector::{ActionSelector, ContentAction, RoiDecision};
pub use self::state::{ActivityLog, AgentLifecycleState, MoodReading, StatusSnapshot};
