//! Lifecycle state, mood readings and the public status snapshot.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::persona::PersonaId;

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle state of the agent. Only the controller transitions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentLifecycleState {
    /// Initial state, and the state re-entered after every action or pivot.
    #[default]
    Idle,
    Planning,
    /// Producing high-cost content (synthesis + verification).
    Working,
    Resting,
    /// Running a persona pivot.
    Reflecting,
}

impl AgentLifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentLifecycleState::Idle => "idle",
            AgentLifecycleState::Planning => "planning",
            AgentLifecycleState::Working => "working",
            AgentLifecycleState::Resting => "resting",
            AgentLifecycleState::Reflecting => "reflecting",
        }
    }
}

impl fmt::Display for AgentLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Mood
// ============================================================================

/// Audience mood derived from recent comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoodReading {
    Positive,
    #[default]
    Neutral,
    Bored,
    Negative,
}

impl MoodReading {
    /// Bored and negative readings count toward a pivot.
    pub fn is_bad(&self) -> bool {
        matches!(self, MoodReading::Bored | MoodReading::Negative)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodReading::Positive => "Positive",
            MoodReading::Neutral => "Neutral",
            MoodReading::Bored => "Bored",
            MoodReading::Negative => "Negative",
        }
    }
}

impl fmt::Display for MoodReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised mood label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mood: {0:?}")]
pub struct UnknownMood(pub String);

impl FromStr for MoodReading {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("positive") => Ok(MoodReading::Positive),
            s if s.eq_ignore_ascii_case("neutral") => Ok(MoodReading::Neutral),
            s if s.eq_ignore_ascii_case("bored") => Ok(MoodReading::Bored),
            s if s.eq_ignore_ascii_case("negative") => Ok(MoodReading::Negative),
            other => Err(UnknownMood(other.to_string())),
        }
    }
}

// ============================================================================
// Activity log
// ============================================================================

/// Bounded log of recent activity, oldest entry evicted first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append `message` prefixed with the local wall-clock time.
    pub fn push(&mut self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        self.push_raw(format!("[{}] {}", timestamp, message));
    }

    fn push_raw(&mut self, entry: String) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

// ============================================================================
// Status snapshot
// ============================================================================

/// Mutable status owned by the controller; read through [`StatusSnapshot`].
#[derive(Debug, Clone)]
pub(crate) struct AgentStatus {
    pub state: AgentLifecycleState,
    pub last_roi_score: f64,
    pub current_mood: MoodReading,
    pub activity: ActivityLog,
    pub current_interests: Vec<String>,
}

impl AgentStatus {
    pub fn new(activity_capacity: usize) -> Self {
        Self {
            state: AgentLifecycleState::Idle,
            last_roi_score: 0.0,
            current_mood: MoodReading::Neutral,
            activity: ActivityLog::new(activity_capacity),
            current_interests: Vec::new(),
        }
    }

    pub fn snapshot(&self, focus: Option<PersonaId>, running: bool) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            roi_score: self.last_roi_score,
            mood: self.current_mood,
            recent_logs: self.activity.entries(),
            interests: self.current_interests.clone(),
            focus,
            running,
        }
    }
}

/// Read-only copy of the controller status, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: AgentLifecycleState,
    /// Score of the last completed decision.
    pub roi_score: f64,
    pub mood: MoodReading,
    /// At most `activity_log_capacity` entries, oldest first.
    pub recent_logs: Vec<String>,
    pub interests: Vec<String>,
    pub focus: Option<PersonaId>,
    pub running: bool,
}

// ============================================================================
// Tests
// ============================================================================
