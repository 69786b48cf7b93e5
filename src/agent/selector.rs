//! ROI-gated action selection.
//!
//! The selector asks the scoring collaborator how viral a topic is for the
//! current persona and turns the answer into an [`RoiDecision`]. It never
//! fails: an unavailable or failing scorer yields a safe text-post default.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::interfaces::{with_deadline, RoiScorer, ROI_SCORER};
use crate::persona::Persona;

/// Lowest and highest valid viral-potential scores.
pub const SCORE_RANGE: (f64, f64) = (0.0, 10.0);

/// Score reported when no scorer is configured.
pub const UNAVAILABLE_SCORE: f64 = 5.0;

/// Score reported when the scorer call fails.
pub const FAILURE_SCORE: f64 = 0.0;

/// Content action recommended by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentAction {
    /// Low-cost text post.
    #[default]
    TextPost,
    /// High-cost video post.
    VideoPost,
}

impl ContentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentAction::TextPost => "TEXT_POST",
            ContentAction::VideoPost => "VIDEO_POST",
        }
    }
}

impl fmt::Display for ContentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentAction {
    type Err = String;

    /// Accepts the scorer's labels; `VEO_VIDEO` is an alias for video.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "TEXT_POST" | "TEXT" => Ok(ContentAction::TextPost),
            "VIDEO_POST" | "VEO_VIDEO" | "VIDEO" => Ok(ContentAction::VideoPost),
            _ => Err(format!("unknown content action: {}", s)),
        }
    }
}

/// Outcome of scoring one topic. Produced fresh every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiDecision {
    /// Viral potential, clamped to [`SCORE_RANGE`].
    pub score: f64,
    pub action: ContentAction,
    pub reasoning: String,
}

impl RoiDecision {
    /// Whether this decision takes the high-cost path.
    ///
    /// Re-checks the threshold instead of trusting the scorer's action alone.
    pub fn warrants_video(&self, threshold: f64) -> bool {
        self.action == ContentAction::VideoPost && self.score >= threshold
    }

    fn fallback(score: f64, reasoning: &str) -> Self {
        Self {
            score,
            action: ContentAction::TextPost,
            reasoning: reasoning.to_string(),
        }
    }
}

/// Scores topics against a persona.
#[derive(Clone)]
pub struct ActionSelector {
    scorer: Option<Arc<dyn RoiScorer>>,
    call_timeout: Option<Duration>,
}

impl ActionSelector {
    pub fn new(scorer: Option<Arc<dyn RoiScorer>>, call_timeout: Option<Duration>) -> Self {
        Self {
            scorer,
            call_timeout,
        }
    }

    /// Score `topic` for `persona`.
    ///
    /// Unavailable scorer ⇒ `{5.0, TextPost, "unavailable"}`; failed call ⇒
    /// `{0.0, TextPost, "error: …"}`. Scores outside `[0, 10]` are clamped,
    /// non-finite scores become `0.0`.
    pub async fn score(&self, topic: &str, persona: &Persona) -> RoiDecision {
        let Some(scorer) = self.scorer.as_ref() else {
            return RoiDecision::fallback(UNAVAILABLE_SCORE, "unavailable");
        };

        match with_deadline(ROI_SCORER, self.call_timeout, scorer.score(topic, persona)).await {
            Ok(assessment) => RoiDecision {
                score: clamp_score(assessment.score),
                action: assessment.action,
                reasoning: assessment.reasoning,
            },
            Err(e) => {
                error!(error = %e, topic, "ROI calculation failed");
                RoiDecision::fallback(FAILURE_SCORE, &format!("error: {}", e))
            }
        }
    }
}

impl fmt::Debug for ActionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSelector")
            .field("has_scorer", &self.scorer.is_some())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

fn clamp_score(raw: f64) -> f64 {
    let (low, high) = SCORE_RANGE;
    if !raw.is_finite() {
        warn!(raw, "Scorer returned a non-finite score, using 0");
        return low;
    }
    if raw < low || raw > high {
        warn!(raw, "Scorer returned an out-of-range score, clamping");
    }
    raw.clamp(low, high)
}

// ============================================================================
// Tests
// ============================================================================
