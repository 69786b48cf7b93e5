//! # Collaborator interfaces
//!
//! The agent core perceives and acts exclusively through the traits in this
//! module. Each collaborator is an opaque asynchronous service; the core calls
//! it, awaits it and converts any failure into a documented neutral default at
//! the call site.
//!
//! ## Architecture
//!
//! ```text
//! AgentController
//!   │ perceive ──► PersonaStore, AudienceFeed, SentimentClassifier
//!   │ decide   ──► TrendSource, RoiScorer
//!   │ act      ──► ScriptWriter, VideoSynthesizer, ContentVerifier
//!   │ pivot    ──► InterestGenerator, PersonaStore::commit_interests
//!   ▼
//! Collaborators (bundle of Arc<dyn Trait>)
//!   ├── GenerativeCollaborators  (prompt → JSON over a GenerativeBackend)
//!   ├── InMemoryPersonaStore
//!   └── simulated feeds / placeholder synthesizer
//! ```
//!
//! Results are typed structures validated at the boundary; nothing
//! dictionary-shaped crosses into the core.

pub mod generative;
pub mod in_memory;
pub mod simulated;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::selector::ContentAction;
use crate::agent::state::MoodReading;
use crate::persona::{Persona, PersonaId};
use crate::utilities::config::DEFAULT_TOPIC;
use crate::utilities::errors::{CollaboratorError, StoreError};

pub use generative::{GenerativeBackend, GenerativeCollaborators};
pub use in_memory::InMemoryPersonaStore;
pub use simulated::{PlaceholderVideoSynthesizer, SimulatedAudienceFeed, StaticTrendSource};

// ---------------------------------------------------------------------------
// Service names (used in errors and logs)
// ---------------------------------------------------------------------------

pub const SENTIMENT_CLASSIFIER: &str = "sentiment-classifier";
pub const ROI_SCORER: &str = "roi-scorer";
pub const INTEREST_GENERATOR: &str = "interest-generator";
pub const SCRIPT_WRITER: &str = "script-writer";
pub const VIDEO_SYNTHESIZER: &str = "video-synthesizer";
pub const CONTENT_VERIFIER: &str = "content-verifier";
pub const AUDIENCE_FEED: &str = "audience-feed";
pub const TREND_SOURCE: &str = "trend-source";

// ---------------------------------------------------------------------------
// Typed results
// ---------------------------------------------------------------------------

/// Mood classification of a batch of audience comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAssessment {
    pub mood: MoodReading,
    pub reasoning: String,
}

/// Viral-potential assessment of a topic for a persona.
///
/// `score` is passed through as reported; clamping is the selector's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAssessment {
    pub score: f64,
    pub action: ContentAction,
    pub reasoning: String,
}

/// Scene prompt for a short video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePrompt {
    /// Third-person visual description; used as the synthesis script.
    pub description: String,
    /// First-person internal monologue.
    pub intention: String,
}

impl ScenePrompt {
    /// Prompt used when no script writer answers.
    pub fn fallback() -> Self {
        Self {
            description: "Fallback".to_string(),
            intention: "Fallback".to_string(),
        }
    }
}

/// Reference to a synthesized video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoHandle {
    pub uri: String,
    /// Placeholder handles point at no real media and skip remote verification.
    #[serde(default)]
    pub placeholder: bool,
}

impl VideoHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            placeholder: false,
        }
    }

    pub fn placeholder(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            placeholder: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Classifies audience comments into a [`MoodReading`].
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, comments: &[String]) -> Result<MoodAssessment, CollaboratorError>;
}

/// Scores the viral potential of a topic for a persona.
#[async_trait]
pub trait RoiScorer: Send + Sync {
    async fn score(&self, topic: &str, persona: &Persona) -> Result<RoiAssessment, CollaboratorError>;
}

/// Produces a fresh interest set for a persona.
#[async_trait]
pub trait InterestGenerator: Send + Sync {
    async fn regenerate(&self, persona: &Persona) -> Result<Vec<String>, CollaboratorError>;
}

/// Writes the scene prompt that drives video synthesis.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn scene_prompt(&self, persona: &Persona, context: &str) -> Result<ScenePrompt, CollaboratorError>;
}

/// Turns a script into a video. `None` signals failure or unavailability.
#[async_trait]
pub trait VideoSynthesizer: Send + Sync {
    async fn synthesize(&self, script: &str) -> Option<VideoHandle>;
}

/// Gates a synthesized video before it counts as published.
///
/// Returns `false` on failure as well as on explicit rejection.
#[async_trait]
pub trait ContentVerifier: Send + Sync {
    async fn verify(&self, handle: &VideoHandle, script: &str, style_vibe: &str) -> bool;
}

/// Durable persona records.
#[async_trait]
pub trait PersonaStore: Send + Sync {
    async fn get(&self, id: PersonaId) -> Result<Option<Persona>, StoreError>;

    /// The persona used when no focus is set (the first record).
    async fn get_default(&self) -> Result<Option<Persona>, StoreError>;

    /// Replace the interest set of `id` wholesale and commit it.
    ///
    /// Either the whole set is replaced or nothing changes.
    async fn commit_interests(&self, id: PersonaId, interests: Vec<String>) -> Result<Persona, StoreError>;
}

/// Source of recent audience comments for a persona.
#[async_trait]
pub trait AudienceFeed: Send + Sync {
    async fn recent_comments(&self, persona: &Persona) -> Result<Vec<String>, CollaboratorError>;
}

/// Default source of the topic evaluated each tick.
#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn current_topic(&self) -> Result<String, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The full set of collaborators injected into an
/// [`AgentController`](crate::agent::AgentController).
///
/// Generative collaborators are optional; an absent one is treated as
/// unavailable and resolves to its neutral default without a call.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn PersonaStore>,
    pub audience: Arc<dyn AudienceFeed>,
    pub trends: Arc<dyn TrendSource>,
    pub classifier: Option<Arc<dyn SentimentClassifier>>,
    pub scorer: Option<Arc<dyn RoiScorer>>,
    pub interest_generator: Option<Arc<dyn InterestGenerator>>,
    pub script_writer: Option<Arc<dyn ScriptWriter>>,
    pub video: Option<Arc<dyn VideoSynthesizer>>,
    pub verifier: Option<Arc<dyn ContentVerifier>>,
}

impl Collaborators {
    /// Bundle with only a store: simulated audience, static default topic,
    /// and every generative collaborator unavailable.
    pub fn new(store: Arc<dyn PersonaStore>) -> Self {
        Self {
            store,
            audience: Arc::new(SimulatedAudienceFeed::default()),
            trends: Arc::new(StaticTrendSource::new(DEFAULT_TOPIC)),
            classifier: None,
            scorer: None,
            interest_generator: None,
            script_writer: None,
            video: None,
            verifier: None,
        }
    }

    /// Wire every prompt-driven collaborator to one generative backend.
    pub fn with_generative(mut self, generative: Arc<GenerativeCollaborators>) -> Self {
        self.classifier = Some(generative.clone());
        self.scorer = Some(generative.clone());
        self.interest_generator = Some(generative.clone());
        self.script_writer = Some(generative.clone());
        self.verifier = Some(generative);
        self
    }

    pub fn with_audience(mut self, audience: Arc<dyn AudienceFeed>) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_trends(mut self, trends: Arc<dyn TrendSource>) -> Self {
        self.trends = trends;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn RoiScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_interest_generator(mut self, generator: Arc<dyn InterestGenerator>) -> Self {
        self.interest_generator = Some(generator);
        self
    }

    pub fn with_script_writer(mut self, writer: Arc<dyn ScriptWriter>) -> Self {
        self.script_writer = Some(writer);
        self
    }

    pub fn with_video(mut self, video: Arc<dyn VideoSynthesizer>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ContentVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// Await a collaborator call, failing with [`CollaboratorError::TimedOut`]
/// once `limit` elapses. `None` waits indefinitely.
pub async fn with_deadline<T, F>(
    service: &'static str,
    limit: Option<Duration>,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match limit {
        None => call.await,
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| CollaboratorError::TimedOut { service, after })?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_passes_results_through() {
        let ok = with_deadline(ROI_SCORER, Some(Duration::from_secs(1)), async { Ok::<_, CollaboratorError>(3) })
            .await
            .unwrap();
        assert_eq!(ok, 3);

        let err = with_deadline(ROI_SCORER, None, async {
            Err::<u8, _>(CollaboratorError::Unavailable { service: ROI_SCORER })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let err = with_deadline(VIDEO_SYNTHESIZER, Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, CollaboratorError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CollaboratorError::TimedOut { service: VIDEO_SYNTHESIZER, .. }
        ));
    }

    #[test]
    fn test_video_handle_constructors() {
        assert!(!VideoHandle::new("file:///tmp/a.mp4").placeholder);
        assert!(VideoHandle::placeholder("https://example.com/a.mp4").placeholder);
    }
}
