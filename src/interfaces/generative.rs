//! Prompt-driven collaborators over a generative model backend.
//!
//! [`GenerativeCollaborators`] assembles the prompts for mood classification,
//! ROI scoring, interest regeneration, scene writing and video verification,
//! sends them to a [`GenerativeBackend`], and validates the JSON reply into
//! the typed result of each collaborator trait. Transport to a concrete model
//! API lives behind the backend trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::selector::ContentAction;
use crate::agent::state::MoodReading;
use crate::interfaces::{
    ContentVerifier, InterestGenerator, MoodAssessment, RoiAssessment, RoiScorer, ScenePrompt,
    ScriptWriter, SentimentClassifier, VideoHandle, CONTENT_VERIFIER, INTEREST_GENERATOR,
    ROI_SCORER, SCRIPT_WRITER, SENTIMENT_CLASSIFIER,
};
use crate::persona::Persona;
use crate::utilities::converter::parse_structured;
use crate::utilities::errors::CollaboratorError;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// A generative model that answers a prompt with JSON text.
///
/// Implementations should return [`CollaboratorError::Unavailable`] when no
/// credentials are configured and [`CollaboratorError::CallFailed`] for
/// transport or backend errors.
#[async_trait]
pub trait GenerativeBackend: Send + Sync + fmt::Debug {
    /// Model identifier, for logs.
    fn model(&self) -> &str;

    /// Send `prompt` and return the raw reply, expected to hold a JSON object.
    async fn generate_json(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Reply shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MoodReply {
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct RoiReply {
    score: Value,
    #[serde(default, alias = "next_action")]
    action: Option<String>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct InterestsReply {
    interests: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SceneReply {
    description: String,
    #[serde(default)]
    intention: String,
}

#[derive(Debug, Deserialize)]
struct VerificationReply {
    #[serde(default)]
    is_safe_to_post: bool,
    #[serde(default)]
    reason: String,
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Every prompt-driven collaborator, sharing one backend.
#[derive(Debug, Clone)]
pub struct GenerativeCollaborators {
    backend: Arc<dyn GenerativeBackend>,
}

impl GenerativeCollaborators {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    async fn ask<T: DeserializeOwned>(&self, service: &'static str, prompt: &str) -> Result<T, CollaboratorError> {
        debug!(service, model = self.backend.model(), "Sending prompt");
        let reply = self.backend.generate_json(prompt).await?;
        parse_structured(&reply).map_err(|e| CollaboratorError::malformed(service, e.message))
    }
}

#[async_trait]
impl SentimentClassifier for GenerativeCollaborators {
    async fn classify(&self, comments: &[String]) -> Result<MoodAssessment, CollaboratorError> {
        let reply: MoodReply = self
            .ask(SENTIMENT_CLASSIFIER, &mood_prompt(comments))
            .await?;
        let mood = match reply.mood {
            None => MoodReading::Neutral,
            Some(label) => label
                .parse::<MoodReading>()
                .map_err(|e| CollaboratorError::malformed(SENTIMENT_CLASSIFIER, e.to_string()))?,
        };
        Ok(MoodAssessment {
            mood,
            reasoning: reply.reasoning,
        })
    }
}

#[async_trait]
impl RoiScorer for GenerativeCollaborators {
    async fn score(&self, topic: &str, persona: &Persona) -> Result<RoiAssessment, CollaboratorError> {
        let reply: RoiReply = self.ask(ROI_SCORER, &roi_prompt(topic, persona)).await?;
        let score = numeric(&reply.score).ok_or_else(|| {
            CollaboratorError::malformed(ROI_SCORER, format!("score is not a number: {}", reply.score))
        })?;
        let action = match reply.action.as_deref() {
            None => ContentAction::TextPost,
            Some(label) => label.parse::<ContentAction>().unwrap_or_else(|e| {
                warn!(error = %e, "Unknown action from scorer, defaulting to text post");
                ContentAction::TextPost
            }),
        };
        Ok(RoiAssessment {
            score,
            action,
            reasoning: reply.reasoning,
        })
    }
}

#[async_trait]
impl InterestGenerator for GenerativeCollaborators {
    async fn regenerate(&self, persona: &Persona) -> Result<Vec<String>, CollaboratorError> {
        let reply: InterestsReply = self
            .ask(INTEREST_GENERATOR, &interests_prompt(persona))
            .await?;
        Ok(reply.interests)
    }
}

#[async_trait]
impl ScriptWriter for GenerativeCollaborators {
    async fn scene_prompt(&self, persona: &Persona, context: &str) -> Result<ScenePrompt, CollaboratorError> {
        let reply: SceneReply = self
            .ask(SCRIPT_WRITER, &scene_prompt(persona, context))
            .await?;
        if reply.description.trim().is_empty() {
            return Err(CollaboratorError::malformed(SCRIPT_WRITER, "empty description"));
        }
        Ok(ScenePrompt {
            description: reply.description,
            intention: reply.intention,
        })
    }
}

#[async_trait]
impl ContentVerifier for GenerativeCollaborators {
    async fn verify(&self, handle: &VideoHandle, script: &str, style_vibe: &str) -> bool {
        if handle.placeholder {
            info!(uri = %handle.uri, "Placeholder video, skipping verification");
            return true;
        }

        let prompt = verification_prompt(handle, script, style_vibe);
        match self.ask::<VerificationReply>(CONTENT_VERIFIER, &prompt).await {
            Ok(reply) if reply.is_safe_to_post => {
                info!(reason = %reply.reason, "Video passed verification");
                true
            }
            Ok(reply) => {
                warn!(reason = %reply.reason, "Video failed verification");
                false
            }
            Err(e) => {
                warn!(error = %e, "Multimodal verification failed");
                false
            }
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn mood_prompt(comments: &[String]) -> String {
    let listed = comments
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Classify the overall mood of this audience.\n\
         Comments:\n{listed}\n\n\
         Choose exactly one of: Positive, Neutral, Bored, Negative.\n\
         Reply with JSON: {{\"mood\": string, \"reasoning\": string}}"
    )
}

fn roi_prompt(topic: &str, persona: &Persona) -> String {
    format!(
        "You plan content for the virtual influencer '{name}'.\n\
         Tone: {tone}\n\
         Goals: {goals}\n\n\
         Rate the viral potential of the trend \"{topic}\" for this persona from 0 to 10.\n\
         If the score is below 8 the next action is \"TEXT_POST\"; at 8 or above it is \"VIDEO_POST\".\n\
         Keep the reasoning short.\n\
         Reply with JSON: {{\"score\": number, \"action\": string, \"reasoning\": string}}",
        name = persona.name,
        tone = persona.tone_or_default(),
        goals = persona.goals.join(", "),
    )
}

fn interests_prompt(persona: &Persona) -> String {
    format!(
        "The audience of the virtual influencer '{name}' has lost interest.\n\
         Tone: {tone}\n\
         Background: {background}\n\
         Current interests: {current}\n\n\
         Propose 3 to 5 fresh interests that stay true to the persona but move away from the current ones.\n\
         Reply with JSON: {{\"interests\": [string]}}",
        name = persona.name,
        tone = persona.tone_or_default(),
        background = persona.background.as_deref().unwrap_or("unspecified"),
        current = persona.interests.join(", "),
    )
}

fn scene_prompt(persona: &Persona, context: &str) -> String {
    format!(
        "You are the character engine for '{name}'.\n\
         Life story: {story}\n\
         Tone: {tone}\n\n\
         Write a scene for a short video.\n\
         Context: {context}\n\
         Reply with JSON: {{\"description\": \"third-person visual description\", \
         \"intention\": \"first-person internal monologue\"}}",
        name = persona.name,
        story = persona.life_story.as_deref().unwrap_or("A life yet to be written."),
        tone = persona.tone_or_default(),
    )
}

fn verification_prompt(handle: &VideoHandle, script: &str, style_vibe: &str) -> String {
    format!(
        "Review the video at {uri} before it is posted.\n\
         Script: \"{script}\"\n\
         Persona vibe: \"{style_vibe}\"\n\n\
         Fail it if it shows visual glitches, artifacts or distortions, or if its style does not match the vibe.\n\
         Reply with JSON: {{\"is_safe_to_post\": boolean, \"reason\": string}}",
        uri = handle.uri,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Backend that returns a canned reply and remembers the last prompt.
    #[derive(Debug)]
    struct CannedBackend {
        reply: Result<String, CollaboratorError>,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedBackend {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                last_prompt: Mutex::new(None),
            })
        }

        fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(CollaboratorError::Unavailable { service: "canned" }),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl GenerativeBackend for CannedBackend {
        fn model(&self) -> &str {
            "canned"
        }

        async fn generate_json(&self, prompt: &str) -> Result<String, CollaboratorError> {
            *self.last_prompt.lock() = Some(prompt.to_string());
            self.reply.clone()
        }
    }

    fn persona() -> Persona {
        Persona::new(1, "Caelum")
            .with_tone("Solarpunk engineer")
            .with_goals(["Grow audience", "Teach repair"])
    }

    #[tokio::test]
    async fn test_classify_parses_mood() {
        let backend = CannedBackend::replying(r#"{"mood": "Bored", "reasoning": "repetitive"}"#);
        let collaborators = GenerativeCollaborators::new(backend.clone());
        let assessment = collaborators
            .classify(&["Boring...".to_string()])
            .await
            .unwrap();
        assert_eq!(assessment.mood, MoodReading::Bored);
        assert_eq!(assessment.reasoning, "repetitive");
        assert!(backend.last_prompt.lock().as_deref().unwrap().contains("- Boring..."));
    }

    #[tokio::test]
    async fn test_classify_missing_mood_defaults_to_neutral() {
        let collaborators = GenerativeCollaborators::new(CannedBackend::replying(r#"{"reasoning": "?"}"#));
        let assessment = collaborators.classify(&["hm".to_string()]).await.unwrap();
        assert_eq!(assessment.mood, MoodReading::Neutral);
    }

    #[tokio::test]
    async fn test_classify_unknown_mood_is_malformed() {
        let collaborators = GenerativeCollaborators::new(CannedBackend::replying(r#"{"mood": "Ecstatic"}"#));
        let err = collaborators.classify(&["wow".to_string()]).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_score_accepts_legacy_action_and_string_score() {
        let backend = CannedBackend::replying(
            "```json\n{\"score\": \"8.5\", \"action\": \"VEO_VIDEO\", \"reasoning\": \"hot\"}\n```",
        );
        let collaborators = GenerativeCollaborators::new(backend.clone());
        let assessment = collaborators.score("Urban Rewilding", &persona()).await.unwrap();
        assert_eq!(assessment.score, 8.5);
        assert_eq!(assessment.action, ContentAction::VideoPost);

        let prompt = backend.last_prompt.lock().clone().unwrap();
        assert!(prompt.contains("Solarpunk engineer"));
        assert!(prompt.contains("Grow audience, Teach repair"));
        assert!(prompt.contains("Urban Rewilding"));
    }

    #[tokio::test]
    async fn test_score_unknown_action_defaults_to_text() {
        let collaborators =
            GenerativeCollaborators::new(CannedBackend::replying(r#"{"score": 9, "action": "PODCAST"}"#));
        let assessment = collaborators.score("t", &persona()).await.unwrap();
        assert_eq!(assessment.action, ContentAction::TextPost);
    }

    #[tokio::test]
    async fn test_score_without_number_is_malformed() {
        let collaborators =
            GenerativeCollaborators::new(CannedBackend::replying(r#"{"score": "high", "action": "TEXT_POST"}"#));
        let err = collaborators.score("t", &persona()).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::MalformedResponse { service: ROI_SCORER, .. }));
    }

    #[tokio::test]
    async fn test_backend_errors_propagate() {
        let collaborators = GenerativeCollaborators::new(CannedBackend::unavailable());
        assert!(matches!(
            collaborators.regenerate(&persona()).await,
            Err(CollaboratorError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_regenerate_and_scene_prompt() {
        let collaborators = GenerativeCollaborators::new(CannedBackend::replying(
            r#"{"interests": ["Seed Bombs", "Mesh Networks"], "description": "A rooftop farm", "intention": "I grow"}"#,
        ));
        assert_eq!(
            collaborators.regenerate(&persona()).await.unwrap(),
            vec!["Seed Bombs", "Mesh Networks"]
        );
        let scene = collaborators.scene_prompt(&persona(), "Topic: Seeds").await.unwrap();
        assert_eq!(scene.description, "A rooftop farm");
        assert_eq!(scene.intention, "I grow");
    }

    #[tokio::test]
    async fn test_verify_placeholder_skips_backend() {
        let backend = CannedBackend::unavailable();
        let collaborators = GenerativeCollaborators::new(backend.clone());
        let handle = VideoHandle::placeholder("https://example.com/dummy.mp4");
        assert!(collaborators.verify(&handle, "script", "warm").await);
        assert!(backend.last_prompt.lock().is_none());
    }

    #[tokio::test]
    async fn test_verify_real_handle_uses_reply() {
        let handle = VideoHandle::new("file:///videos/1.mp4");

        let pass = GenerativeCollaborators::new(CannedBackend::replying(
            r#"{"is_safe_to_post": true, "reason": "lush"}"#,
        ));
        assert!(pass.verify(&handle, "script", "warm").await);

        let reject = GenerativeCollaborators::new(CannedBackend::replying(
            r#"{"is_safe_to_post": false, "reason": "glitches"}"#,
        ));
        assert!(!reject.verify(&handle, "script", "warm").await);

        let broken = GenerativeCollaborators::new(CannedBackend::unavailable());
        assert!(!broken.verify(&handle, "script", "warm").await);
    }
}
