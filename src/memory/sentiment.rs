//! Sentiment memory: rolling interaction history and the pivot trigger.
//!
//! Two parallel bounded histories are kept: the interaction records and their
//! raw sentiment scores. Both evict oldest-first once `capacity` is reached.
//! Alongside them a `consecutive_bad_moods` counter tracks how many mood
//! readings in a row came back bored or negative.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::agent::state::MoodReading;
use crate::interfaces::{with_deadline, SentimentClassifier, SENTIMENT_CLASSIFIER};
use crate::utilities::config::AgentConfig;

/// Kind of content an interaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Text,
    Video,
}

/// One published piece of content and the sentiment it drew. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub kind: InteractionKind,
    pub topic: String,
    /// In `[-1, 1]`.
    pub sentiment_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl InteractionRecord {
    /// Create a record stamped now. The score is clamped into `[-1, 1]`;
    /// a non-finite score is recorded as `0.0`.
    pub fn new(kind: InteractionKind, topic: impl Into<String>, sentiment_score: f64) -> Self {
        let sentiment_score = if sentiment_score.is_finite() {
            sentiment_score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            kind,
            topic: topic.into(),
            sentiment_score,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded sentiment history plus mood/pivot bookkeeping.
pub struct SentimentMemory {
    interactions: VecDeque<InteractionRecord>,
    scores: VecDeque<f64>,
    capacity: usize,
    window: usize,
    pivot_threshold: f64,
    bad_mood_limit: u32,
    consecutive_bad_moods: u32,
    classifier: Option<Arc<dyn SentimentClassifier>>,
    call_timeout: Option<Duration>,
}

impl SentimentMemory {
    /// Memory with the capacity, window and thresholds of `config`.
    pub fn new(config: &AgentConfig, classifier: Option<Arc<dyn SentimentClassifier>>) -> Self {
        Self {
            interactions: VecDeque::with_capacity(config.memory_capacity),
            scores: VecDeque::with_capacity(config.memory_capacity),
            capacity: config.memory_capacity.max(1),
            window: config.sentiment_window.max(1),
            pivot_threshold: config.pivot_sentiment_threshold,
            bad_mood_limit: config.bad_mood_limit,
            consecutive_bad_moods: 0,
            classifier,
            call_timeout: config.collaborator_timeout,
        }
    }

    /// Memory with default thresholds and no classifier.
    pub fn with_capacity(capacity: usize) -> Self {
        let config = AgentConfig {
            memory_capacity: capacity,
            ..AgentConfig::default()
        };
        Self::new(&config, None)
    }

    /// Append to both histories, evicting the oldest entries on overflow.
    pub fn record_interaction(&mut self, record: InteractionRecord) {
        debug!(
            kind = ?record.kind,
            topic = %record.topic,
            score = record.sentiment_score,
            "Recording interaction"
        );
        self.scores.push_back(record.sentiment_score);
        self.interactions.push_back(record);
        while self.interactions.len() > self.capacity {
            self.interactions.pop_front();
        }
        while self.scores.len() > self.capacity {
            self.scores.pop_front();
        }
    }

    /// Mean of the last `window` scores; `0.0` when the history is empty.
    pub fn average_sentiment(&self, window: usize) -> f64 {
        if self.scores.is_empty() || window == 0 {
            return 0.0;
        }
        let take = window.min(self.scores.len());
        let sum: f64 = self.scores.iter().rev().take(take).sum();
        sum / take as f64
    }

    /// [`average_sentiment`](Self::average_sentiment) over the configured window.
    pub fn recent_average(&self) -> f64 {
        self.average_sentiment(self.window)
    }

    /// Classify `comments` and update the bad-mood counter.
    ///
    /// Returns `Neutral` without a remote call when there are no comments or
    /// no classifier. A bored/negative reading increments the counter, any
    /// other reading resets it. A failed classification is logged and read
    /// as `Neutral`, leaving the counter untouched.
    pub async fn update_mood(&mut self, comments: &[String]) -> MoodReading {
        if comments.is_empty() {
            return MoodReading::Neutral;
        }
        let Some(classifier) = self.classifier.clone() else {
            return MoodReading::Neutral;
        };

        let result = with_deadline(
            SENTIMENT_CLASSIFIER,
            self.call_timeout,
            classifier.classify(comments),
        )
        .await;

        match result {
            Ok(assessment) => {
                info!(
                    mood = %assessment.mood,
                    reasoning = %assessment.reasoning,
                    "Audience mood analysis"
                );
                if assessment.mood.is_bad() {
                    self.consecutive_bad_moods = self.consecutive_bad_moods.saturating_add(1);
                } else {
                    self.consecutive_bad_moods = 0;
                }
                assessment.mood
            }
            Err(e) => {
                error!(error = %e, "Sentiment analysis failed");
                MoodReading::Neutral
            }
        }
    }

    /// Whether sentiment has drifted far enough to warrant a persona pivot.
    ///
    /// True when the recent average is below the pivot threshold or the
    /// bad-mood counter has reached its limit. Firing resets the counter.
    pub fn should_pivot(&mut self, interests: &[String]) -> bool {
        let average = self.recent_average();
        info!(
            average_sentiment = average,
            consecutive_bad_moods = self.consecutive_bad_moods,
            "Checking sentiment drift"
        );
        debug!(?interests, "Current persona interests");

        if average < self.pivot_threshold || self.consecutive_bad_moods >= self.bad_mood_limit {
            warn!("Sentiment is negative or audience is bored, persona pivot warranted");
            self.consecutive_bad_moods = 0;
            return true;
        }
        false
    }

    pub fn consecutive_bad_moods(&self) -> u32 {
        self.consecutive_bad_moods
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Interaction history, oldest first.
    pub fn interactions(&self) -> impl Iterator<Item = &InteractionRecord> {
        self.interactions.iter()
    }

    /// Score history, oldest first.
    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.iter().copied()
    }
}

impl std::fmt::Debug for SentimentMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentMemory")
            .field("len", &self.interactions.len())
            .field("capacity", &self.capacity)
            .field("consecutive_bad_moods", &self.consecutive_bad_moods)
            .field("has_classifier", &self.classifier.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::MoodAssessment;
    use crate::utilities::errors::CollaboratorError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Classifier that replays a fixed script of results and counts calls.
    struct ScriptedClassifier {
        script: Mutex<VecDeque<Result<MoodReading, CollaboratorError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClassifier {
        fn new(script: Vec<Result<MoodReading, CollaboratorError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SentimentClassifier for ScriptedClassifier {
        async fn classify(&self, _comments: &[String]) -> Result<MoodAssessment, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .pop_front()
                .unwrap_or(Ok(MoodReading::Neutral));
            next.map(|mood| MoodAssessment {
                mood,
                reasoning: "scripted".to_string(),
            })
        }
    }

    fn memory_with(classifier: Arc<ScriptedClassifier>) -> SentimentMemory {
        SentimentMemory::new(&AgentConfig::default(), Some(classifier))
    }

    fn record(topic: &str, score: f64) -> InteractionRecord {
        InteractionRecord::new(InteractionKind::Text, topic, score)
    }

    fn comments() -> Vec<String> {
        vec!["Boring...".to_string(), "Not feeling this vibe anymore".to_string()]
    }

    #[test]
    fn test_history_is_bounded_and_fifo() {
        let mut memory = SentimentMemory::with_capacity(50);
        for i in 0..120 {
            memory.record_interaction(record(&format!("topic-{}", i), 0.0));
            assert!(memory.len() <= 50);
            assert!(memory.scores().count() <= 50);
        }
        let topics: Vec<&str> = memory.interactions().map(|r| r.topic.as_str()).collect();
        assert_eq!(topics.len(), 50);
        assert_eq!(topics[0], "topic-70");
        assert_eq!(topics[49], "topic-119");
    }

    #[test]
    fn test_average_of_empty_history_is_zero() {
        let memory = SentimentMemory::with_capacity(50);
        assert_eq!(memory.average_sentiment(10), 0.0);
    }

    #[test]
    fn test_average_of_opposites_is_zero() {
        let mut memory = SentimentMemory::with_capacity(50);
        memory.record_interaction(record("a", 1.0));
        memory.record_interaction(record("b", -1.0));
        assert_eq!(memory.average_sentiment(10), 0.0);
    }

    #[test]
    fn test_average_uses_last_window_entries() {
        let mut memory = SentimentMemory::with_capacity(50);
        for _ in 0..5 {
            memory.record_interaction(record("old", 1.0));
        }
        for _ in 0..10 {
            memory.record_interaction(record("new", -0.5));
        }
        assert!((memory.average_sentiment(10) - -0.5).abs() < 1e-12);
    }

    #[test]
    fn test_record_clamps_scores() {
        assert_eq!(record("x", 4.0).sentiment_score, 1.0);
        assert_eq!(record("x", -3.0).sentiment_score, -1.0);
        assert_eq!(record("x", f64::NAN).sentiment_score, 0.0);
    }

    #[test]
    fn test_pivot_on_low_average_resets_counter() {
        let mut memory = SentimentMemory::with_capacity(50);
        for _ in 0..10 {
            memory.record_interaction(record("flop", -0.3));
        }
        memory.consecutive_bad_moods = 2;
        assert!(memory.should_pivot(&[]));
        assert_eq!(memory.consecutive_bad_moods(), 0);
    }

    #[test]
    fn test_pivot_at_bad_mood_limit_with_neutral_average() {
        let mut memory = SentimentMemory::with_capacity(50);
        memory.consecutive_bad_moods = 3;
        assert_eq!(memory.recent_average(), 0.0);
        assert!(memory.should_pivot(&["Solar Punk".to_string()]));
        assert_eq!(memory.consecutive_bad_moods(), 0);
        assert!(!memory.should_pivot(&[]));
    }

    #[test]
    fn test_no_pivot_below_limit() {
        let mut memory = SentimentMemory::with_capacity(50);
        memory.consecutive_bad_moods = 2;
        memory.record_interaction(record("ok", -0.2));
        assert!(!memory.should_pivot(&[]));
        assert_eq!(memory.consecutive_bad_moods(), 2);
    }

    #[tokio::test]
    async fn test_update_mood_with_no_comments_skips_classifier() {
        let classifier = ScriptedClassifier::new(vec![Ok(MoodReading::Negative)]);
        let mut memory = memory_with(classifier.clone());
        let mood = memory.update_mood(&[]).await;
        assert_eq!(mood, MoodReading::Neutral);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_mood_without_classifier_is_neutral() {
        let mut memory = SentimentMemory::with_capacity(50);
        assert_eq!(memory.update_mood(&comments()).await, MoodReading::Neutral);
        assert_eq!(memory.consecutive_bad_moods(), 0);
    }

    #[tokio::test]
    async fn test_bad_moods_accumulate_and_good_mood_resets() {
        let classifier = ScriptedClassifier::new(vec![
            Ok(MoodReading::Bored),
            Ok(MoodReading::Negative),
            Ok(MoodReading::Positive),
            Ok(MoodReading::Bored),
        ]);
        let mut memory = memory_with(classifier.clone());

        assert_eq!(memory.update_mood(&comments()).await, MoodReading::Bored);
        assert_eq!(memory.update_mood(&comments()).await, MoodReading::Negative);
        assert_eq!(memory.consecutive_bad_moods(), 2);

        assert_eq!(memory.update_mood(&comments()).await, MoodReading::Positive);
        assert_eq!(memory.consecutive_bad_moods(), 0);

        memory.update_mood(&comments()).await;
        assert_eq!(memory.consecutive_bad_moods(), 1);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_classification_is_neutral_and_keeps_counter() {
        let classifier = ScriptedClassifier::new(vec![
            Ok(MoodReading::Bored),
            Err(CollaboratorError::call_failed(SENTIMENT_CLASSIFIER, "503")),
        ]);
        let mut memory = memory_with(classifier);

        memory.update_mood(&comments()).await;
        assert_eq!(memory.consecutive_bad_moods(), 1);

        assert_eq!(memory.update_mood(&comments()).await, MoodReading::Neutral);
        assert_eq!(memory.consecutive_bad_moods(), 1);
    }

    #[tokio::test]
    async fn test_three_bad_readings_trigger_pivot() {
        let classifier = ScriptedClassifier::new(vec![
            Ok(MoodReading::Bored),
            Ok(MoodReading::Bored),
            Ok(MoodReading::Negative),
        ]);
        let mut memory = memory_with(classifier);
        for _ in 0..2 {
            memory.update_mood(&comments()).await;
            assert!(!memory.should_pivot(&[]));
        }
        memory.update_mood(&comments()).await;
        assert!(memory.should_pivot(&[]));
        assert_eq!(memory.consecutive_bad_moods(), 0);
    }
}
