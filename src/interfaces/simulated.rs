//! Stand-in collaborators for running the loop without live services.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::interfaces::{AudienceFeed, TrendSource, VideoHandle, VideoSynthesizer};
use crate::persona::Persona;
use crate::utilities::errors::CollaboratorError;

/// Replays a fixed batch of comments every tick.
#[derive(Debug, Clone)]
pub struct SimulatedAudienceFeed {
    comments: Vec<String>,
}

impl SimulatedAudienceFeed {
    pub fn new<I, S>(comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            comments: comments.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for SimulatedAudienceFeed {
    fn default() -> Self {
        Self::new([
            "Your content is okay I guess",
            "Boring...",
            "Not feeling this vibe anymore",
        ])
    }
}

#[async_trait]
impl AudienceFeed for SimulatedAudienceFeed {
    async fn recent_comments(&self, _persona: &Persona) -> Result<Vec<String>, CollaboratorError> {
        Ok(self.comments.clone())
    }
}

/// Always proposes the same topic.
#[derive(Debug, Clone)]
pub struct StaticTrendSource {
    topic: String,
}

impl StaticTrendSource {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into() }
    }
}

#[async_trait]
impl TrendSource for StaticTrendSource {
    async fn current_topic(&self) -> Result<String, CollaboratorError> {
        Ok(self.topic.clone())
    }
}

/// Pretends to render a video: waits `latency`, then returns a placeholder handle.
#[derive(Debug, Clone)]
pub struct PlaceholderVideoSynthesizer {
    uri: String,
    latency: Duration,
}

impl PlaceholderVideoSynthesizer {
    pub fn new(uri: impl Into<String>, latency: Duration) -> Self {
        Self {
            uri: uri.into(),
            latency,
        }
    }
}

impl Default for PlaceholderVideoSynthesizer {
    fn default() -> Self {
        Self::new("https://example.com/dummy_video.mp4", Duration::from_secs(1))
    }
}

#[async_trait]
impl VideoSynthesizer for PlaceholderVideoSynthesizer {
    async fn synthesize(&self, script: &str) -> Option<VideoHandle> {
        info!(script, "Synthesizing placeholder video");
        tokio::time::sleep(self.latency).await;
        Some(VideoHandle::placeholder(self.uri.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_feed_replays_comments() {
        let feed = SimulatedAudienceFeed::default();
        let comments = feed.recent_comments(&Persona::new(1, "Caelum")).await.unwrap();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[1], "Boring...");
    }

    #[tokio::test]
    async fn test_placeholder_synthesizer_returns_placeholder_handle() {
        let synth = PlaceholderVideoSynthesizer::new("https://example.com/v.mp4", Duration::from_millis(1));
        let handle = synth.synthesize("a rooftop garden at dawn").await.unwrap();
        assert!(handle.placeholder);
        assert_eq!(handle.uri, "https://example.com/v.mp4");
    }
}
