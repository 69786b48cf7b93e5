//! Runtime configuration for the agent loop.
//!
//! Defaults reproduce the demo cadence (one tick every 10 seconds). Every
//! knob the binary exposes can be overridden from the environment through
//! [`AgentConfig::from_env`].

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utilities::errors::ConfigError;

/// Topic evaluated when no trend was injected.
pub const DEFAULT_TOPIC: &str = "AI Agents in 2026";

/// Upper bound on retained interactions; the history is allocated up front.
pub const MAX_MEMORY_CAPACITY: usize = 10_000;

/// Upper bound on retained activity-log lines.
pub const MAX_ACTIVITY_LOG_CAPACITY: usize = 1_000;

/// Interest set applied when the interest generator cannot be used.
pub const FALLBACK_INTERESTS: [&str; 3] =
    ["Hydro-Politics", "Urban Rewilding", "Decentralized Energy"];

/// Tunables for [`AgentController`](crate::agent::AgentController) and the
/// components it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Pause between the end of one tick and the start of the next.
    pub tick_interval: Duration,
    /// Capacity of both sentiment-memory histories.
    pub memory_capacity: usize,
    /// Number of recent scores averaged by the pivot check.
    pub sentiment_window: usize,
    /// Average sentiment strictly below this triggers a pivot.
    pub pivot_sentiment_threshold: f64,
    /// Consecutive bored/negative readings that trigger a pivot.
    pub bad_mood_limit: u32,
    /// Minimum ROI score for the high-cost (video) path.
    pub video_score_threshold: f64,
    /// Entries kept in the recent-activity log.
    pub activity_log_capacity: usize,
    /// Topic used when the trend mailbox is empty and no trend source answers.
    pub default_topic: String,
    /// Interest set applied when regeneration is unavailable or fails.
    pub fallback_interests: Vec<String>,
    /// Optional deadline applied to every collaborator call.
    pub collaborator_timeout: Option<Duration>,
    /// Sentiment recorded for a published text post.
    pub text_post_sentiment: f64,
    /// Sentiment recorded for a verified video post.
    pub video_post_sentiment: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            memory_capacity: 50,
            sentiment_window: 10,
            pivot_sentiment_threshold: -0.2,
            bad_mood_limit: 3,
            video_score_threshold: 8.0,
            activity_log_capacity: 5,
            default_topic: DEFAULT_TOPIC.to_string(),
            fallback_interests: FALLBACK_INTERESTS.iter().map(|s| s.to_string()).collect(),
            collaborator_timeout: None,
            text_post_sentiment: 0.1,
            video_post_sentiment: 0.5,
        }
    }
}

impl AgentConfig {
    /// Build a configuration from defaults plus environment overrides.
    ///
    /// Recognised variables: `AGENT_TICK_SECS`, `AGENT_MEMORY_CAPACITY`,
    /// `AGENT_PIVOT_THRESHOLD`, `AGENT_BAD_MOOD_LIMIT`, `AGENT_VIDEO_THRESHOLD`,
    /// `AGENT_DEFAULT_TOPIC` and `AGENT_COLLABORATOR_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<f64, _>(&lookup, "AGENT_TICK_SECS")? {
            config.tick_interval = seconds("AGENT_TICK_SECS", secs)?;
        }
        if let Some(capacity) = parse_var(&lookup, "AGENT_MEMORY_CAPACITY")? {
            config.memory_capacity = capacity;
        }
        if let Some(threshold) = parse_var(&lookup, "AGENT_PIVOT_THRESHOLD")? {
            config.pivot_sentiment_threshold = threshold;
        }
        if let Some(limit) = parse_var(&lookup, "AGENT_BAD_MOOD_LIMIT")? {
            config.bad_mood_limit = limit;
        }
        if let Some(threshold) = parse_var(&lookup, "AGENT_VIDEO_THRESHOLD")? {
            config.video_score_threshold = threshold;
        }
        if let Some(topic) = lookup("AGENT_DEFAULT_TOPIC") {
            if !topic.trim().is_empty() {
                config.default_topic = topic.trim().to_string();
            }
        }
        if let Some(secs) = parse_var::<f64, _>(&lookup, "AGENT_COLLABORATOR_TIMEOUT_SECS")? {
            config.collaborator_timeout = Some(seconds("AGENT_COLLABORATOR_TIMEOUT_SECS", secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(invalid("tick_interval", "0s", "must be positive"));
        }
        if self.memory_capacity == 0 {
            return Err(invalid("memory_capacity", "0", "must be positive"));
        }
        if self.memory_capacity > MAX_MEMORY_CAPACITY {
            return Err(invalid(
                "memory_capacity",
                &self.memory_capacity.to_string(),
                &format!("must be at most {}", MAX_MEMORY_CAPACITY),
            ));
        }
        if self.bad_mood_limit == 0 {
            return Err(invalid("bad_mood_limit", "0", "must be positive"));
        }
        if self.sentiment_window == 0 {
            return Err(invalid("sentiment_window", "0", "must be positive"));
        }
        if self.activity_log_capacity == 0 {
            return Err(invalid("activity_log_capacity", "0", "must be positive"));
        }
        if self.activity_log_capacity > MAX_ACTIVITY_LOG_CAPACITY {
            return Err(invalid(
                "activity_log_capacity",
                &self.activity_log_capacity.to_string(),
                &format!("must be at most {}", MAX_ACTIVITY_LOG_CAPACITY),
            ));
        }
        if !self.pivot_sentiment_threshold.is_finite() {
            return Err(invalid(
                "pivot_sentiment_threshold",
                &self.pivot_sentiment_threshold.to_string(),
                "must be finite",
            ));
        }
        if !self.video_score_threshold.is_finite() {
            return Err(invalid(
                "video_score_threshold",
                &self.video_score_threshold.to_string(),
                "must be finite",
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(key, &raw, &e.to_string())),
    }
}

fn seconds(key: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(key, &secs.to_string(), &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_demo_cadence() {
        let config = AgentConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(10));
        assert_eq!(config.memory_capacity, 50);
        assert_eq!(config.sentiment_window, 10);
        assert_eq!(config.bad_mood_limit, 3);
        assert_eq!(config.video_score_threshold, 8.0);
        assert_eq!(config.activity_log_capacity, 5);
        assert_eq!(config.default_topic, DEFAULT_TOPIC);
        assert!(config.collaborator_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_are_applied() {
        let config = AgentConfig::from_lookup(lookup_from(&[
            ("AGENT_TICK_SECS", "2.5"),
            ("AGENT_BAD_MOOD_LIMIT", "5"),
            ("AGENT_DEFAULT_TOPIC", "  Solar Sails  "),
            ("AGENT_COLLABORATOR_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(2500));
        assert_eq!(config.bad_mood_limit, 5);
        assert_eq!(config.default_topic, "Solar Sails");
        assert_eq!(config.collaborator_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unparseable_value_is_rejected() {
        let err = AgentConfig::from_lookup(lookup_from(&[("AGENT_MEMORY_CAPACITY", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "AGENT_MEMORY_CAPACITY", .. }
        ));
    }

    #[test]
    fn test_degenerate_limits_fail_validation() {
        let zero_limit = AgentConfig {
            bad_mood_limit: 0,
            ..AgentConfig::default()
        };
        assert!(zero_limit.validate().unwrap_err().to_string().contains("bad_mood_limit"));

        let huge_memory = AgentConfig {
            memory_capacity: MAX_MEMORY_CAPACITY + 1,
            ..AgentConfig::default()
        };
        assert!(huge_memory.validate().unwrap_err().to_string().contains("memory_capacity"));

        let at_bound = AgentConfig {
            memory_capacity: MAX_MEMORY_CAPACITY,
            activity_log_capacity: MAX_ACTIVITY_LOG_CAPACITY,
            ..AgentConfig::default()
        };
        assert!(at_bound.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let err = AgentConfig::from_lookup(lookup_from(&[("AGENT_TICK_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("tick_interval"));
    }
}
