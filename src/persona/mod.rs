//! Persona records: the influencer identities the agent acts on.
//!
//! A [`Persona`] is owned by the external [`PersonaStore`](crate::interfaces::PersonaStore);
//! the controller only ever holds a transient copy per tick. The single path
//! that mutates durable persona state is [`pivot::PersonaPivotExecutor`].

pub mod pivot;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use pivot::{PersonaPivotExecutor, PivotOutcome, PivotSource};

/// Identifier of a persona record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaId(pub i64);

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PersonaId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A virtual influencer as seen by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub name: String,
    /// Voice of the persona; also the "style vibe" checked by verification.
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub life_story: Option<String>,
    /// Audience-targeting interests; rewritten wholesale by a pivot.
    #[serde(default)]
    pub interests: Vec<String>,
}

impl Persona {
    pub fn new(id: impl Into<PersonaId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tone: None,
            goals: Vec::new(),
            background: None,
            life_story: None,
            interests: Vec::new(),
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals = goals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = normalize_interests(interests);
        self
    }

    /// Tone used in scoring prompts.
    pub fn tone_or_default(&self) -> &str {
        self.tone.as_deref().unwrap_or("Modern")
    }

    /// Vibe handed to content verification.
    pub fn style_vibe(&self) -> &str {
        self.tone.as_deref().unwrap_or("neutral")
    }
}

/// Trim, drop blanks and de-duplicate (case-insensitively) while keeping order.
pub fn normalize_interests<I, S>(interests: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = std::collections::HashSet::new();
    interests
        .into_iter()
        .map(Into::into)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_fields() {
        let p = Persona::new(1, "Caelum")
            .with_tone("Optimistic solarpunk")
            .with_goals(["Grow audience", "Promote repair culture"])
            .with_interests(["Vertical Farming"]);
        assert_eq!(p.id, PersonaId(1));
        assert_eq!(p.tone_or_default(), "Optimistic solarpunk");
        assert_eq!(p.goals.len(), 2);
        assert_eq!(p.interests, vec!["Vertical Farming"]);
    }

    #[test]
    fn test_tone_defaults() {
        let p = Persona::new(2, "Nameless");
        assert_eq!(p.tone_or_default(), "Modern");
        assert_eq!(p.style_vibe(), "neutral");
    }

    #[test]
    fn test_normalize_interests_dedupes_and_trims() {
        let interests = normalize_interests(["  Mesh Networks ", "", "mesh networks", "Seed Bombs"]);
        assert_eq!(interests, vec!["Mesh Networks", "Seed Bombs"]);
    }

    #[test]
    fn test_persona_deserializes_with_missing_optionals() {
        let p: Persona = serde_json::from_str(r#"{"id": 4, "name": "Ivy"}"#).unwrap();
        assert_eq!(p.id, PersonaId(4));
        assert!(p.interests.is_empty());
        assert!(p.tone.is_none());
    }
}
