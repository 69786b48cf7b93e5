//! Persona pivot: wholesale replacement of a persona's interests.
//!
//! Triggered by sustained negative sentiment. This is the only path in the
//! agent that writes durable persona state.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::interfaces::{with_deadline, InterestGenerator, PersonaStore, INTEREST_GENERATOR};
use crate::persona::{normalize_interests, Persona};
use crate::utilities::errors::StoreError;

/// Where the committed interest set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotSource {
    Generated,
    Fallback,
}

/// Result of a committed pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotOutcome {
    pub previous: Vec<String>,
    pub interests: Vec<String>,
    pub source: PivotSource,
}

/// Regenerates and commits a persona's interest set.
pub struct PersonaPivotExecutor {
    store: Arc<dyn PersonaStore>,
    generator: Option<Arc<dyn InterestGenerator>>,
    fallback: Vec<String>,
    call_timeout: Option<Duration>,
}

impl PersonaPivotExecutor {
    pub fn new(
        store: Arc<dyn PersonaStore>,
        generator: Option<Arc<dyn InterestGenerator>>,
        fallback: Vec<String>,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            store,
            generator,
            fallback: normalize_interests(fallback),
            call_timeout,
        }
    }

    /// Replace the interests of `persona` and commit them.
    ///
    /// The new set comes from the interest generator, or the fixed fallback
    /// set when the generator is absent, fails, or returns nothing usable.
    /// The commit is a single store call: on error nothing has changed.
    pub async fn execute(&self, persona: &Persona) -> Result<PivotOutcome, StoreError> {
        info!(persona = %persona.id, "Executing persona pivot");

        let (interests, source) = self.next_interests(persona).await;
        let updated = self.store.commit_interests(persona.id, interests).await?;

        info!(
            persona = %persona.id,
            interests = ?updated.interests,
            "Persona pivoted"
        );
        Ok(PivotOutcome {
            previous: persona.interests.clone(),
            interests: updated.interests,
            source,
        })
    }

    async fn next_interests(&self, persona: &Persona) -> (Vec<String>, PivotSource) {
        let Some(generator) = self.generator.as_ref() else {
            return (self.fallback.clone(), PivotSource::Fallback);
        };

        match with_deadline(INTEREST_GENERATOR, self.call_timeout, generator.regenerate(persona)).await {
            Ok(generated) => {
                let generated = normalize_interests(generated);
                if generated.is_empty() {
                    warn!(persona = %persona.id, "Interest generator returned nothing, using fallback set");
                    (self.fallback.clone(), PivotSource::Fallback)
                } else {
                    (generated, PivotSource::Generated)
                }
            }
            Err(e) => {
                warn!(error = %e, persona = %persona.id, "Interest regeneration failed, using fallback set");
                (self.fallback.clone(), PivotSource::Fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::InMemoryPersonaStore;
    use crate::persona::PersonaId;
    use crate::utilities::config::FALLBACK_INTERESTS;
    use crate::utilities::errors::CollaboratorError;
    use async_trait::async_trait;

    struct FixedGenerator(Result<Vec<String>, CollaboratorError>);

    #[async_trait]
    impl InterestGenerator for FixedGenerator {
        async fn regenerate(&self, _persona: &Persona) -> Result<Vec<String>, CollaboratorError> {
            self.0.clone()
        }
    }

    fn fallback() -> Vec<String> {
        FALLBACK_INTERESTS.iter().map(|s| s.to_string()).collect()
    }

    fn seeded_store() -> (Arc<InMemoryPersonaStore>, Persona) {
        let persona = Persona::new(1, "Caelum").with_interests(["Fast Fashion", "Crypto"]);
        let store = Arc::new(InMemoryPersonaStore::with_personas([persona.clone()]));
        (store, persona)
    }

    #[tokio::test]
    async fn test_generated_interests_replace_wholesale() {
        let (store, persona) = seeded_store();
        let generator = Arc::new(FixedGenerator(Ok(vec![
            "Mycelial Networks".to_string(),
            "Repair Cafes".to_string(),
        ])));
        let executor = PersonaPivotExecutor::new(store.clone(), Some(generator), fallback(), None);

        let outcome = executor.execute(&persona).await.unwrap();
        assert_eq!(outcome.source, PivotSource::Generated);
        assert_eq!(outcome.previous, vec!["Fast Fashion", "Crypto"]);

        let stored = store.get(PersonaId(1)).await.unwrap().unwrap();
        assert_eq!(stored.interests, vec!["Mycelial Networks", "Repair Cafes"]);
    }

    #[tokio::test]
    async fn test_missing_generator_applies_fallback() {
        let (store, persona) = seeded_store();
        let executor = PersonaPivotExecutor::new(store.clone(), None, fallback(), None);

        let outcome = executor.execute(&persona).await.unwrap();
        assert_eq!(outcome.source, PivotSource::Fallback);
        let stored = store.get(PersonaId(1)).await.unwrap().unwrap();
        assert_eq!(stored.interests, fallback());
    }

    #[tokio::test]
    async fn test_failing_or_empty_generator_applies_fallback() {
        for result in [
            Err(CollaboratorError::call_failed(INTEREST_GENERATOR, "boom")),
            Ok(vec!["   ".to_string()]),
        ] {
            let (store, persona) = seeded_store();
            let executor =
                PersonaPivotExecutor::new(store.clone(), Some(Arc::new(FixedGenerator(result))), fallback(), None);
            let outcome = executor.execute(&persona).await.unwrap();
            assert_eq!(outcome.source, PivotSource::Fallback);
            assert_eq!(outcome.interests, fallback());
        }
    }

    #[tokio::test]
    async fn test_commit_to_missing_persona_changes_nothing() {
        let (store, _) = seeded_store();
        let ghost = Persona::new(99, "Ghost");
        let executor = PersonaPivotExecutor::new(store.clone(), None, fallback(), None);

        let err = executor.execute(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: PersonaId(99) }));
        let stored = store.get(PersonaId(1)).await.unwrap().unwrap();
        assert_eq!(stored.interests, vec!["Fast Fashion", "Crypto"]);
    }
}
