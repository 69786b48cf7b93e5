//! In-process persona store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::interfaces::PersonaStore;
use crate::persona::{normalize_interests, Persona, PersonaId};
use crate::utilities::errors::StoreError;

/// Persona records kept in memory, ordered by id.
///
/// The default persona is the one with the lowest id. Interest commits take
/// the write lock once, so a commit is all-or-nothing; concurrent writers
/// resolve last-writer-wins.
#[derive(Debug, Default)]
pub struct InMemoryPersonaStore {
    personas: RwLock<BTreeMap<PersonaId, Persona>>,
}

impl InMemoryPersonaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_personas(personas: impl IntoIterator<Item = Persona>) -> Self {
        let store = Self::new();
        for persona in personas {
            store.upsert(persona);
        }
        store
    }

    /// Insert or replace a record, returning the previous one.
    pub fn upsert(&self, persona: Persona) -> Option<Persona> {
        self.personas.write().insert(persona.id, persona)
    }

    pub fn remove(&self, id: PersonaId) -> Option<Persona> {
        self.personas.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.personas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.read().is_empty()
    }
}

#[async_trait]
impl PersonaStore for InMemoryPersonaStore {
    async fn get(&self, id: PersonaId) -> Result<Option<Persona>, StoreError> {
        Ok(self.personas.read().get(&id).cloned())
    }

    async fn get_default(&self) -> Result<Option<Persona>, StoreError> {
        Ok(self.personas.read().values().next().cloned())
    }

    async fn commit_interests(&self, id: PersonaId, interests: Vec<String>) -> Result<Persona, StoreError> {
        let mut personas = self.personas.write();
        let persona = personas.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        persona.interests = normalize_interests(interests);
        Ok(persona.clone())
    }
}
