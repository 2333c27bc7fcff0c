//! In-memory state history storage
//!
//! Suitable for development and testing; histories are lost when the process
//! ends.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{Level, event};

use crate::{
    domain::{
        constant::state_repository,
        entity::EntityId,
        error::WorkflowError,
        state::{State, StateId}
    },
    port::storage::StateRepository
};

/// State histories stored per entity id, in append order
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateRepository {
    histories: Arc<RwLock<HashMap<EntityId, Vec<State>>>>
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self { histories: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Drop every stored history
    pub async fn purge(&self) {
        self.histories.write().await.clear();
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn append(&self, state: State) -> Result<State, WorkflowError> {
        let stored = match state.state_id() {
            Some(_) => state,
            None => state.with_state_id(StateId::new())
        };

        let mut histories = self.histories.write().await;
        let history = histories.entry(stored.entity_id().clone()).or_insert_with(Vec::new);

        if let Some(id) = stored.state_id()
            && history.iter().any(|existing| existing.state_id() == Some(id))
        {
            return Err(WorkflowError::Storage(format!("state \"{}\" is already stored", id)));
        }

        history.push(stored.clone());
        event!(Level::DEBUG, event = state_repository::STATE_STORED,
               entity = %stored.entity_id(), length = history.len());
        Ok(stored)
    }

    async fn history(&self, entity_id: &EntityId) -> Result<Vec<State>, WorkflowError> {
        let histories = self.histories.read().await;
        let history = histories.get(entity_id).cloned().unwrap_or_default();

        event!(Level::TRACE, event = state_repository::HISTORY_RETRIEVED, entity = %entity_id, length = history.len());
        Ok(history)
    }

    async fn latest(&self, entity_id: &EntityId) -> Result<Option<State>, WorkflowError> {
        let histories = self.histories.read().await;
        Ok(histories.get(entity_id).and_then(|history| history.last().cloned()))
    }

    async fn entity_ids(&self) -> Result<Vec<EntityId>, WorkflowError> {
        let histories = self.histories.read().await;
        let mut ids: Vec<EntityId> = histories.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::Map;

    use super::*;

    fn state(entity_id: &EntityId, transition: &str) -> State {
        State::new(entity_id.clone(), "review", transition, Some("pending".to_string()), true, Map::new(), Utc::now(), vec![])
    }

    #[tokio::test]
    async fn test_append_assigns_identity_and_keeps_order() {
        let repository = InMemoryStateRepository::new();
        let id = EntityId::new("docs", 1);

        let first = repository.append(state(&id, "submit")).await.unwrap();
        repository.append(state(&id, "revise")).await.unwrap();

        assert!(first.state_id().is_some());
        let history = repository.history(&id).await.unwrap();
        let transitions: Vec<&str> = history.iter().map(State::transition_name).collect();
        assert_eq!(transitions, vec!["submit", "revise"]);
        assert_eq!(repository.latest(&id).await.unwrap().unwrap().transition_name(), "revise");
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_refused() {
        let repository = InMemoryStateRepository::new();
        let stored = repository.append(state(&EntityId::new("docs", 1), "submit")).await.unwrap();

        assert!(matches!(repository.append(stored).await, Err(WorkflowError::Storage(_))));
    }

    #[tokio::test]
    async fn test_unknown_entity_and_purge() {
        let repository = InMemoryStateRepository::new();
        let id = EntityId::new("docs", 1);

        assert!(repository.history(&id).await.unwrap().is_empty());
        assert!(repository.latest(&id).await.unwrap().is_none());

        repository.append(state(&id, "submit")).await.unwrap();
        assert_eq!(repository.entity_ids().await.unwrap(), vec![id.clone()]);

        repository.purge().await;
        assert!(repository.entity_ids().await.unwrap().is_empty());
    }
}
