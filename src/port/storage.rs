use async_trait::async_trait;

use crate::domain::{entity::EntityId, error::WorkflowError, state::State};

/// Port owning the append-only state history of every entity
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Append a state to its entity's history, returning it with a persisted identity
    async fn append(&self, state: State) -> Result<State, WorkflowError>;

    /// Full history of an entity, oldest first
    async fn history(&self, entity_id: &EntityId) -> Result<Vec<State>, WorkflowError>;

    /// Most recent state of an entity
    async fn latest(&self, entity_id: &EntityId) -> Result<Option<State>, WorkflowError> {
        Ok(self.history(entity_id).await?.pop())
    }

    /// Every entity with at least one recorded state
    async fn entity_ids(&self) -> Result<Vec<EntityId>, WorkflowError>;
}
