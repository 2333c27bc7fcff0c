//! WorkflowManager - drives user initiated transitions against stored items
//!
//! Holds the finalized workflows by name and a state repository. A registered
//! workflow serves every user: the acting identity travels in the
//! [`Context`] of each attempt. Attempts against the same entity are
//! serialized with a per-entity lock so history entries are neither lost nor
//! duplicated; attempts against different entities run independently. A lock
//! lives only while some attempt on its entity holds or awaits it.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, MutexGuard}
};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{Level, event};

use crate::{
    domain::{
        constant::workflow_manager,
        context::Context,
        engine::{self, TransitionHandler, TransitionOutcome},
        entity::EntityId,
        error::{NameKind, WorkflowError},
        item::Item,
        workflow::Workflow
    },
    port::storage::StateRepository
};

pub struct WorkflowManager {
    workflows:  HashMap<String, Arc<Workflow>>,
    repository: Arc<dyn StateRepository>,
    locks:      StdMutex<HashMap<EntityId, Arc<Mutex<()>>>>
}

impl WorkflowManager {
    pub fn new(repository: Arc<dyn StateRepository>) -> Self {
        Self { workflows: HashMap::new(), repository, locks: StdMutex::new(HashMap::new()) }
    }

    /// Register a finalized workflow
    pub fn register_workflow(&mut self, workflow: Workflow) -> Result<Arc<Workflow>, WorkflowError> {
        if !workflow.is_finalized() {
            return Err(WorkflowError::NotFinalized(workflow.name().to_string()));
        }
        if self.workflows.contains_key(workflow.name()) {
            return Err(WorkflowError::DuplicateName { kind: NameKind::Workflow, name: workflow.name().to_string() });
        }

        event!(Level::DEBUG, event = workflow_manager::WORKFLOW_REGISTERED, workflow = %workflow.name());
        let workflow = Arc::new(workflow);
        self.workflows.insert(workflow.name().to_string(), workflow.clone());
        Ok(workflow)
    }

    pub fn get_workflow(&self, name: &str) -> Result<Arc<Workflow>, WorkflowError> {
        self.workflows.get(name).cloned().ok_or_else(|| WorkflowError::workflow_not_found(name))
    }

    pub fn workflow_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.workflows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn repository(&self) -> Arc<dyn StateRepository> {
        self.repository.clone()
    }

    /// Wrap an entity together with its stored history
    pub async fn open_item(&self, entity_id: EntityId, entity: Value) -> Result<Item, WorkflowError> {
        let history = self.repository.history(&entity_id).await?;

        event!(Level::DEBUG, event = workflow_manager::ITEM_OPENED, entity = %entity_id, states = history.len());
        Ok(Item::reconstitute(entity_id, entity, history))
    }

    /// Names of the transitions currently available to the item
    pub fn available_transitions(
        &self,
        workflow_name: &str,
        item: &Item,
        context: &Context
    ) -> Result<Vec<String>, WorkflowError> {
        let workflow = self.get_workflow(workflow_name)?;
        let available = workflow.available_transitions(item, context)?;
        Ok(available.into_iter().map(|transition| transition.name().to_string()).collect())
    }

    fn lock_table(&self) -> Result<MutexGuard<'_, HashMap<EntityId, Arc<Mutex<()>>>>, WorkflowError> {
        self.locks.lock().map_err(|e| WorkflowError::Generic(format!("lock table poisoned: {}", e)))
    }

    fn entity_lock(&self, entity_id: &EntityId) -> Result<Arc<Mutex<()>>, WorkflowError> {
        Ok(self.lock_table()?.entry(entity_id.clone()).or_default().clone())
    }

    /// Forget the entity's lock once no other attempt holds a handle to it
    fn release_entity_lock(&self, entity_id: &EntityId, lock: Arc<Mutex<()>>) -> Result<(), WorkflowError> {
        let mut locks = self.lock_table()?;
        // Handles are only cloned under the table lock: the table's and ours.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(entity_id);
        }
        Ok(())
    }

    /// Number of entities with a live lock
    pub fn tracked_entities(&self) -> Result<usize, WorkflowError> {
        Ok(self.lock_table()?.len())
    }

    /// Attempt a transition, persist the resulting state and record it on the item.
    ///
    /// The stored history is authoritative: if another attempt has appended
    /// to it since the item was opened, the item is refreshed first.
    pub async fn handle(
        &self,
        workflow_name: &str,
        item: &mut Item,
        transition_name: &str,
        context: &Context
    ) -> Result<TransitionOutcome, WorkflowError> {
        let workflow = self.get_workflow(workflow_name)?;
        let handler = TransitionHandler::new(&workflow)?;
        let entity_id = item.entity_id().clone();

        let lock = self.entity_lock(&entity_id)?;
        let outcome = {
            let _guard = lock.lock().await;
            self.attempt_and_store(handler, item, transition_name, context).await
        };
        self.release_entity_lock(&entity_id, lock)?;

        if let Ok(stored) = &outcome {
            event!(Level::DEBUG, event = workflow_manager::STATE_APPENDED,
                   workflow = %workflow_name, entity = %entity_id, transition = %transition_name,
                   successful = stored.is_successful());
        }
        outcome
    }

    async fn attempt_and_store(
        &self,
        handler: TransitionHandler<'_>,
        item: &mut Item,
        transition_name: &str,
        context: &Context
    ) -> Result<TransitionOutcome, WorkflowError> {
        let stored = self.repository.history(item.entity_id()).await?;
        if stored.len() != item.state_history().len() {
            *item = Item::reconstitute(item.entity_id().clone(), item.entity().clone(), stored);
        }

        let outcome = handler.attempt(item, transition_name, context)?;
        let persisted = self.repository.append(outcome.state.clone()).await?;
        engine::record(item, persisted.clone())?;

        Ok(TransitionOutcome { state: persisted, errors: outcome.errors })
    }
}
