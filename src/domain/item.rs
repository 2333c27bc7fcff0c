//! Runtime wrapper binding an entity to its identity and state history

use serde_json::Value;

use crate::domain::{entity::EntityId, error::WorkflowError, state::State};

/// An entity taking part in a workflow.
///
/// The engine reads the latest state to find the current step and appends the
/// state of every attempt. Storing the history is left to a
/// [`StateRepository`](crate::port::storage::StateRepository).
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    entity_id:     EntityId,
    entity:        Value,
    state_history: Vec<State>
}

impl Item {
    /// Wrap an entity that has never taken part in a workflow
    pub fn initialize(entity_id: EntityId, entity: Value) -> Self {
        Self { entity_id, entity, state_history: Vec::new() }
    }

    /// Wrap an entity together with its stored history.
    ///
    /// The history is ordered by the time each state was reached; states
    /// reached at the same instant keep the order they were passed in.
    pub fn reconstitute(entity_id: EntityId, entity: Value, mut state_history: Vec<State>) -> Self {
        state_history.sort_by_key(State::reached_at);
        Self { entity_id, entity, state_history }
    }

    /// Record the first state of the item
    pub fn start(&mut self, state: State) -> Result<(), WorkflowError> {
        if self.is_workflow_started() {
            return Err(WorkflowError::Generic(format!("item \"{}\" has already been started", self.entity_id)));
        }
        self.record(state)
    }

    /// Record a successor state; the latest state pointer always moves
    pub fn transit(&mut self, state: State) -> Result<(), WorkflowError> {
        if self.state_history.is_empty() {
            return Err(WorkflowError::Generic(format!("item \"{}\" has no state to transit from", self.entity_id)));
        }
        self.record(state)
    }

    fn record(&mut self, state: State) -> Result<(), WorkflowError> {
        if state.entity_id() != &self.entity_id {
            return Err(WorkflowError::Generic(format!(
                "state of \"{}\" can not be recorded on item \"{}\"",
                state.entity_id(),
                self.entity_id
            )));
        }
        self.state_history.push(state);
        Ok(())
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn entity(&self) -> &Value {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Value {
        &mut self.entity
    }

    /// Read a top level property of the wrapped entity
    pub fn entity_property(&self, name: &str) -> Option<&Value> {
        self.entity.get(name)
    }

    pub fn latest_state(&self) -> Option<&State> {
        self.state_history.last()
    }

    pub fn latest_successful_state(&self) -> Option<&State> {
        self.state_history.iter().rev().find(|state| state.is_successful())
    }

    pub fn state_history(&self) -> &[State] {
        &self.state_history
    }

    /// Workflow the item is in, if it has any history
    pub fn workflow_name(&self) -> Option<&str> {
        self.latest_state().map(State::workflow_name)
    }

    pub fn current_step_name(&self) -> Option<&str> {
        self.latest_state().and_then(State::step_name)
    }

    /// An item is started once any attempt has reached a step
    pub fn is_workflow_started(&self) -> bool {
        self.current_step_name().is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::{Map, json};

    use super::*;

    fn state(entity_id: &EntityId, transition: &str, step: Option<&str>, offset: i64) -> State {
        State::new(
            entity_id.clone(),
            "review",
            transition,
            step.map(str::to_string),
            step.is_some(),
            Map::new(),
            Utc::now() + Duration::seconds(offset),
            vec![]
        )
    }

    #[test]
    fn test_unstarted_item() {
        let item = Item::initialize(EntityId::new("docs", 1), json!({"title": "Hello"}));

        assert!(!item.is_workflow_started());
        assert_eq!(item.current_step_name(), None);
        assert_eq!(item.workflow_name(), None);
        assert_eq!(item.entity_property("title"), Some(&json!("Hello")));
    }

    #[test]
    fn test_reconstitute_orders_by_reached_at() {
        let id = EntityId::new("docs", 1);
        let history = vec![state(&id, "approve", Some("published"), 10), state(&id, "submit", Some("pending"), 0)];

        let item = Item::reconstitute(id, json!({}), history);

        assert_eq!(item.state_history()[0].transition_name(), "submit");
        assert_eq!(item.current_step_name(), Some("published"));
    }

    #[test]
    fn test_failed_attempt_moves_pointer_not_position() {
        let id = EntityId::new("docs", 1);
        let mut item = Item::initialize(id.clone(), json!({}));

        item.start(state(&id, "submit", Some("pending"), 0)).unwrap();
        let failed = item.latest_state().unwrap().clone();
        let failed = State::new(
            id.clone(),
            "review",
            "approve",
            failed.step_name().map(str::to_string),
            false,
            Map::new(),
            Utc::now(),
            vec![]
        );
        item.transit(failed).unwrap();

        assert_eq!(item.latest_state().unwrap().transition_name(), "approve");
        assert_eq!(item.latest_successful_state().unwrap().transition_name(), "submit");
        assert_eq!(item.current_step_name(), Some("pending"));
    }

    #[test]
    fn test_rejects_foreign_states() {
        let mut item = Item::initialize(EntityId::new("docs", 1), json!({}));
        let other = EntityId::new("docs", 2);

        assert!(item.start(state(&other, "submit", Some("pending"), 0)).is_err());
        assert!(item.transit(state(&EntityId::new("docs", 1), "submit", Some("pending"), 0)).is_err());
    }
}
