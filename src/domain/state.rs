//! Immutable record of one transition attempt
//!
//! Every attempt, successful or not, yields exactly one state. The first one of
//! an entity is created with [`State::start`], every following one with
//! [`State::transit`] from its predecessor. States are never changed afterwards;
//! the history they form is owned by the persistence collaborator.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{
    context::Context,
    entity::EntityId,
    error_collection::{ErrorCollection, ErrorEntry},
    transition::Transition
};

/// Identity assigned to a state once it has been persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(Uuid);

impl StateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StateId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    state_id:        Option<StateId>,
    entity_id:       EntityId,
    workflow_name:   String,
    transition_name: String,
    /// Step reached; `None` only when the very first attempt of an entity failed
    step_name:       Option<String>,
    successful:      bool,
    data:            Map<String, Value>,
    reached_at:      DateTime<Utc>,
    #[serde(default)]
    errors:          Vec<ErrorEntry>
}

impl State {
    /// Restore a state from its stored parts
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity_id: EntityId,
        workflow_name: impl Into<String>,
        transition_name: impl Into<String>,
        step_name: Option<String>,
        successful: bool,
        data: Map<String, Value>,
        reached_at: DateTime<Utc>,
        errors: Vec<ErrorEntry>
    ) -> Self {
        Self {
            state_id: None,
            entity_id,
            workflow_name: workflow_name.into(),
            transition_name: transition_name.into(),
            step_name,
            successful,
            data,
            reached_at,
            errors
        }
    }

    /// Create the initial state of an entity.
    ///
    /// A successful start reaches the transition's target step. A failed start
    /// reaches no step at all, the entity stays outside the workflow.
    pub fn start(
        entity_id: EntityId,
        transition: &Transition,
        context: &Context,
        errors: &ErrorCollection,
        success: bool
    ) -> Self {
        Self::new(
            entity_id,
            transition.workflow_name(),
            transition.name(),
            success.then(|| transition.step_to().to_string()),
            success,
            context.properties().clone(),
            Utc::now(),
            errors.errors().to_vec()
        )
    }

    /// Derive the successor state. On failure the step does not change.
    pub fn transit(&self, transition: &Transition, context: &Context, errors: &ErrorCollection, success: bool) -> Self {
        let step_name = if success { Some(transition.step_to().to_string()) } else { self.step_name.clone() };

        Self::new(
            self.entity_id.clone(),
            self.workflow_name.clone(),
            transition.name(),
            step_name,
            success,
            context.properties().clone(),
            Utc::now(),
            errors.errors().to_vec()
        )
    }

    /// Copy of this state carrying the identity the persistence layer assigned
    pub fn with_state_id(&self, state_id: StateId) -> Self {
        Self { state_id: Some(state_id), ..self.clone() }
    }

    pub fn state_id(&self) -> Option<StateId> {
        self.state_id
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn transition_name(&self) -> &str {
        &self.transition_name
    }

    pub fn step_name(&self) -> Option<&str> {
        self.step_name.as_deref()
    }

    pub fn is_successful(&self) -> bool {
        self.successful
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn reached_at(&self) -> DateTime<Utc> {
        self.reached_at
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Errors in the `[message_key, params, nested]` export form
    pub fn errors_array(&self) -> Value {
        self.errors.iter().cloned().collect::<ErrorCollection>().to_array()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn transition(name: &str, step_to: &str) -> Transition {
        let mut transition = Transition::new(name, step_to);
        transition.bind_to("review");
        transition
    }

    #[test]
    fn test_start_records_target_and_context() {
        let mut context = Context::new();
        context.set_property("comment", "first draft");

        let state =
            State::start(EntityId::new("docs", 1), &transition("submit", "pending"), &context, &ErrorCollection::new(), true);

        assert_eq!(state.workflow_name(), "review");
        assert_eq!(state.transition_name(), "submit");
        assert_eq!(state.step_name(), Some("pending"));
        assert_eq!(state.data().get("comment"), Some(&json!("first draft")));
        assert!(state.errors().is_empty());
        assert!(state.state_id().is_none());
    }

    #[test]
    fn test_failed_start_reaches_no_step() {
        let mut errors = ErrorCollection::new();
        errors.add_error("denied", vec![], None);

        let state = State::start(EntityId::new("docs", 1), &transition("submit", "pending"), &Context::new(), &errors, false);

        assert_eq!(state.step_name(), None);
        assert!(!state.is_successful());
        assert_eq!(state.errors_array(), json!([["denied", [], null]]));
    }

    #[test]
    fn test_transit_moves_only_on_success() {
        let context = Context::new();
        let errors = ErrorCollection::new();
        let start = State::start(EntityId::new("docs", 1), &transition("submit", "pending"), &context, &errors, true);
        let approve = transition("approve", "published");

        let moved = start.transit(&approve, &context, &errors, true);
        let stayed = start.transit(&approve, &context, &errors, false);

        assert_eq!(moved.step_name(), Some("published"));
        assert_eq!(stayed.step_name(), Some("pending"));
        assert_eq!(stayed.transition_name(), "approve");
        assert_eq!(stayed.entity_id(), start.entity_id());
        assert!(moved.reached_at() >= start.reached_at());
    }

    #[test]
    fn test_with_state_id_leaves_original_untouched() {
        let start = State::start(
            EntityId::new("docs", 1),
            &transition("submit", "pending"),
            &Context::new(),
            &ErrorCollection::new(),
            true
        );
        let id = StateId::new();
        let stored = start.with_state_id(id);

        assert_eq!(stored.state_id(), Some(id));
        assert!(start.state_id().is_none());
    }

    #[test]
    fn test_serde_round_trip_keeps_entity_key_form() {
        let state =
            State::start(EntityId::new("docs", 7), &transition("submit", "pending"), &Context::new(), &ErrorCollection::new(), true);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["entity_id"], json!("docs::7"));
        assert_eq!(serde_json::from_value::<State>(json).unwrap(), state);
    }
}
