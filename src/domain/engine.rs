//! Transition execution
//!
//! Drives one attempt of an item through a transition: resolve the offered
//! transition, evaluate its guard into a fresh error collection and record the
//! outcome as a new immutable state. Guard failures are recorded, not raised.

use tracing::{Level, event};

use crate::domain::{
    constant::transition_handler,
    context::Context,
    error::WorkflowError,
    error_collection::ErrorCollection,
    item::Item,
    state::State,
    workflow::Workflow
};

/// Result of one transition attempt
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub state:  State,
    pub errors: ErrorCollection
}

impl TransitionOutcome {
    pub fn is_successful(&self) -> bool {
        self.state.is_successful()
    }
}

/// Executes transitions of one finalized workflow
#[derive(Debug, Clone, Copy)]
pub struct TransitionHandler<'a> {
    workflow: &'a Workflow
}

impl<'a> TransitionHandler<'a> {
    pub fn new(workflow: &'a Workflow) -> Result<Self, WorkflowError> {
        if !workflow.is_finalized() {
            return Err(WorkflowError::NotFinalized(workflow.name().to_string()));
        }
        Ok(Self { workflow })
    }

    pub fn workflow(&self) -> &'a Workflow {
        self.workflow
    }

    /// Compute the state an attempt produces without recording it
    pub fn attempt(&self, item: &Item, transition_name: &str, context: &Context) -> Result<TransitionOutcome, WorkflowError> {
        event!(Level::DEBUG, event = transition_handler::ATTEMPT_STARTED,
               workflow = %self.workflow.name(), entity = %item.entity_id(), transition = %transition_name);

        let transition = match self.workflow.offered_transition(item, transition_name) {
            Ok(transition) => transition,
            Err(e) => {
                event!(Level::WARN, event = transition_handler::ATTEMPT_ABORTED,
                       workflow = %self.workflow.name(), entity = %item.entity_id(),
                       transition = %transition_name, error = %e);
                return Err(e);
            }
        };

        let mut errors = ErrorCollection::new();
        let success = transition.matches(item, context, &mut errors);

        let state = match item.latest_state() {
            None => State::start(item.entity_id().clone(), transition, context, &errors, success),
            Some(previous) => previous.transit(transition, context, &errors, success)
        };

        if success {
            event!(Level::DEBUG, event = transition_handler::ATTEMPT_SUCCEEDED,
                   entity = %item.entity_id(), transition = %transition_name, step = %transition.step_to());
        } else {
            event!(Level::DEBUG, event = transition_handler::ATTEMPT_REJECTED,
                   entity = %item.entity_id(), transition = %transition_name, errors = errors.count_errors());
        }

        Ok(TransitionOutcome { state, errors })
    }

    /// Attempt a transition and record the resulting state on the item
    pub fn transit(
        &self,
        item: &mut Item,
        transition_name: &str,
        context: &Context
    ) -> Result<TransitionOutcome, WorkflowError> {
        let outcome = self.attempt(item, transition_name, context)?;
        record(item, outcome.state.clone())?;
        Ok(outcome)
    }
}

/// Append a state to the item, as first state or as successor
pub fn record(item: &mut Item, state: State) -> Result<(), WorkflowError> {
    if item.latest_state().is_none() { item.start(state) } else { item.transit(state) }
}
