//! Workflow graph
//!
//! A workflow is a named, ordered collection of steps and transitions. Nodes
//! and edges may be registered in any order; references between them are
//! checked once by [`Workflow::finalize`]. Only a finalized workflow answers
//! questions about items, and after finalization the graph is frozen.

use std::fmt::{self, Display};

use serde_json::{Map, Value};
use tracing::{Level, event};

use crate::domain::{
    constant::workflow as events,
    context::Context,
    error::{NameKind, WorkflowError},
    error_collection::ErrorCollection,
    item::Item,
    security::Role,
    step::Step,
    transition::Transition
};

#[derive(Debug, Clone)]
pub struct Workflow {
    name:             String,
    label:            Option<String>,
    steps:            Vec<Step>,
    transitions:      Vec<Transition>,
    roles:            Vec<Role>,
    start_transition: Option<String>,
    config:           Map<String, Value>,
    finalized:        bool
}

impl Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:             name.into(),
            label:            None,
            steps:            Vec::new(),
            transitions:      Vec::new(),
            roles:            Vec::new(),
            start_transition: None,
            config:           Map::new(),
            finalized:        false
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.finalized {
            return Err(WorkflowError::AlreadyFinalized(self.name.clone()));
        }
        Ok(())
    }

    fn ensure_finalized(&self) -> Result<(), WorkflowError> {
        if !self.finalized {
            return Err(WorkflowError::NotFinalized(self.name.clone()));
        }
        Ok(())
    }

    pub fn add_step(&mut self, step: Step) -> Result<&mut Self, WorkflowError> {
        self.ensure_open()?;
        if self.has_step(step.name()) {
            return Err(WorkflowError::DuplicateName { kind: NameKind::Step, name: step.name().to_string() });
        }

        event!(Level::DEBUG, event = events::STEP_ADDED, workflow = %self.name, step = %step.name());
        self.steps.push(step);
        Ok(self)
    }

    /// Register a transition; it becomes bound to this workflow
    pub fn add_transition(&mut self, mut transition: Transition) -> Result<&mut Self, WorkflowError> {
        self.ensure_open()?;
        if self.has_transition(transition.name()) {
            return Err(WorkflowError::DuplicateName {
                kind: NameKind::Transition,
                name: transition.name().to_string()
            });
        }

        transition.bind_to(&self.name);
        event!(Level::DEBUG, event = events::TRANSITION_ADDED,
               workflow = %self.name, transition = %transition.name(), step_to = %transition.step_to());
        self.transitions.push(transition);
        Ok(self)
    }

    pub fn add_role(&mut self, role: Role) -> Result<&mut Self, WorkflowError> {
        self.ensure_open()?;
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        Ok(self)
    }

    /// Designate the transition used when an item has no state yet
    pub fn set_start_transition(&mut self, transition_name: impl Into<String>) -> Result<&mut Self, WorkflowError> {
        self.ensure_open()?;
        self.start_transition = Some(transition_name.into());
        Ok(self)
    }

    /// Validate the graph and freeze it.
    ///
    /// Fails with [`WorkflowError::GraphIntegrity`] on dangling references;
    /// the workflow then stays unusable for items.
    pub fn finalize(&mut self) -> Result<(), WorkflowError> {
        self.ensure_open()?;

        if let Err(e) = self.validate() {
            event!(Level::WARN, event = events::WORKFLOW_REJECTED, workflow = %self.name, error = %e);
            return Err(e);
        }

        self.finalized = true;
        event!(Level::DEBUG, event = events::WORKFLOW_FINALIZED, workflow = %self.name,
               steps = self.steps.len(), transitions = self.transitions.len());
        Ok(())
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        let integrity = |message: String| Err(WorkflowError::GraphIntegrity(message));

        for (index, step) in self.steps.iter().enumerate() {
            if self.steps[..index].iter().any(|other| other.name() == step.name()) {
                return integrity(format!("step \"{}\" is registered twice", step.name()));
            }
            for transition_name in step.allowed_transitions() {
                if !self.has_transition(transition_name) {
                    return integrity(format!(
                        "step \"{}\" offers unknown transition \"{}\"",
                        step.name(),
                        transition_name
                    ));
                }
            }
        }

        for (index, transition) in self.transitions.iter().enumerate() {
            if self.transitions[..index].iter().any(|other| other.name() == transition.name()) {
                return integrity(format!("transition \"{}\" is registered twice", transition.name()));
            }
            if !self.has_step(transition.step_to()) {
                return integrity(format!(
                    "transition \"{}\" targets unknown step \"{}\"",
                    transition.name(),
                    transition.step_to()
                ));
            }
            if let Some(role) = transition.roles().iter().find(|role| role.workflow_name != self.name) {
                return integrity(format!(
                    "transition \"{}\" uses role \"{}\" of another workflow",
                    transition.name(),
                    role.full_name()
                ));
            }
        }

        match &self.start_transition {
            None => integrity("no start transition designated".to_string()),
            Some(name) if !self.has_transition(name) => {
                integrity(format!("start transition \"{}\" is not registered", name))
            }
            Some(_) => Ok(())
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn has_step(&self, name: &str) -> bool {
        self.steps.iter().any(|step| step.name() == name)
    }

    pub fn has_transition(&self, name: &str) -> bool {
        self.transitions.iter().any(|transition| transition.name() == name)
    }

    pub fn get_step(&self, name: &str) -> Result<&Step, WorkflowError> {
        self.steps.iter().find(|step| step.name() == name).ok_or_else(|| WorkflowError::step_not_found(name))
    }

    pub fn get_transition(&self, name: &str) -> Result<&Transition, WorkflowError> {
        self.transitions
            .iter()
            .find(|transition| transition.name() == name)
            .ok_or_else(|| WorkflowError::transition_not_found(name))
    }

    pub fn get_role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.name == name)
    }

    /// The entry point used for items without a state
    pub fn start_transition(&self) -> Result<&Transition, WorkflowError> {
        let name = self.start_transition.as_deref().ok_or_else(|| WorkflowError::transition_not_found(""))?;
        self.get_transition(name)
    }

    /// Step the item currently occupies; `None` for an item not started yet
    pub fn current_step(&self, item: &Item) -> Result<Option<&Step>, WorkflowError> {
        self.ensure_finalized()?;
        self.ensure_item_belongs(item)?;

        item.current_step_name().map(|name| self.get_step(name)).transpose()
    }

    fn ensure_item_belongs(&self, item: &Item) -> Result<(), WorkflowError> {
        match item.workflow_name() {
            Some(name) if name != self.name => Err(WorkflowError::Generic(format!(
                "item \"{}\" is part of workflow \"{}\", not \"{}\"",
                item.entity_id(),
                name,
                self.name
            ))),
            _ => Ok(())
        }
    }

    /// Transitions the item's position offers, ignoring guards, in step order
    pub fn offered_transitions(&self, item: &Item) -> Result<Vec<&Transition>, WorkflowError> {
        match self.current_step(item)? {
            None => Ok(vec![self.start_transition()?]),
            Some(step) => step.allowed_transitions().iter().map(|name| self.get_transition(name)).collect()
        }
    }

    /// Resolve a transition the item's position offers.
    ///
    /// Fails with `NotFound` if the transition is unknown or not offered.
    pub fn offered_transition(&self, item: &Item, transition_name: &str) -> Result<&Transition, WorkflowError> {
        self.offered_transitions(item)?
            .into_iter()
            .find(|transition| transition.name() == transition_name)
            .ok_or_else(|| WorkflowError::transition_not_found(transition_name))
    }

    /// Transitions offered to the item that the context's actor may take and
    /// whose guards currently match.
    ///
    /// Guards are evaluated against a throwaway error collection; nothing is
    /// changed on the item or the context.
    pub fn available_transitions(&self, item: &Item, context: &Context) -> Result<Vec<&Transition>, WorkflowError> {
        let available: Vec<&Transition> = self
            .offered_transitions(item)?
            .into_iter()
            .filter(|transition| transition.matches(item, context, &mut ErrorCollection::new()))
            .collect();

        event!(Level::TRACE, event = events::TRANSITIONS_LISTED,
               workflow = %self.name, entity = %item.entity_id(), count = available.len());
        Ok(available)
    }

    /// Evaluate the guard of an offered transition, collecting why it fails
    pub fn is_transition_allowed(
        &self,
        transition_name: &str,
        item: &Item,
        context: &Context,
        errors: &mut ErrorCollection
    ) -> Result<bool, WorkflowError> {
        let transition = self.offered_transition(item, transition_name)?;
        Ok(transition.matches(item, context, errors))
    }
}
