use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    domain::{
        condition::{AndCondition, TransitionPermissionCondition},
        context::Context,
        error_collection::ErrorCollection,
        item::Item,
        security::Role
    },
    port::{condition::Condition, security::RoleChecker}
};

/// Named edge of a workflow graph.
///
/// The source is implicit: a transition is offered by every step listing its
/// name. The target step and the owning workflow are referenced by name and
/// resolved through the [`Workflow`](crate::domain::workflow::Workflow).
#[derive(Debug, Clone)]
pub struct Transition {
    name:          String,
    label:         Option<String>,
    workflow_name: String,
    step_to:       String,
    condition:     Option<Arc<dyn Condition>>,
    roles:         Vec<Role>,
    input:         Option<String>,
    config:        Map<String, Value>
}

impl Transition {
    pub fn new(name: impl Into<String>, step_to: impl Into<String>) -> Self {
        Self {
            name:          name.into(),
            label:         None,
            workflow_name: String::new(),
            step_to:       step_to.into(),
            condition:     None,
            roles:         Vec::new(),
            input:         None,
            config:        Map::new()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a guard. A second guard is combined with the first one by AND.
    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.condition = Some(match self.condition.take() {
            None => condition,
            Some(existing) => Arc::new(AndCondition::new().with_condition(existing).with_condition(condition))
        });
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn with_roles(self, roles: impl IntoIterator<Item = Role>) -> Self {
        roles.into_iter().fold(self, Transition::with_role)
    }

    /// Name of the form/input type this transition consumes
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub(crate) fn bind_to(&mut self, workflow_name: &str) {
        self.workflow_name = workflow_name.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    /// Name of the step reached when the transition succeeds
    pub fn step_to(&self) -> &str {
        &self.step_to
    }

    pub fn condition(&self) -> Option<&Arc<dyn Condition>> {
        self.condition.as_ref()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    /// True if the transition is unrestricted or one of `user_roles` is allowed
    pub fn is_granted(&self, user_roles: &[Role]) -> bool {
        self.roles.is_empty() || self.roles.iter().any(|role| user_roles.contains(role))
    }

    /// Delegate the role check to an acting identity
    pub fn is_granted_to(&self, checker: &dyn RoleChecker) -> bool {
        checker.is_granted(&self.roles)
    }

    /// Check the acting identity's roles, then evaluate the guard.
    ///
    /// Both are always evaluated so every reason for a refusal is collected.
    /// An unrestricted transition without a guard always matches.
    pub fn matches(&self, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        let granted = TransitionPermissionCondition.matches(self, item, context, errors);
        let guarded = match &self.condition {
            Some(condition) => condition.matches(self, item, context, errors),
            None => true
        };
        granted && guarded
    }
}
