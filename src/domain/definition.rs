//! Declarative workflow definitions
//!
//! A definition is plain data, typically parsed from YAML, that is built into
//! a finalized [`Workflow`]. Guards are built through a
//! [`ConditionRegistry`], so custom condition kinds are available to
//! definitions once registered.
//!
//! # Example YAML structure
//! ```yaml
//! name: review
//! start_transition: submit
//! roles:
//!   - name: approver
//!     label: Approver
//! steps:
//!   - name: draft
//!     transitions: [submit]
//!   - name: pending
//!     transitions: [approve]
//!   - name: published
//!     final: true
//! transitions:
//!   - name: submit
//!     to: pending
//!   - name: approve
//!     to: published
//!     roles: [approver]
//!     condition:
//!       type: property
//!       property: score
//!       operator: gte
//!       value: 3
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{
        condition::{ConditionDefinition, ConditionRegistry},
        error::WorkflowError,
        security::Role,
        step::Step,
        transition::Transition,
        workflow::Workflow
    }
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name:             String,
    #[serde(default)]
    pub label:            Option<String>,
    pub start_transition: String,
    #[serde(default)]
    pub roles:            Vec<RoleDefinition>,
    pub steps:            Vec<StepDefinition>,
    pub transitions:      Vec<TransitionDefinition>,
    #[serde(default)]
    pub config:           Map<String, Value>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name:  String,
    #[serde(default)]
    pub label: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name:        String,
    #[serde(default)]
    pub label:       Option<String>,
    #[serde(default, rename = "final")]
    pub is_final:    bool,
    #[serde(default)]
    pub transitions: Vec<String>,
    #[serde(default)]
    pub config:      Map<String, Value>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    pub name:      String,
    #[serde(default)]
    pub label:     Option<String>,
    pub to:        String,
    #[serde(default)]
    pub roles:     Vec<String>,
    /// Form/input type the transition consumes
    #[serde(default)]
    pub input:     Option<String>,
    #[serde(default)]
    pub condition: Option<ConditionDefinition>,
    #[serde(default)]
    pub config:    Map<String, Value>
}

impl WorkflowDefinition {
    /// Parse a workflow definition from YAML content
    pub fn from_yaml(yaml_content: &str) -> Result<Self, WorkflowError> {
        Ok(serde_yaml::from_str(yaml_content)?)
    }

    pub fn to_yaml(&self) -> Result<String, WorkflowError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn role(&self, name: &str) -> Result<Role, WorkflowError> {
        if !self.roles.is_empty() && !self.roles.iter().any(|role| role.name == name) {
            return Err(WorkflowError::GraphIntegrity(format!("role \"{}\" is not defined", name)));
        }
        Ok(Role::new(&self.name, name))
    }

    /// Build and finalize the workflow.
    ///
    /// The result holds no acting identity; roles are checked per attempt
    /// against the actor of the attempt's context.
    pub fn build(&self, registry: &ConditionRegistry) -> Result<Workflow, WorkflowError> {
        let mut workflow = Workflow::new(&self.name);
        if let Some(label) = &self.label {
            workflow = workflow.with_label(label);
        }
        for (key, value) in &self.config {
            workflow = workflow.with_config(key, value.clone());
        }

        for role in &self.roles {
            let mut defined = Role::new(&self.name, &role.name);
            if let Some(label) = &role.label {
                defined = defined.with_label(label);
            }
            workflow.add_role(defined)?;
        }

        for step in &self.steps {
            workflow.add_step(Self::build_step(step))?;
        }

        for definition in &self.transitions {
            workflow.add_transition(self.build_transition(definition, registry)?)?;
        }

        workflow.set_start_transition(&self.start_transition)?;
        workflow.finalize()?;
        Ok(workflow)
    }

    fn build_step(definition: &StepDefinition) -> Step {
        let mut step = Step::new(&definition.name).final_step(definition.is_final);
        if let Some(label) = &definition.label {
            step = step.with_label(label);
        }
        for transition in &definition.transitions {
            step = step.allow_transition(transition);
        }
        for (key, value) in &definition.config {
            step = step.with_config(key, value.clone());
        }
        step
    }

    fn build_transition(
        &self,
        definition: &TransitionDefinition,
        registry: &ConditionRegistry
    ) -> Result<Transition, WorkflowError> {
        let mut transition = Transition::new(&definition.name, &definition.to);
        if let Some(label) = &definition.label {
            transition = transition.with_label(label);
        }
        if let Some(input) = &definition.input {
            transition = transition.with_input(input);
        }
        for role in &definition.roles {
            transition = transition.with_role(self.role(role)?);
        }
        for (key, value) in &definition.config {
            transition = transition.with_config(key, value.clone());
        }

        if let Some(condition) = &definition.condition {
            transition = transition.with_condition(registry.build(condition)?);
        }
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::domain::{
        context::Context, engine::TransitionHandler, entity::EntityId, error_collection::ErrorCollection, item::Item,
        security::User
    };

    const REVIEW: &str = r#"
name: review
label: Editorial review
start_transition: submit
roles:
  - name: approver
    label: Approver
steps:
  - name: draft
    transitions: [submit]
  - name: pending
    transitions: [approve]
  - name: published
    final: true
transitions:
  - name: submit
    to: pending
    input: submit_form
  - name: approve
    to: published
    roles: [approver]
    condition:
      type: property
      property: score
      operator: gte
      value: 3
"#;

    fn build() -> Workflow {
        WorkflowDefinition::from_yaml(REVIEW).unwrap().build(&ConditionRegistry::new()).unwrap()
    }

    #[test]
    fn test_builds_finalized_workflow() {
        let workflow = build();

        assert!(workflow.is_finalized());
        assert_eq!(workflow.label(), "Editorial review");
        assert_eq!(workflow.start_transition().unwrap().name(), "submit");
        assert_eq!(workflow.get_transition("submit").unwrap().input(), Some("submit_form"));
        assert_eq!(workflow.get_transition("approve").unwrap().roles(), &[Role::new("review", "approver")]);
        assert!(workflow.get_step("published").unwrap().is_final());
    }

    #[test]
    fn test_role_check_precedes_declared_guard() {
        let workflow = build();
        let handler = TransitionHandler::new(&workflow).unwrap();
        let viewer = Context::new().with_actor(Arc::new(User::new("vic")));
        let mut item = Item::initialize(EntityId::new("docs", 1), json!({"score": 1}));

        handler.transit(&mut item, "submit", &viewer).unwrap();
        let mut errors = ErrorCollection::new();
        let allowed = workflow.is_transition_allowed("approve", &item, &viewer, &mut errors).unwrap();

        assert!(!allowed);
        let keys: Vec<&str> = errors.iter().map(|e| e.message_key.as_str()).collect();
        assert_eq!(keys, vec!["transition.condition.transition-permission", "transition.condition.property"]);
    }

    #[test]
    fn test_roles_are_enforced_without_any_build_option() {
        let workflow = build();
        let handler = TransitionHandler::new(&workflow).unwrap();
        let approver = Context::new().with_actor(Arc::new(User::new("ann").with_role(Role::new("review", "approver"))));
        let mut item = Item::initialize(EntityId::new("docs", 1), json!({"score": 5}));
        handler.transit(&mut item, "submit", &Context::new()).unwrap();

        assert!(!handler.attempt(&item, "approve", &Context::new()).unwrap().is_successful());
        assert!(handler.attempt(&item, "approve", &approver).unwrap().is_successful());
    }

    #[test]
    fn test_undefined_role_and_dangling_target() {
        let mut definition = WorkflowDefinition::from_yaml(REVIEW).unwrap();
        definition.transitions[1].roles.push("ghost".to_string());
        assert!(matches!(definition.build(&ConditionRegistry::new()), Err(WorkflowError::GraphIntegrity(_))));

        let mut definition = WorkflowDefinition::from_yaml(REVIEW).unwrap();
        definition.transitions[0].to = "nowhere".to_string();
        assert!(matches!(definition.build(&ConditionRegistry::new()), Err(WorkflowError::GraphIntegrity(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let definition = WorkflowDefinition::from_yaml(REVIEW).unwrap();
        let again = WorkflowDefinition::from_yaml(&definition.to_yaml().unwrap()).unwrap();

        assert_eq!(definition, again);
    }
}
