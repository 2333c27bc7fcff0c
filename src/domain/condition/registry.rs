//! Explicit registration table turning condition definitions into conditions
//!
//! Composite kinds (`and`, `or`, `not`) are built structurally; every other
//! kind is looked up by name in the table and built by its constructor.

use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{
        condition::{
            AndCondition, CallbackCondition, NotCondition, OrCondition, PropertyCondition,
            TransitionPermissionCondition
        },
        context::Context,
        error::{NameKind, WorkflowError},
        item::Item,
        transition::Transition
    },
    port::condition::Condition
};

pub const AND: &str = "and";
pub const OR: &str = "or";
pub const NOT: &str = "not";
pub const PERMISSION: &str = "permission";
pub const PROPERTY: &str = "property";

/// Composite parameter switching to nested error reporting
const GROUPED: &str = "grouped";

/// Declarative form of a guard tree.
///
/// ```yaml
/// type: and
/// grouped: true
/// conditions:
///   - type: permission
///   - type: property
///     property: total
///     operator: gte
///     value: 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    #[serde(rename = "type")]
    pub kind:       String,
    /// Children of composite kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionDefinition>,
    /// Remaining keys, handed to the constructor of a leaf kind
    #[serde(flatten)]
    pub params:     Map<String, Value>
}

impl ConditionDefinition {
    pub fn leaf(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), conditions: Vec::new(), params: Map::new() }
    }

    pub fn composite(kind: impl Into<String>, conditions: Vec<ConditionDefinition>) -> Self {
        Self { kind: kind.into(), conditions, params: Map::new() }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    fn is_grouped(&self) -> bool {
        self.params.get(GROUPED).and_then(Value::as_bool).unwrap_or(false)
    }
}

pub type ConditionConstructor =
    Arc<dyn Fn(&ConditionDefinition) -> Result<Arc<dyn Condition>, WorkflowError> + Send + Sync>;

#[derive(Clone)]
pub struct ConditionRegistry {
    constructors: HashMap<String, ConditionConstructor>
}

impl ConditionRegistry {
    /// Registry without any leaf kinds
    pub fn empty() -> Self {
        Self { constructors: HashMap::new() }
    }

    /// Registry knowing the `permission` and `property` kinds
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.constructors.insert(PERMISSION.to_string(), Arc::new(build_permission));
        registry.constructors.insert(PROPERTY.to_string(), Arc::new(build_property));
        registry
    }

    /// Register a constructor for a leaf kind
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> Result<&mut Self, WorkflowError>
    where
        F: Fn(&ConditionDefinition) -> Result<Arc<dyn Condition>, WorkflowError>
            + Send
            + Sync
            + 'static
    {
        let kind = kind.into();
        if self.contains(&kind) {
            return Err(WorkflowError::DuplicateName { kind: NameKind::Condition, name: kind });
        }
        self.constructors.insert(kind, Arc::new(constructor));
        Ok(self)
    }

    /// Register a custom predicate; failures are reported under `message_key`.
    ///
    /// The definition's remaining keys become the error params, in the order
    /// they are declared.
    pub fn register_predicate<F>(
        &mut self,
        kind: impl Into<String>,
        message_key: impl Into<String>,
        predicate: F
    ) -> Result<&mut Self, WorkflowError>
    where
        F: Fn(&Transition, &Item, &Context) -> bool + Send + Sync + 'static
    {
        let kind = kind.into();
        let message_key = message_key.into();
        let predicate: Arc<crate::domain::condition::Predicate> = Arc::new(predicate);
        let name = kind.clone();

        self.register(kind, move |definition| {
            let params = definition.params.values().cloned().collect();
            let condition = CallbackCondition::from_shared(name.clone(), predicate.clone())
                .with_message_key(message_key.clone())
                .with_params(params);
            Ok(Arc::new(condition) as Arc<dyn Condition>)
        })
    }

    pub fn contains(&self, kind: &str) -> bool {
        matches!(kind, AND | OR | NOT) || self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.extend([AND, OR, NOT]);
        kinds.sort_unstable();
        kinds
    }

    /// Build a guard tree from its definition
    pub fn build(&self, definition: &ConditionDefinition) -> Result<Arc<dyn Condition>, WorkflowError> {
        match definition.kind.as_str() {
            AND => {
                let mut condition = if definition.is_grouped() { AndCondition::new().grouped() } else { AndCondition::new() };
                for child in &definition.conditions {
                    condition.add_condition(self.build(child)?);
                }
                Ok(Arc::new(condition))
            }
            OR => {
                let mut condition = if definition.is_grouped() { OrCondition::new().grouped() } else { OrCondition::new() };
                for child in &definition.conditions {
                    condition.add_condition(self.build(child)?);
                }
                Ok(Arc::new(condition))
            }
            NOT => match definition.conditions.as_slice() {
                [child] => Ok(Arc::new(NotCondition::new(self.build(child)?))),
                children => Err(WorkflowError::Configuration(format!(
                    "condition \"not\" needs exactly one child, {} given",
                    children.len()
                )))
            },
            kind => {
                let constructor = self
                    .constructors
                    .get(kind)
                    .ok_or_else(|| WorkflowError::NotFound { kind: NameKind::Condition, name: kind.to_string() })?;
                constructor(definition)
            }
        }
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry").field("kinds", &self.kinds()).finish()
    }
}

fn build_permission(_definition: &ConditionDefinition) -> Result<Arc<dyn Condition>, WorkflowError> {
    Ok(Arc::new(TransitionPermissionCondition))
}

fn build_property(definition: &ConditionDefinition) -> Result<Arc<dyn Condition>, WorkflowError> {
    let condition: PropertyCondition = serde_json::from_value(Value::Object(definition.params.clone()))?;
    Ok(Arc::new(condition))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{
        context::Context,
        entity::EntityId,
        error_collection::ErrorCollection,
        security::{Role, User}
    };

    fn evaluate(condition: &Arc<dyn Condition>, entity: Value, context: &Context) -> (bool, ErrorCollection) {
        let transition = Transition::new("publish", "published").with_role(Role::new("review", "editor"));
        let item = Item::initialize(EntityId::new("docs", 1), entity);
        let mut errors = ErrorCollection::new();
        let result = condition.matches(&transition, &item, context, &mut errors);
        (result, errors)
    }

    #[test]
    fn test_builds_tree_from_yaml() {
        let yaml = r#"
type: or
conditions:
  - type: permission
  - type: not
    conditions:
      - type: property
        property: locked
        operator: eq
        value: true
"#;
        let definition: ConditionDefinition = serde_yaml::from_str(yaml).unwrap();
        let condition = ConditionRegistry::new().build(&definition).unwrap();
        let editor = Context::new().with_actor(Arc::new(User::new("eve").with_role(Role::new("review", "editor"))));
        let viewer = Context::new().with_actor(Arc::new(User::new("vic")));

        assert!(evaluate(&condition, json!({"locked": true}), &editor).0);
        assert!(evaluate(&condition, json!({"locked": false}), &viewer).0);

        let (result, errors) = evaluate(&condition, json!({"locked": true}), &viewer);
        assert!(!result);
        assert_eq!(errors.count_errors(), 2);
    }

    #[test]
    fn test_grouped_composite_from_yaml() {
        let yaml = r#"
type: and
grouped: true
conditions:
  - type: property
    property: score
    operator: gte
    value: 3
"#;
        let definition: ConditionDefinition = serde_yaml::from_str(yaml).unwrap();
        let condition = ConditionRegistry::new().build(&definition).unwrap();

        let (result, errors) = evaluate(&condition, json!({"score": 1}), &Context::new());

        assert!(!result);
        let entry = errors.get_error(0).unwrap();
        assert_eq!(entry.message_key, "transition.condition.and");
        assert_eq!(entry.nested.as_ref().map(ErrorCollection::count_errors), Some(1));
    }

    #[test]
    fn test_registered_predicate() {
        let mut registry = ConditionRegistry::new();
        registry
            .register_predicate("has_title", "transition.condition.has-title", |_, item, _| {
                item.entity_property("title").is_some()
            })
            .unwrap();

        let condition = registry.build(&ConditionDefinition::leaf("has_title").with_param("hint", "title")).unwrap();

        assert!(evaluate(&condition, json!({"title": "x"}), &Context::new()).0);
        let (_, errors) = evaluate(&condition, json!({}), &Context::new());
        assert_eq!(errors.to_array(), json!([["transition.condition.has-title", ["title"], null]]));
    }

    #[test]
    fn test_predicate_params_keep_declared_order() {
        let mut registry = ConditionRegistry::new();
        registry.register_predicate("within", "transition.condition.within", |_, _, _| false).unwrap();
        let yaml = r#"
type: within
zone: north
area: 7
"#;
        let definition: ConditionDefinition = serde_yaml::from_str(yaml).unwrap();
        let condition = registry.build(&definition).unwrap();

        let (_, errors) = evaluate(&condition, json!({}), &Context::new());

        assert_eq!(errors.get_error(0).unwrap().params, vec![json!("north"), json!(7)]);
    }

    #[test]
    fn test_registration_errors() {
        let mut registry = ConditionRegistry::new();

        assert!(matches!(registry.register_predicate("and", "x", |_, _, _| true), Err(WorkflowError::DuplicateName { .. })));
        assert!(registry.build(&ConditionDefinition::leaf("unknown")).unwrap_err().is_not_found());
        assert!(matches!(
            registry.build(&ConditionDefinition::composite(NOT, vec![])),
            Err(WorkflowError::Configuration(_))
        ));
    }
}
