use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{
        constant::message,
        context::Context,
        error_collection::{ErrorCollection, ErrorEntry},
        item::Item,
        transition::Transition
    },
    port::condition::{Condition, DescribeError}
};

/// Where a compared property is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertySource {
    /// Top level field of the wrapped entity
    #[default]
    Entity,
    /// Property of the transition context
    Context,
    /// Raw input carried in the context payload
    Payload
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    #[default]
    #[serde(alias = "==")]
    Eq,
    #[serde(alias = "!=")]
    Neq,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = ">=")]
    Gte,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Lte,
    /// Property equals one element of the expected array
    In,
    /// Property is present and not null; the expected value is ignored
    Exists
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Neq => "neq",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::In => "in",
            Comparison::Exists => "exists"
        }
    }

    /// Compare an actual value against the expected one; a missing value only satisfies `neq`
    pub fn compare(&self, actual: Option<&Value>, expected: &Value) -> bool {
        let actual = match actual {
            Some(Value::Null) | None => return matches!(self, Comparison::Neq) && !expected.is_null(),
            Some(value) => value
        };

        match self {
            Comparison::Eq => loosely_equal(actual, expected),
            Comparison::Neq => !loosely_equal(actual, expected),
            Comparison::Gt => order(actual, expected) == Some(Ordering::Greater),
            Comparison::Gte => matches!(order(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
            Comparison::Lt => order(actual, expected) == Some(Ordering::Less),
            Comparison::Lte => matches!(order(actual, expected), Some(Ordering::Less | Ordering::Equal)),
            Comparison::In => expected.as_array().is_some_and(|options| options.iter().any(|o| loosely_equal(actual, o))),
            Comparison::Exists => true
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numbers compare by value so `1` equals `1.0`
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b
    }
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None
    }
}

/// Compares a property of the entity or the context with an expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCondition {
    #[serde(default)]
    pub source:   PropertySource,
    pub property: String,
    #[serde(default)]
    pub operator: Comparison,
    #[serde(default)]
    pub value:    Value
}

impl PropertyCondition {
    pub fn new(source: PropertySource, property: impl Into<String>, operator: Comparison, value: impl Into<Value>) -> Self {
        Self { source, property: property.into(), operator, value: value.into() }
    }

    pub fn entity(property: impl Into<String>, operator: Comparison, value: impl Into<Value>) -> Self {
        Self::new(PropertySource::Entity, property, operator, value)
    }

    pub fn context(property: impl Into<String>, operator: Comparison, value: impl Into<Value>) -> Self {
        Self::new(PropertySource::Context, property, operator, value)
    }

    fn read<'a>(&self, item: &'a Item, context: &'a Context) -> Option<&'a Value> {
        match self.source {
            PropertySource::Entity => item.entity_property(&self.property),
            PropertySource::Context => context.get_property(&self.property),
            PropertySource::Payload => context.get_payload_value(&self.property)
        }
    }
}

impl DescribeError for PropertyCondition {
    fn describe_error(&self, _transition: &Transition, _item: &Item, _context: &Context) -> ErrorEntry {
        ErrorEntry::new(
            message::PROPERTY,
            vec![Value::String(self.property.clone()), Value::String(self.operator.to_string()), self.value.clone()]
        )
    }
}

impl Condition for PropertyCondition {
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        if self.operator.compare(self.read(item, context), &self.value) {
            return true;
        }

        errors.add_entry(self.describe_error(transition, item, context));
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::entity::EntityId;

    fn check(condition: &PropertyCondition, entity: Value, context: &Context) -> (bool, ErrorCollection) {
        let item = Item::initialize(EntityId::new("orders", 9), entity);
        let mut errors = ErrorCollection::new();
        let result = condition.matches(&Transition::new("ship", "shipped"), &item, context, &mut errors);
        (result, errors)
    }

    #[test]
    fn test_numeric_comparisons() {
        let condition = PropertyCondition::entity("total", Comparison::Gte, 100);

        assert!(check(&condition, json!({"total": 100.0}), &Context::new()).0);
        assert!(check(&condition, json!({"total": 250}), &Context::new()).0);

        let (result, errors) = check(&condition, json!({"total": 99}), &Context::new());
        assert!(!result);
        assert_eq!(errors.to_array(), json!([["transition.condition.property", ["total", "gte", 100], null]]));
    }

    #[test]
    fn test_missing_property_fails_except_neq() {
        assert!(!check(&PropertyCondition::entity("status", Comparison::Eq, "paid"), json!({}), &Context::new()).0);
        assert!(check(&PropertyCondition::entity("status", Comparison::Neq, "paid"), json!({}), &Context::new()).0);
        assert!(!check(&PropertyCondition::entity("status", Comparison::Exists, Value::Null), json!({}), &Context::new()).0);
    }

    #[test]
    fn test_in_and_context_source() {
        let mut context = Context::new();
        context.set_property("carrier", "dhl");

        let condition = PropertyCondition::context("carrier", Comparison::In, json!(["ups", "dhl"]));
        assert!(check(&condition, json!({}), &context).0);

        let mismatched = PropertyCondition::context("carrier", Comparison::Gt, 3);
        assert!(!check(&mismatched, json!({}), &context).0);
    }

    #[test]
    fn test_deserializes_operator_aliases() {
        let condition: PropertyCondition =
            serde_json::from_value(json!({"property": "total", "operator": ">=", "value": 5})).unwrap();

        assert_eq!(condition.operator, Comparison::Gte);
        assert_eq!(condition.source, PropertySource::Entity);
    }
}
