//! Conditions combining other conditions
//!
//! Children are always evaluated in order and all of them are evaluated, so
//! every relevant failure reaches the error collection. By default the
//! children's errors are merged flat into the caller's collection; a grouped
//! composite reports one entry under its own key with the children's errors
//! nested below it.

use std::sync::Arc;

use crate::{
    domain::{
        constant::message, context::Context, error_collection::ErrorCollection, item::Item, transition::Transition
    },
    port::condition::Condition
};

fn evaluate_all(
    conditions: &[Arc<dyn Condition>],
    transition: &Transition,
    item: &Item,
    context: &Context,
    errors: &mut ErrorCollection
) -> usize {
    conditions.iter().filter(|condition| condition.matches(transition, item, context, errors)).count()
}

fn report_failure(message_key: &str, grouped: bool, collected: ErrorCollection, errors: &mut ErrorCollection) {
    if !collected.has_errors() {
        errors.add_error(message_key, vec![], None);
    } else if grouped {
        errors.add_error(message_key, vec![], Some(collected));
    } else {
        errors.add_errors(collected);
    }
}

/// Matches if every child matches. Without children it matches vacuously.
#[derive(Debug, Clone, Default)]
pub struct AndCondition {
    conditions: Vec<Arc<dyn Condition>>,
    grouped:    bool
}

impl AndCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report failures as one entry nesting the children's errors
    pub fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn add_condition(&mut self, condition: Arc<dyn Condition>) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Arc<dyn Condition>] {
        &self.conditions
    }
}

impl Condition for AndCondition {
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        let mut collected = ErrorCollection::new();
        let matched = evaluate_all(&self.conditions, transition, item, context, &mut collected);

        if matched == self.conditions.len() {
            return true;
        }

        report_failure(message::AND, self.grouped, collected, errors);
        false
    }
}

/// Matches if at least one child matches. Without children it never matches.
///
/// Errors of failing children are only reported when no child matched.
#[derive(Debug, Clone, Default)]
pub struct OrCondition {
    conditions: Vec<Arc<dyn Condition>>,
    grouped:    bool
}

impl OrCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report failures as one entry nesting the children's errors
    pub fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn add_condition(&mut self, condition: Arc<dyn Condition>) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Arc<dyn Condition>] {
        &self.conditions
    }
}

impl Condition for OrCondition {
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        let mut collected = ErrorCollection::new();

        if evaluate_all(&self.conditions, transition, item, context, &mut collected) > 0 {
            return true;
        }

        report_failure(message::OR, self.grouped, collected, errors);
        false
    }
}

/// Inverts a single child.
///
/// The child's own errors are dropped: the child succeeding is the failure.
#[derive(Debug, Clone)]
pub struct NotCondition {
    condition: Arc<dyn Condition>
}

impl NotCondition {
    pub fn new(condition: Arc<dyn Condition>) -> Self {
        Self { condition }
    }

    pub fn condition(&self) -> &Arc<dyn Condition> {
        &self.condition
    }
}

impl Condition for NotCondition {
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        let mut discarded = ErrorCollection::new();

        if !self.condition.matches(transition, item, context, &mut discarded) {
            return true;
        }

        errors.add_error(message::NOT, vec![transition.name().into()], None);
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{condition::CallbackCondition, entity::EntityId};

    fn fixed(name: &'static str, result: bool) -> Arc<dyn Condition> {
        Arc::new(CallbackCondition::new(name, move |_, _, _| result).with_message_key(name))
    }

    fn run(condition: &dyn Condition) -> (bool, ErrorCollection) {
        let transition = Transition::new("approve", "published");
        let item = Item::initialize(EntityId::new("docs", 1), json!({}));
        let mut errors = ErrorCollection::new();
        let result = condition.matches(&transition, &item, &Context::new(), &mut errors);
        (result, errors)
    }

    fn keys(errors: &ErrorCollection) -> Vec<&str> {
        errors.iter().map(|e| e.message_key.as_str()).collect()
    }

    #[test]
    fn test_and_evaluates_every_child() {
        let condition = AndCondition::new()
            .with_condition(fixed("first", false))
            .with_condition(fixed("second", true))
            .with_condition(fixed("third", false));

        let (result, errors) = run(&condition);

        assert!(!result);
        assert_eq!(keys(&errors), vec!["first", "third"]);
    }

    #[test]
    fn test_and_without_children_matches() {
        let (result, errors) = run(&AndCondition::new());

        assert!(result);
        assert!(!errors.has_errors());
    }

    #[test]
    fn test_or_reports_all_children_only_when_none_match() {
        let failing = OrCondition::new().with_condition(fixed("first", false)).with_condition(fixed("second", false));
        let (result, errors) = run(&failing);
        assert!(!result);
        assert_eq!(keys(&errors), vec!["first", "second"]);

        let passing = OrCondition::new().with_condition(fixed("first", false)).with_condition(fixed("second", true));
        let (result, errors) = run(&passing);
        assert!(result);
        assert!(!errors.has_errors());
    }

    #[test]
    fn test_or_without_children_fails_with_own_error() {
        let (result, errors) = run(&OrCondition::new());

        assert!(!result);
        assert_eq!(keys(&errors), vec![message::OR]);
    }

    #[test]
    fn test_not_discards_child_errors() {
        let (result, errors) = run(&NotCondition::new(fixed("child", false)));
        assert!(result);
        assert!(!errors.has_errors());

        let (result, errors) = run(&NotCondition::new(fixed("child", true)));
        assert!(!result);
        assert_eq!(keys(&errors), vec![message::NOT]);
    }

    #[test]
    fn test_nested_composites() {
        let condition = AndCondition::new()
            .with_condition(Arc::new(NotCondition::new(fixed("blocked", false))))
            .with_condition(Arc::new(OrCondition::new().with_condition(fixed("left", false)).with_condition(fixed("right", false))));

        let (result, errors) = run(&condition);

        assert!(!result);
        assert_eq!(keys(&errors), vec!["left", "right"]);
    }

    #[test]
    fn test_grouped_composite_nests_child_errors() {
        let condition = AndCondition::new()
            .grouped()
            .with_condition(fixed("first", false))
            .with_condition(fixed("second", true))
            .with_condition(fixed("third", false));

        let (result, errors) = run(&condition);

        assert!(!result);
        assert_eq!(
            errors.to_array(),
            json!([[message::AND, [], [["first", ["first"], null], ["third", ["third"], null]]]])
        );
    }

    #[test]
    fn test_grouped_or_without_children_has_no_nested_entries() {
        let (result, errors) = run(&OrCondition::new().grouped());

        assert!(!result);
        assert_eq!(errors.to_array(), json!([[message::OR, [], null]]));
    }
}
