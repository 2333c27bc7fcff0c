use serde_json::Value;

use crate::{
    domain::{
        constant::message,
        context::Context,
        error_collection::{ErrorCollection, ErrorEntry},
        item::Item,
        security::Role,
        transition::Transition
    },
    port::condition::{Condition, DescribeError}
};

/// Limits a transition to an acting identity holding one of the transition's roles.
///
/// The identity is read from the [`Context`] of each attempt, so one workflow
/// serves every user. Every transition applies this check before its guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionPermissionCondition;

impl TransitionPermissionCondition {
    /// Render roles as `[a, b]`
    fn describe_roles(roles: &[Role]) -> String {
        let names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();
        format!("[{}]", names.join(", "))
    }
}

impl DescribeError for TransitionPermissionCondition {
    fn describe_error(&self, transition: &Transition, _item: &Item, _context: &Context) -> ErrorEntry {
        ErrorEntry::new(message::TRANSITION_PERMISSION, vec![Value::String(Self::describe_roles(transition.roles()))])
    }
}

impl Condition for TransitionPermissionCondition {
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        if context.is_granted(transition.roles()) {
            return true;
        }

        errors.add_entry(self.describe_error(transition, item, context));
        false
    }
}
