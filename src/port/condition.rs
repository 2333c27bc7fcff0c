use std::fmt::Debug;

use crate::domain::{
    context::Context,
    error_collection::{ErrorCollection, ErrorEntry},
    item::Item,
    transition::Transition
};

/// Guard predicate evaluated against a transition attempt.
///
/// Implementations read the transition, item and context without changing
/// them. On failure a condition must add at least one entry describing why to
/// `errors` before returning `false`.
pub trait Condition: Debug + Send + Sync {
    /// Consider if the condition matches for the given item
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool;
}

/// Leaf conditions describe a failed match as a localizable error entry
pub trait DescribeError {
    /// Message key plus the parameters substituted into the message
    fn describe_error(&self, transition: &Transition, item: &Item, context: &Context) -> ErrorEntry;
}
