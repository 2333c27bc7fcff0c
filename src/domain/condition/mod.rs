//! Guard conditions
//!
//! Leaf conditions test one thing and describe their failure; composite
//! conditions combine other conditions into arbitrary guard trees.

mod callback;
mod composite;
mod permission;
mod property;
pub mod registry;

pub use callback::{CallbackCondition, Predicate};
pub use composite::{AndCondition, NotCondition, OrCondition};
pub use permission::TransitionPermissionCondition;
pub use property::{Comparison, PropertyCondition, PropertySource};
pub use registry::{ConditionDefinition, ConditionRegistry};
