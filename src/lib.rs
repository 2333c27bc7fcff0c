//! # Workflow Engine
//!
//! A finite-state workflow engine. Entities move between the steps of a
//! [`Workflow`](domain::workflow::Workflow) by attempting transitions whose
//! guards are trees of conditions; every attempt, successful or not, is kept
//! as an immutable [`State`](domain::state::State) in the entity's history.
//!
//! This crate provides functionality to:
//! - Build workflows in code or from YAML definitions
//! - Guard transitions with permission, property and custom conditions
//! - Execute transitions and persist their outcome through a state repository
//! - Inspect and simulate workflows from the `wf` command line

pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod port;
pub mod ui;

pub use adapter::{manager::WorkflowManager, storage::InMemoryStateRepository};
pub use config::{Config, load_config, load_config_from};
pub use domain::{
    condition::ConditionRegistry,
    context::Context,
    definition::WorkflowDefinition,
    engine::{TransitionHandler, TransitionOutcome},
    entity::EntityId,
    error::WorkflowError,
    error_collection::{ErrorCollection, ErrorEntry},
    item::Item,
    security::{Role, User},
    state::State,
    step::Step,
    transition::Transition,
    workflow::Workflow
};
pub use port::{condition::Condition, security::RoleChecker, storage::StateRepository};
