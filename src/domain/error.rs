use std::fmt::{self, Display};

use thiserror::Error;

/// Namespace a missing or duplicated name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Workflow,
    Step,
    Transition,
    Condition,
    Entity
}

impl Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            NameKind::Workflow => "workflow",
            NameKind::Step => "step",
            NameKind::Transition => "transition",
            NameKind::Condition => "condition",
            NameKind::Entity => "entity"
        };
        write!(f, "{}", kind)
    }
}

/// Structural errors of the workflow engine.
///
/// Guard failures are not represented here: a condition evaluating to false
/// writes into an [`ErrorCollection`](crate::domain::error_collection::ErrorCollection)
/// and the attempt is recorded as an unsuccessful state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// A step or transition does not exist, or is not offered from the current step
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: NameKind, name: String },

    /// A name was registered twice in the same namespace
    #[error("{kind} \"{name}\" is already registered")]
    DuplicateName { kind: NameKind, name: String },

    /// Finalization found a dangling reference
    #[error("workflow graph is invalid: {0}")]
    GraphIntegrity(String),

    /// Error entry index out of range
    #[error("error with index \"{0}\" not set")]
    InvalidIndex(usize),

    /// The workflow has not passed finalization and can not execute transitions
    #[error("workflow \"{0}\" is not finalized")]
    NotFinalized(String),

    /// The workflow graph is frozen
    #[error("workflow \"{0}\" is already finalized")]
    AlreadyFinalized(String),

    /// Configuration related errors
    #[error("{0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("{0}")]
    Serialization(String),

    /// State persistence errors raised by repository adapters
    #[error("{0}")]
    Storage(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String)
}

impl WorkflowError {
    pub fn step_not_found(name: impl Into<String>) -> Self {
        WorkflowError::NotFound { kind: NameKind::Step, name: name.into() }
    }

    pub fn transition_not_found(name: impl Into<String>) -> Self {
        WorkflowError::NotFound { kind: NameKind::Transition, name: name.into() }
    }

    pub fn workflow_not_found(name: impl Into<String>) -> Self {
        WorkflowError::NotFound { kind: NameKind::Workflow, name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::NotFound { .. })
    }
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for WorkflowError {
    fn from(err: anyhow::Error) -> Self {
        WorkflowError::Generic(err.to_string())
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        WorkflowError::Configuration(err.to_string())
    }
}

/// Convert from serde_yaml::Error
impl From<serde_yaml::Error> for WorkflowError {
    fn from(err: serde_yaml::Error) -> Self {
        WorkflowError::Serialization(err.to_string())
    }
}

/// Convert from serde_json::Error
impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::Serialization(err.to_string())
    }
}
