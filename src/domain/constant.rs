//! Domain Events - Structured events for internal monitoring and debugging
//! and the message keys conditions report failures with

/// Workflow graph events
pub mod workflow {
    pub const STEP_ADDED: &str = "step.added";
    pub const TRANSITION_ADDED: &str = "transition.added";
    pub const WORKFLOW_FINALIZED: &str = "workflow.finalized";
    pub const WORKFLOW_REJECTED: &str = "workflow.rejected";
    pub const TRANSITIONS_LISTED: &str = "transitions.listed";
}

/// TransitionHandler events
pub mod transition_handler {
    pub const ATTEMPT_STARTED: &str = "attempt.started";
    pub const ATTEMPT_SUCCEEDED: &str = "attempt.succeeded";
    pub const ATTEMPT_REJECTED: &str = "attempt.rejected";
    pub const ATTEMPT_ABORTED: &str = "attempt.aborted";
}

/// WorkflowManager events
pub mod workflow_manager {
    pub const WORKFLOW_REGISTERED: &str = "workflow.registered";
    pub const ITEM_OPENED: &str = "item.opened";
    pub const STATE_APPENDED: &str = "state.appended";
}

/// StateRepository events
pub mod state_repository {
    pub const STATE_STORED: &str = "state.stored";
    pub const HISTORY_RETRIEVED: &str = "history.retrieved";
}

/// Definition loading events
pub mod definition {
    pub const DEFINITION_LOADED: &str = "definition.loaded";
    pub const DEFINITION_SKIPPED: &str = "definition.skipped";
}

/// Message keys written into an error collection when a guard rejects a transition
pub mod message {
    pub const TRANSITION_PERMISSION: &str = "transition.condition.transition-permission";
    pub const PROPERTY: &str = "transition.condition.property";
    pub const CALLBACK: &str = "transition.condition.callback";
    pub const AND: &str = "transition.condition.and";
    pub const OR: &str = "transition.condition.or";
    pub const NOT: &str = "transition.condition.not";
}
