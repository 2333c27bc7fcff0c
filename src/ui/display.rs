//! Display utilities for formatted output

use tabled::{Table, Tabled, settings::Style};

use crate::domain::{error_collection::ErrorCollection, state::State, transition::Transition, workflow::Workflow};

#[derive(Debug, Clone, Tabled)]
pub struct StepRow {
    #[tabled(rename = "Step")]
    pub name:        String,
    #[tabled(rename = "Label")]
    pub label:       String,
    #[tabled(rename = "Final")]
    pub is_final:    bool,
    #[tabled(rename = "Transitions")]
    pub transitions: String
}

#[derive(Debug, Clone, Tabled)]
pub struct TransitionRow {
    #[tabled(rename = "Transition")]
    pub name:    String,
    #[tabled(rename = "To")]
    pub step_to: String,
    #[tabled(rename = "Roles")]
    pub roles:   String,
    #[tabled(rename = "Guarded")]
    pub guarded: bool
}

#[derive(Debug, Clone, Tabled)]
pub struct StateRow {
    #[tabled(rename = "#")]
    pub index:      usize,
    #[tabled(rename = "Transition")]
    pub transition: String,
    #[tabled(rename = "Step")]
    pub step:       String,
    #[tabled(rename = "OK")]
    pub successful: bool,
    #[tabled(rename = "Errors")]
    pub errors:     String
}

impl From<&Transition> for TransitionRow {
    fn from(transition: &Transition) -> Self {
        let roles: Vec<&str> = transition.roles().iter().map(|role| role.name.as_str()).collect();
        Self {
            name:    transition.name().to_string(),
            step_to: transition.step_to().to_string(),
            roles:   roles.join(", "),
            guarded: transition.condition().is_some()
        }
    }
}

fn render<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn steps_table(workflow: &Workflow) -> String {
    render(workflow.steps().iter().map(|step| StepRow {
        name:        step.name().to_string(),
        label:       step.label().to_string(),
        is_final:    step.is_final(),
        transitions: step.allowed_transitions().join(", ")
    }))
}

pub fn transitions_table<'a>(transitions: impl IntoIterator<Item = &'a Transition>) -> String {
    render(transitions.into_iter().map(TransitionRow::from))
}

pub fn history_table(history: &[State]) -> String {
    render(history.iter().enumerate().map(|(index, state)| StateRow {
        index:      index + 1,
        transition: state.transition_name().to_string(),
        step:       state.step_name().unwrap_or("-").to_string(),
        successful: state.is_successful(),
        errors:     state.errors().iter().map(|e| e.message_key.as_str()).collect::<Vec<_>>().join("\n")
    }))
}

/// Display workflow summary header
pub fn show_workflow_header(workflow: &Workflow) {
    println!("Workflow: {} ({})", workflow.label(), workflow.name());
    if let Ok(start) = workflow.start_transition() {
        println!("Start:    {} -> {}", start.name(), start.step_to());
    }
    println!();
}

/// Display collected guard errors with their parameters
pub fn show_errors(errors: &ErrorCollection) {
    for entry in errors {
        println!("  ✗ {} {}", entry.message_key, serde_json::Value::Array(entry.params.clone()));
        if let Some(nested) = &entry.nested {
            show_errors(nested);
        }
    }
}
