//! Implementations of the `wf` subcommands

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde_json::{Map, Value};

use crate::{
    adapter::{manager::WorkflowManager, storage::InMemoryStateRepository},
    cli::args::WorkflowCliCommand,
    config::{self, Config},
    domain::{
        condition::ConditionRegistry,
        context::Context,
        entity::EntityId,
        error_collection::ErrorCollection,
        item::Item,
        security::{Role, User},
        state::State,
        workflow::Workflow
    },
    ui::display
};

pub async fn run(command: WorkflowCliCommand, config: &Config) -> Result<()> {
    match command {
        WorkflowCliCommand::Validate { file } => validate(config, &file),
        WorkflowCliCommand::Transitions { file, step, roles } => transitions(config, &file, step.as_deref(), &roles),
        WorkflowCliCommand::Simulate { file, transitions, roles, properties, fields, entity } => {
            let entity_id = match entity {
                Some(raw) => raw.parse()?,
                None => EntityId::new(&config.default_provider, 1)
            };
            simulate(config, &file, entity_id, &transitions, &roles, to_map(properties), to_map(fields)).await
        }
    }
}

/// Build and finalize the named definition
fn load_workflow(config: &Config, file: &str) -> Result<Workflow> {
    let path = config::resolve_definition_path(config, file)?;
    let definition = config::read_definition(&path)?;

    definition
        .build(&ConditionRegistry::new())
        .with_context(|| format!("Invalid workflow definition: {}", path.display()))
}

/// Context acting as a `wf` user holding `roles` of the workflow
fn acting_context(workflow: &Workflow, roles: &[String]) -> Context {
    let user = roles.iter().fold(User::new("wf"), |user, role| user.with_role(Role::new(workflow.name(), role)));
    Context::new().with_actor(Arc::new(user))
}

fn validate(config: &Config, file: &str) -> Result<()> {
    let workflow = load_workflow(config, file)?;

    display::show_workflow_header(&workflow);
    println!("{}", display::steps_table(&workflow));
    println!("{}", display::transitions_table(workflow.transitions()));
    println!("✓ {} is valid", workflow.name());
    Ok(())
}

/// An item positioned at `step` as if it had just reached it
fn item_at_step(workflow: &Workflow, entity_id: EntityId, step: &str) -> Result<Item> {
    workflow.get_step(step)?;
    let reached_by = workflow
        .transitions()
        .iter()
        .find(|transition| transition.step_to() == step)
        .map(|transition| transition.name().to_string())
        .with_context(|| format!("Step \"{}\" is not the target of any transition", step))?;

    let placed = State::new(
        entity_id.clone(),
        workflow.name(),
        reached_by,
        Some(step.to_string()),
        true,
        Map::new(),
        chrono::Utc::now(),
        Vec::new()
    );
    Ok(Item::reconstitute(entity_id, Value::Object(Map::new()), vec![placed]))
}

fn transitions(config: &Config, file: &str, step: Option<&str>, roles: &[String]) -> Result<()> {
    let workflow = load_workflow(config, file)?;
    let entity_id = EntityId::new(&config.default_provider, 1);
    let item = match step {
        Some(step) => item_at_step(&workflow, entity_id, step)?,
        None => Item::initialize(entity_id, Value::Object(Map::new()))
    };

    let context = acting_context(&workflow, roles);
    let mut allowed = Vec::new();
    let mut denied = Vec::new();
    for transition in workflow.offered_transitions(&item)? {
        let mut errors = ErrorCollection::new();
        if workflow.is_transition_allowed(transition.name(), &item, &context, &mut errors)? {
            allowed.push(transition);
        } else {
            denied.push((transition, errors));
        }
    }

    println!("{}", display::transitions_table(allowed));
    for (transition, errors) in denied {
        println!("{} is not allowed:", transition.name());
        display::show_errors(&errors);
    }
    Ok(())
}

async fn simulate(
    config: &Config,
    file: &str,
    entity_id: EntityId,
    transitions: &[String],
    roles: &[String],
    properties: Map<String, Value>,
    fields: Map<String, Value>
) -> Result<()> {
    let workflow = load_workflow(config, file)?;
    let workflow_name = workflow.name().to_string();
    let mut context = acting_context(&workflow, roles);
    for (key, value) in properties {
        context.set_property(key, value);
    }

    let mut manager = WorkflowManager::new(Arc::new(InMemoryStateRepository::new()));
    let registered = manager.register_workflow(workflow)?;
    display::show_workflow_header(&registered);

    let mut item = manager.open_item(entity_id, Value::Object(fields)).await?;

    for transition in transitions {
        let outcome = manager.handle(&workflow_name, &mut item, transition, &context).await?;
        let step = outcome.state.step_name().unwrap_or("-");
        if outcome.is_successful() {
            println!("✓ {} -> {}", transition, step);
        } else {
            println!("✗ {} (step stays {})", transition, step);
            display::show_errors(&outcome.errors);
        }
    }

    println!();
    println!("{}", display::history_table(item.state_history()));
    let available = manager.available_transitions(&workflow_name, &item, &context)?;
    println!("Available: {}", if available.is_empty() { "-".to_string() } else { available.join(", ") });
    Ok(())
}

/// Values are read as JSON when they parse, as plain strings otherwise
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn to_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    pairs.into_iter().map(|(key, value)| (key, parse_value(value))).collect()
}
