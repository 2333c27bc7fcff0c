//! Workflow model: graph, items, states and guards

pub mod condition;
pub mod constant;
pub mod context;
pub mod definition;
pub mod engine;
pub mod entity;
pub mod error;
pub mod error_collection;
pub mod item;
pub mod security;
pub mod state;
pub mod step;
pub mod transition;
pub mod workflow;
