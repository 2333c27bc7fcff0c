//! Command-line interface of the `wf` binary

pub mod args;
pub mod commands;

pub use args::{WorkflowCli, WorkflowCliCommand};
pub use commands::run;
