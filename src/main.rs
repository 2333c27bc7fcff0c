//! # Workflow CLI Application
//!
//! Inspect and exercise workflow definitions from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! # Check a definition and print its steps and transitions
//! wf validate review.yaml
//!
//! # Which transitions can an approver take from the pending step?
//! wf transitions review --step pending --role approver
//!
//! # Run transitions against a fresh item and print its history
//! wf simulate review -t submit -t approve --role approver --field score=4
//! ```
//!
//! Definitions given by name are looked up in the configured definitions
//! directory. Log output is controlled by `RUST_LOG`, falling back to the
//! `log_filter` configuration key.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use workflow::{
    cli::{self, WorkflowCli},
    config
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WorkflowCli::parse();
    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    cli::run(cli.command, &config).await
}
