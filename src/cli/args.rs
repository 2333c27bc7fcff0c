//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct WorkflowCli {
    /// Use this configuration file instead of the default one
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: WorkflowCliCommand
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCliCommand {
    /// Check a workflow definition and print its graph
    Validate {
        /// Definition file, or a name from the definitions directory
        file: String
    },
    /// Show which transitions a step offers and which the given roles may take
    Transitions {
        /// Definition file, or a name from the definitions directory
        file:  String,
        /// Step to inspect; defaults to an item that has not started
        #[arg(long)]
        step:  Option<String>,
        /// Roles held by the acting user
        #[arg(long = "role")]
        roles: Vec<String>
    },
    /// Run a sequence of transitions against a fresh item
    Simulate {
        /// Definition file, or a name from the definitions directory
        file:        String,
        /// Transitions to attempt, in order
        #[arg(long = "transition", short = 't', required = true)]
        transitions: Vec<String>,
        /// Roles held by the acting user
        #[arg(long = "role")]
        roles:       Vec<String>,
        /// Context property as key=value
        #[arg(long = "set", value_parser = parse_key_value)]
        properties:  Vec<(String, String)>,
        /// Entity field as key=value
        #[arg(long = "field", value_parser = parse_key_value)]
        fields:      Vec<(String, String)>,
        /// Entity id as provider::identifier
        #[arg(long)]
        entity:      Option<String>
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got \"{}\"", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        let cli = WorkflowCli::parse_from([
            "wf", "simulate", "review", "-t", "submit", "-t", "approve", "--role", "approver", "--set", "note=hi",
            "--field", "score=4"
        ]);

        match cli.command {
            WorkflowCliCommand::Simulate { file, transitions, roles, properties, fields, entity } => {
                assert_eq!(file, "review");
                assert_eq!(transitions, vec!["submit", "approve"]);
                assert_eq!(roles, vec!["approver"]);
                assert_eq!(properties, vec![("note".to_string(), "hi".to_string())]);
                assert_eq!(fields, vec![("score".to_string(), "4".to_string())]);
                assert!(entity.is_none());
            }
            other => panic!("unexpected command: {:?}", other)
        }
    }

    #[test]
    fn test_rejects_malformed_pairs() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
        assert_eq!(parse_key_value("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
    }
}
