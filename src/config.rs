//! User configuration and workflow definition discovery

use std::{
    fs,
    path::{Path, PathBuf}
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use crate::domain::{constant::definition, definition::WorkflowDefinition};

/// Configuration structure for the `wf` CLI
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory searched for workflow definitions given by name
    pub definitions_dir:  Option<PathBuf>,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter:       String,
    /// Provider used for entity ids given without one
    pub default_provider: String
}

impl Default for Config {
    fn default() -> Self {
        Self {
            definitions_dir:  None,
            log_filter:       "info".to_string(),
            default_provider: "local".to_string()
        }
    }
}

/// Get the project directories for cross-platform config path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "flowgate").context("Failed to determine project directories")
}

pub fn get_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.config_dir().to_path_buf())
}

pub fn get_config_file_path() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.yaml"))
}

/// Definitions directory: configured one, else `definitions/` in the config dir
pub fn get_definitions_dir(config: &Config) -> Result<PathBuf> {
    match &config.definitions_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(get_config_dir()?.join("definitions"))
    }
}

/// Load configuration from file or create default if it doesn't exist
pub fn load_config() -> Result<Config> {
    let config_path = get_config_file_path()?;

    if config_path.exists() {
        load_config_from(&config_path)
    } else {
        let config = Config::default();
        save_config(&config)?;
        Ok(config)
    }
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_file_path()?)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = serde_yaml::to_string(config).context("Failed to serialize config")?;
    fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Read a single workflow definition file
pub fn read_definition(path: &Path) -> Result<WorkflowDefinition> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read definition: {}", path.display()))?;

    WorkflowDefinition::from_yaml(&content).with_context(|| format!("Failed to parse definition: {}", path.display()))
}

/// Every parseable definition in a directory, sorted by file name.
///
/// Files that fail to parse are skipped and logged.
pub fn load_definitions(dir: &Path) -> Result<Vec<(PathBuf, WorkflowDefinition)>> {
    let mut paths = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read definitions directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file()
            && let Some(extension) = path.extension().and_then(|e| e.to_str())
            && (extension == "yaml" || extension == "yml")
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut definitions = Vec::new();
    for path in paths {
        match read_definition(&path) {
            Ok(parsed) => {
                event!(Level::DEBUG, event = definition::DEFINITION_LOADED, path = %path.display(), workflow = %parsed.name);
                definitions.push((path, parsed));
            }
            Err(e) => {
                event!(Level::WARN, event = definition::DEFINITION_SKIPPED, path = %path.display(), error = %e);
            }
        }
    }
    Ok(definitions)
}

/// Resolve a definition argument.
///
/// An existing path wins; otherwise the name is looked up in the definitions
/// directory with a `.yaml` or `.yml` extension.
pub fn resolve_definition_path(config: &Config, file: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(file);
    if direct.exists() {
        return Ok(direct);
    }

    let dir = get_definitions_dir(config)?;
    ["yaml", "yml"]
        .iter()
        .map(|extension| dir.join(format!("{}.{}", file, extension)))
        .find(|candidate| candidate.exists())
        .with_context(|| format!("Workflow definition not found: {}", file))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const DEFINITION: &str = r#"
name: ticket
start_transition: open
steps:
  - name: opened
    final: true
transitions:
  - name: open
    to: opened
"#;

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config { log_filter: "workflow=debug".to_string(), ..Config::default() };

        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "default_provider: tickets\n").unwrap();

        let config = load_config_from(&path).unwrap();

        assert_eq!(config.default_provider, "tickets");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_load_definitions_skips_invalid_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ticket.yaml"), DEFINITION).unwrap();
        fs::write(dir.path().join("broken.yml"), "name: [").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let definitions = load_definitions(dir.path()).unwrap();

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].1.name, "ticket");
    }

    #[test]
    fn test_resolve_by_name_in_definitions_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ticket.yml"), DEFINITION).unwrap();
        let config = Config { definitions_dir: Some(dir.path().to_path_buf()), ..Config::default() };

        let resolved = resolve_definition_path(&config, "ticket").unwrap();

        assert_eq!(resolved, dir.path().join("ticket.yml"));
        assert!(resolve_definition_path(&config, "missing").is_err());
    }
}
