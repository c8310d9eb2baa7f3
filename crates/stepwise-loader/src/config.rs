use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stepwise_config::StepwiseConfig;
use stepwise_core::MapCatalog;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "stepwise.json";

/// Load stepwise.json from the current directory.
pub fn load_config() -> Result<StepwiseConfig> {
    let path = PathBuf::from(CONFIG_FILE);
    if !path.exists() {
        anyhow::bail!("{CONFIG_FILE} not found. Run 'stepwise init' first.");
    }
    read_config(&path)
}

/// Load config from a specific path.
pub fn load_config_from_path(path: PathBuf) -> Result<StepwiseConfig> {
    if !path.exists() {
        anyhow::bail!("{CONFIG_FILE} not found at: {}", path.display());
    }
    read_config(&path)
}

/// Load config from project root, with fallback to defaults.
pub fn load_config_or_default(project_root: Option<PathBuf>) -> Result<StepwiseConfig> {
    let config_path = match project_root {
        Some(root) => root.join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    };

    if config_path.exists() {
        read_config(&config_path)
    } else {
        Ok(StepwiseConfig::default())
    }
}

/// Load a message catalog override (a JSON object of key → template).
pub fn load_catalog(path: &Path) -> Result<MapCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read message catalog: {}", path.display()))?;
    let catalog: MapCatalog = serde_json::from_str(&content)
        .with_context(|| format!("parse message catalog: {}", path.display()))?;
    Ok(catalog)
}

fn read_config(path: &Path) -> Result<StepwiseConfig> {
    let content = fs::read_to_string(path).context("read stepwise.json")?;
    let config: StepwiseConfig = serde_json::from_str(&content).context("parse stepwise.json")?;
    Ok(config)
}
