use std::path::PathBuf;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_format::FileFormat;

/// Directory used when none is configured.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Name of the single-row table holding the applied version.
pub const DEFAULT_VERSION_TABLE: &str = "schema_version";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("migrations are disabled")]
    Disabled,
    #[error("migrations directory is not set")]
    MissingMigrationsDir,
    #[error("invalid version table name: {0:?}")]
    InvalidVersionTable(String),
}

/// Top-level stepwise configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct StepwiseConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
    /// Target version used by `latest`.
    #[serde(default)]
    pub version: u32,
    /// Emit a progress report while migrating.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_version_table")]
    pub version_table: String,
    /// SQLite database file the CLI migrates.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Format of unit files created by `stepwise new`.
    #[serde(default)]
    pub unit_format: FileFormat,
    /// Optional JSON file overriding message templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

fn default_migrations_dir() -> String {
    DEFAULT_MIGRATIONS_DIR.to_string()
}

fn default_version_table() -> String {
    DEFAULT_VERSION_TABLE.to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("stepwise.db")
}

impl Default for StepwiseConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            migrations_dir: default_migrations_dir(),
            version: 0,
            verbose: false,
            version_table: default_version_table(),
            database: default_database(),
            unit_format: FileFormat::default(),
            messages: None,
        }
    }
}

impl StepwiseConfig {
    /// Migrations directory with exactly one trailing separator.
    ///
    /// An empty setting falls back to [`DEFAULT_MIGRATIONS_DIR`].
    pub fn migrations_dir(&self) -> String {
        let trimmed = self.migrations_dir.trim();
        let dir = if trimmed.is_empty() {
            DEFAULT_MIGRATIONS_DIR
        } else {
            trimmed.trim_end_matches(['/', '\\'])
        };
        // A bare "/" trims down to nothing; keep it as the root.
        if dir.is_empty() {
            return "/".to_string();
        }
        format!("{dir}/")
    }

    pub fn migrations_path(&self) -> PathBuf {
        PathBuf::from(self.migrations_dir())
    }

    /// Target version for `latest`.
    pub fn target_version(&self) -> u32 {
        self.version
    }

    pub fn version_table(&self) -> &str {
        &self.version_table
    }

    pub fn database(&self) -> &PathBuf {
        &self.database
    }

    pub fn unit_format(&self) -> FileFormat {
        self.unit_format
    }

    /// Refuse to run when disabled or set up incorrectly.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Err(ConfigError::Disabled);
        }
        if self.migrations_dir.trim().is_empty() {
            return Err(ConfigError::MissingMigrationsDir);
        }
        if !is_sql_identifier(&self.version_table) {
            return Err(ConfigError::InvalidVersionTable(self.version_table.clone()));
        }
        Ok(())
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
