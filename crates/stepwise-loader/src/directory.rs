use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use stepwise_config::{FileFormat, StepwiseConfig};
use stepwise_core::{Database, Direction, Migration, MigrationError, UnitError, UnitSource};

/// Contents of a declarative unit file.
///
/// ```json
/// { "up": ["CREATE TABLE users (id INTEGER)"], "down": ["DROP TABLE users"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<Vec<String>>,
}

impl UnitFile {
    /// Empty template with both operations present.
    pub fn template(comment: Option<String>) -> Self {
        Self {
            comment,
            up: Some(Vec::new()),
            down: Some(Vec::new()),
        }
    }

    fn statements(&self, direction: Direction) -> Option<&[String]> {
        match direction {
            Direction::Up => self.up.as_deref(),
            Direction::Down => self.down.as_deref(),
        }
    }

    fn run(&self, direction: Direction, db: &mut dyn Database) -> Result<(), UnitError> {
        let statements = self.statements(direction).ok_or_else(|| {
            UnitError::other(format!("unit file has no {} statements", direction.method()))
        })?;
        for sql in statements {
            db.execute_batch(sql)?;
        }
        Ok(())
    }
}

impl Migration for UnitFile {
    fn up(&self, db: &mut dyn Database) -> Result<(), UnitError> {
        self.run(Direction::Up, db)
    }

    fn down(&self, db: &mut dyn Database) -> Result<(), UnitError> {
        self.run(Direction::Down, db)
    }

    fn supports(&self, direction: Direction) -> bool {
        self.statements(direction).is_some()
    }
}

/// Parse a unit file, picking the decoder from its extension.
pub fn read_unit_file(path: &Path) -> Result<UnitFile, MigrationError> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(FileFormat::from_extension)
        .ok_or_else(|| {
            MigrationError::Source(format!("unsupported unit file: {}", path.display()))
        })?;

    let content = fs::read_to_string(path).map_err(|e| {
        MigrationError::Source(format!("read unit file {}: {}", path.display(), e))
    })?;

    let unit = match format {
        FileFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        FileFormat::Yaml | FileFormat::Yml => {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        }
    };
    unit.map_err(|e| MigrationError::Source(format!("parse unit file {}: {}", path.display(), e)))
}

/// Unit source backed by a directory of `NNN_name.{json,yaml,yml}` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Source reading the configured migrations directory, relative to
    /// `project_root` when one is given.
    pub fn from_config(config: &StepwiseConfig, project_root: Option<&Path>) -> Self {
        let dir = config.migrations_path();
        match project_root {
            Some(root) => Self::new(root.join(dir)),
            None => Self::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every unit file in the directory with its identifier (the file stem).
    fn entries(&self) -> Result<Vec<(String, PathBuf)>, MigrationError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let read_dir = fs::read_dir(&self.dir).map_err(|e| {
            MigrationError::Source(format!(
                "read migrations directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|e| MigrationError::Source(format!("read directory entry: {e}")))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(FileFormat::from_extension)
                .is_some();
            if !supported {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push((stem.to_string(), path.clone()));
            }
        }

        entries.sort();
        Ok(entries)
    }
}

impl UnitSource for DirectorySource {
    fn identifiers(&self) -> Result<Vec<String>, MigrationError> {
        Ok(self.entries()?.into_iter().map(|(id, _)| id).collect())
    }

    fn load(&self, identifier: &str) -> Result<Option<Rc<dyn Migration>>, MigrationError> {
        let path = self
            .entries()?
            .into_iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, path)| path);

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading unit file");
                let unit: Rc<dyn Migration> = Rc::new(read_unit_file(&path)?);
                Ok(Some(unit))
            }
            None => Ok(None),
        }
    }
}
