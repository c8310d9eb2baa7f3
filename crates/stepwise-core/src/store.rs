use crate::error::DatabaseError;

/// Statement execution surface handed to migration units.
pub trait Database {
    /// Execute one or more `;`-separated statements.
    fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError>;
}

/// Durable holder of the single applied schema version.
///
/// `set` must not return before the value is durable; the runner calls it
/// once per completed unit and relies on that to bound partial progress.
pub trait VersionStore {
    /// Current version, `0` when nothing has been recorded yet.
    fn get(&mut self) -> Result<u32, DatabaseError>;

    fn set(&mut self, version: u32) -> Result<(), DatabaseError>;
}

/// In-process backend recording executed statements and every stored version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBackend {
    version: u32,
    executed: Vec<String>,
    history: Vec<u32>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that already sits at `version`.
    pub fn at_version(version: u32) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Every value passed to `set`, in order.
    pub fn history(&self) -> &[u32] {
        &self.history
    }
}

impl Database for MemoryBackend {
    fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.executed.push(sql.to_string());
        Ok(())
    }
}

impl VersionStore for MemoryBackend {
    fn get(&mut self) -> Result<u32, DatabaseError> {
        Ok(self.version)
    }

    fn set(&mut self, version: u32) -> Result<(), DatabaseError> {
        self.version = version;
        self.history.push(version);
        Ok(())
    }
}
