use thiserror::Error;

use crate::message::MessageKey;

/// Failure reading or writing the database behind a store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Backend(String),
    #[error("stored schema version is out of range: {0}")]
    InvalidVersion(i64),
}

/// Failure raised by a migration unit's own operation.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Other(String),
}

impl UnitError {
    pub fn other(msg: impl Into<String>) -> Self {
        UnitError::Other(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("no migrations found")]
    NoMigrationsFound,
    #[error("there are multiple migrations with version {0}")]
    AmbiguousVersion(u32),
    #[error("no migration could be found with version {0}")]
    MissingVersion(u32),
    #[error("invalid migration identifier: {0}")]
    InvalidIdentifier(String),
    #[error("there are multiple migrations with the name {0}")]
    DuplicateName(String),
    #[error("migration {0} is not executable: it must provide both up and down")]
    UnitNotExecutable(String),
    #[error("migration {unit} (version {order_key}) failed: {source}")]
    UnitOperationFailed {
        unit: String,
        order_key: u32,
        #[source]
        source: UnitError,
    },
    #[error("migrations are disabled or set up incorrectly: {0}")]
    MisconfiguredRunner(String),
    #[error("migration source error: {0}")]
    Source(String),
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl MigrationError {
    /// Catalog key used to render this error for display.
    pub fn message_key(&self) -> MessageKey {
        match self {
            MigrationError::NoMigrationsFound => MessageKey::NoMigrationsFound,
            MigrationError::AmbiguousVersion(_) => MessageKey::MultipleMigrationsVersion,
            MigrationError::MissingVersion(_) => MessageKey::MigrationNotFound,
            MigrationError::InvalidIdentifier(_) => MessageKey::InvalidMigrationFilename,
            MigrationError::DuplicateName(_) => MessageKey::MultipleMigrationsName,
            MigrationError::UnitNotExecutable(_) => MessageKey::WrongMigrationInterface,
            MigrationError::UnitOperationFailed { .. } => MessageKey::MigrationFailed,
            MigrationError::MisconfiguredRunner(_) => MessageKey::MigrationsMisconfigured,
            MigrationError::Source(_) => MessageKey::SourceError,
            MigrationError::Store(_) => MessageKey::StoreError,
        }
    }

    /// Values interpolated into the catalog template, in placeholder order.
    pub fn arguments(&self) -> Vec<String> {
        match self {
            MigrationError::NoMigrationsFound => Vec::new(),
            MigrationError::AmbiguousVersion(key) | MigrationError::MissingVersion(key) => {
                vec![key.to_string()]
            }
            MigrationError::InvalidIdentifier(raw) => vec![raw.clone()],
            MigrationError::DuplicateName(name) => vec![name.clone()],
            MigrationError::UnitNotExecutable(unit) => vec![unit.clone()],
            MigrationError::UnitOperationFailed {
                unit,
                order_key,
                source,
            } => vec![unit.clone(), order_key.to_string(), source.to_string()],
            MigrationError::MisconfiguredRunner(reason) => vec![reason.clone()],
            MigrationError::Source(msg) => vec![msg.clone()],
            MigrationError::Store(err) => vec![err.to_string()],
        }
    }

    /// True for failures raised before anything touched the database or the
    /// version store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MigrationError::NoMigrationsFound
                | MigrationError::AmbiguousVersion(_)
                | MigrationError::MissingVersion(_)
                | MigrationError::InvalidIdentifier(_)
                | MigrationError::DuplicateName(_)
                | MigrationError::UnitNotExecutable(_)
                | MigrationError::MisconfiguredRunner(_)
                | MigrationError::Source(_)
        )
    }
}
