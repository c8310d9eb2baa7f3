use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MigrationError;

/// Keys of every message the runner renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    NoMigrationsFound,
    MultipleMigrationsVersion,
    MigrationNotFound,
    MultipleMigrationsName,
    InvalidMigrationFilename,
    WrongMigrationInterface,
    MigrationFailed,
    MigrationsMisconfigured,
    SourceError,
    StoreError,
    NothingToDo,
    CurrentVersion,
    MovingTo,
    AllDone,
}

impl MessageKey {
    pub const ALL: [MessageKey; 14] = [
        MessageKey::NoMigrationsFound,
        MessageKey::MultipleMigrationsVersion,
        MessageKey::MigrationNotFound,
        MessageKey::MultipleMigrationsName,
        MessageKey::InvalidMigrationFilename,
        MessageKey::WrongMigrationInterface,
        MessageKey::MigrationFailed,
        MessageKey::MigrationsMisconfigured,
        MessageKey::SourceError,
        MessageKey::StoreError,
        MessageKey::NothingToDo,
        MessageKey::CurrentVersion,
        MessageKey::MovingTo,
        MessageKey::AllDone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKey::NoMigrationsFound => "no_migrations_found",
            MessageKey::MultipleMigrationsVersion => "multiple_migrations_version",
            MessageKey::MigrationNotFound => "migration_not_found",
            MessageKey::MultipleMigrationsName => "multiple_migrations_name",
            MessageKey::InvalidMigrationFilename => "invalid_migration_filename",
            MessageKey::WrongMigrationInterface => "wrong_migration_interface",
            MessageKey::MigrationFailed => "migration_failed",
            MessageKey::MigrationsMisconfigured => "migrations_misconfigured",
            MessageKey::SourceError => "migration_source_error",
            MessageKey::StoreError => "schema_version_error",
            MessageKey::NothingToDo => "nothing_to_do",
            MessageKey::CurrentVersion => "current_schema_version",
            MessageKey::MovingTo => "moving_to_version",
            MessageKey::AllDone => "all_done",
        }
    }
}

/// Maps message keys to templates. `{}` placeholders are filled in order.
pub trait MessageCatalog {
    fn template(&self, key: MessageKey) -> String;

    fn format(&self, key: MessageKey, args: &[String]) -> String {
        interpolate(&self.template(key), args)
    }

    fn format_error(&self, err: &MigrationError) -> String {
        self.format(err.message_key(), &err.arguments())
    }
}

/// Built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl MessageCatalog for DefaultCatalog {
    fn template(&self, key: MessageKey) -> String {
        let text = match key {
            MessageKey::NoMigrationsFound => "No migrations found.",
            MessageKey::MultipleMigrationsVersion => {
                "There are multiple migrations with the same version number: {}."
            }
            MessageKey::MigrationNotFound => "No migration could be found with the version number: {}.",
            MessageKey::MultipleMigrationsName => {
                "There are multiple migrations with the same name: {}."
            }
            MessageKey::InvalidMigrationFilename => "Migration \"{}\" has an invalid name.",
            MessageKey::WrongMigrationInterface => {
                "The migration \"{}\" must provide both up and down operations."
            }
            MessageKey::MigrationFailed => "Migration \"{}\" (version {}) failed: {}",
            MessageKey::MigrationsMisconfigured => {
                "Migrations have been loaded but are disabled or set up incorrectly: {}."
            }
            MessageKey::SourceError => "Could not read the migration source: {}",
            MessageKey::StoreError => "Could not access the schema version: {}",
            MessageKey::NothingToDo => "Nothing to do, bye!",
            MessageKey::CurrentVersion => "Current schema version: {}",
            MessageKey::MovingTo => "Moving {} to version {}",
            MessageKey::AllDone => "All done. Schema is at version {}.",
        };
        text.to_string()
    }
}

/// Catalog read from a key → template map, falling back to [`DefaultCatalog`]
/// for keys it does not define.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapCatalog {
    entries: HashMap<String, String>,
}

impl MapCatalog {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, key: MessageKey, template: impl Into<String>) {
        self.entries.insert(key.as_str().to_string(), template.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageCatalog for MapCatalog {
    fn template(&self, key: MessageKey) -> String {
        self.entries
            .get(key.as_str())
            .cloned()
            .unwrap_or_else(|| DefaultCatalog.template(key))
    }
}

fn interpolate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}
