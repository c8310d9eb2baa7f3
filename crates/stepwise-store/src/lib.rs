pub mod sql;
pub mod sqlite;

pub use sql::{DatabaseBackend, VERSION_COLUMN, VersionTable};
pub use sqlite::SqliteBackend;
