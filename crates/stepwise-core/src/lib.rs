pub mod error;
pub mod message;
pub mod source;
pub mod store;
pub mod unit;

pub use error::{DatabaseError, MigrationError, UnitError};
pub use message::{DefaultCatalog, MapCatalog, MessageCatalog, MessageKey};
pub use source::{Registry, UnitSource};
pub use store::{Database, MemoryBackend, VersionStore};
pub use unit::{
    Direction, FnMigration, MAX_ORDER_KEY, Migration, ORDER_KEY_WIDTH, UnitId, class_name,
    key_prefix, parse_identifier,
};
