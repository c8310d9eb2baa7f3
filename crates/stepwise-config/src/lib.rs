pub mod config;
pub mod file_format;

pub use config::{ConfigError, DEFAULT_MIGRATIONS_DIR, DEFAULT_VERSION_TABLE, StepwiseConfig};
pub use file_format::FileFormat;
