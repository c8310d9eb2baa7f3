pub mod config;
pub mod directory;

pub use config::{
    CONFIG_FILE, load_catalog, load_config, load_config_from_path, load_config_or_default,
};
pub use directory::{DirectorySource, UnitFile, read_unit_file};
