use anyhow::{Context, Result, bail};
use stepwise_config::{FileFormat, StepwiseConfig};
use stepwise_core::{
    DefaultCatalog, MAX_ORDER_KEY, MessageCatalog, UnitSource, key_prefix, parse_identifier,
};
use stepwise_loader::DirectorySource;
use stepwise_runner::{Runner, directory_runner};
use stepwise_store::SqliteBackend;

use crate::report::ConsoleReport;

pub type CliRunner = Runner<SqliteBackend, DirectorySource>;

/// Open the configured SQLite database, creating the version table if needed.
pub fn open_backend(config: &StepwiseConfig) -> Result<SqliteBackend> {
    let path = config.database();
    tracing::debug!(
        path = %path.display(),
        table = config.version_table(),
        "opening database"
    );
    SqliteBackend::open(path, config.version_table())
        .with_context(|| format!("open database: {}", path.display()))
}

/// Runner over the configured migrations directory and database.
pub fn open_runner(config: &StepwiseConfig, verbose: bool) -> Result<CliRunner> {
    // Misconfiguration is caught before the database file is created.
    config
        .check()
        .map_err(|e| anyhow::anyhow!("stepwise.json: {e}"))?;

    let backend = open_backend(config)?;
    let mut runner = directory_runner(config, None, backend)
        .map_err(|e| anyhow::anyhow!(DefaultCatalog.format_error(&e)))?
        .with_report(ConsoleReport);
    if verbose {
        runner.set_verbose(true);
    }
    Ok(runner)
}

/// Order key for the next unit: one above the highest valid key present.
pub fn next_order_key(source: &DirectorySource) -> Result<u32> {
    let highest = source
        .identifiers()
        .map_err(|e| anyhow::anyhow!(DefaultCatalog.format_error(&e)))?
        .iter()
        .filter_map(|identifier| parse_identifier(identifier))
        .map(|id| id.order_key)
        .max()
        .unwrap_or(0);

    if highest >= MAX_ORDER_KEY {
        bail!("no order keys left: the highest unit is already {MAX_ORDER_KEY}");
    }
    Ok(highest + 1)
}

/// File name of a unit, e.g. `003_add_email.json`.
pub fn unit_filename(order_key: u32, name: &str, format: FileFormat) -> String {
    format!("{}{}.{}", key_prefix(order_key), name, format.extension())
}

/// Lowercase `name` and collapse everything outside `[a-z0-9]` into single
/// underscores.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case("create_users", "create_users")]
    #[case("Create Users", "create_users")]
    #[case("add-email  column!", "add_email_column")]
    #[case("__x__", "x")]
    #[case("???", "")]
    fn sanitizes_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_name(raw), expected);
    }

    #[rstest]
    #[case(1, FileFormat::Json, "001_create_users.json")]
    #[case(42, FileFormat::Yaml, "042_create_users.yaml")]
    #[case(999, FileFormat::Yml, "999_create_users.yml")]
    fn builds_unit_filenames(#[case] key: u32, #[case] format: FileFormat, #[case] expected: &str) {
        assert_eq!(unit_filename(key, "create_users", format), expected);
    }

    #[test]
    fn next_key_in_missing_directory_is_one() {
        let tmp = TempDir::new().unwrap();
        let source = DirectorySource::new(tmp.path().join("migrations"));
        assert_eq!(next_order_key(&source).unwrap(), 1);
    }

    #[test]
    fn next_key_skips_invalid_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("001_a.json"), "{}").unwrap();
        fs::write(tmp.path().join("004_b.yaml"), "{}").unwrap();
        fs::write(tmp.path().join("notes.json"), "{}").unwrap();
        fs::write(tmp.path().join("009_c.txt"), "").unwrap();

        let source = DirectorySource::new(tmp.path());
        assert_eq!(next_order_key(&source).unwrap(), 5);
    }

    #[test]
    fn next_key_fails_past_the_last_key() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("999_last.json"), "{}").unwrap();

        let err = next_order_key(&DirectorySource::new(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("no order keys left"));
    }
}
