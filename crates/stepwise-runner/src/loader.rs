use std::path::Path;

use stepwise_config::StepwiseConfig;
use stepwise_core::{Database, MigrationError, VersionStore};
use stepwise_loader::{DirectorySource, load_catalog};

use crate::options::RunnerOptions;
use crate::runtime::Runner;

/// Build a runner over the configured migrations directory.
///
/// Paths in `config` are resolved against `project_root` when one is given.
/// A disabled or broken configuration, or an unreadable message catalog, is
/// reported as [`MigrationError::MisconfiguredRunner`] before anything runs.
pub fn directory_runner<B>(
    config: &StepwiseConfig,
    project_root: Option<&Path>,
    backend: B,
) -> Result<Runner<B, DirectorySource>, MigrationError>
where
    B: Database + VersionStore,
{
    config
        .check()
        .map_err(|e| MigrationError::MisconfiguredRunner(e.to_string()))?;

    let source = DirectorySource::from_config(config, project_root);
    tracing::debug!(dir = %source.dir().display(), "loading migrations from directory");

    let runner = Runner::new(backend, source, RunnerOptions::from_config(config));

    let Some(messages) = &config.messages else {
        return Ok(runner);
    };
    let path = match project_root {
        Some(root) => root.join(messages),
        None => messages.clone(),
    };
    let catalog =
        load_catalog(&path).map_err(|e| MigrationError::MisconfiguredRunner(format!("{e:#}")))?;
    Ok(runner.with_catalog(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stepwise_core::MemoryBackend;
    use tempfile::TempDir;

    fn write_unit(dir: &Path, file: &str, up: &str, down: &str) {
        fs::create_dir_all(dir).unwrap();
        let body = format!(r#"{{"up": ["{up}"], "down": ["{down}"]}}"#);
        fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn runs_units_from_configured_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db/migrations");
        write_unit(&dir, "001_create_users.json", "CREATE TABLE users", "DROP TABLE users");
        fs::write(
            dir.join("002_add_email.yaml"),
            "up:\n  - ALTER TABLE users ADD email\ndown:\n  - ALTER TABLE users DROP email\n",
        )
        .unwrap();

        let config = StepwiseConfig {
            migrations_dir: "db/migrations".into(),
            version: 2,
            ..Default::default()
        };
        let mut runner =
            directory_runner(&config, Some(tmp.path()), MemoryBackend::new()).unwrap();

        assert_eq!(runner.latest().unwrap().version(), 2);
        assert_eq!(
            runner.backend().executed(),
            &[
                "CREATE TABLE users".to_string(),
                "ALTER TABLE users ADD email".to_string(),
            ]
        );
    }

    #[test]
    fn each_run_reloads_edited_unit_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("migrations");
        write_unit(&dir, "001_users.json", "OLD UP", "OLD DOWN");

        let config = StepwiseConfig::default();
        let mut runner =
            directory_runner(&config, Some(tmp.path()), MemoryBackend::new()).unwrap();
        runner.version(1).unwrap();

        write_unit(&dir, "001_users.json", "NEW UP", "NEW DOWN");
        runner.version(0).unwrap();

        assert_eq!(
            runner.backend().executed(),
            &["OLD UP".to_string(), "NEW DOWN".to_string()]
        );
    }

    #[test]
    fn each_run_rechecks_edited_unit_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("migrations");
        write_unit(&dir, "001_users.json", "UP", "DOWN");

        let config = StepwiseConfig::default();
        let mut runner =
            directory_runner(&config, Some(tmp.path()), MemoryBackend::new()).unwrap();
        runner.version(1).unwrap();

        fs::write(dir.join("001_users.json"), r#"{"up": ["UP"]}"#).unwrap();
        let err = runner.version(0).unwrap_err();

        assert!(matches!(err, MigrationError::UnitNotExecutable(ref unit) if unit == "Migration_Users"));
        assert_eq!(runner.current_version().unwrap(), 1);
    }

    #[test]
    fn disabled_config_is_rejected() {
        let config = StepwiseConfig {
            enabled: false,
            ..Default::default()
        };
        let err = directory_runner(&config, None, MemoryBackend::new())
            .err()
            .unwrap();
        assert!(matches!(err, MigrationError::MisconfiguredRunner(ref r) if r.contains("disabled")));
    }

    #[test]
    fn empty_migrations_dir_is_rejected() {
        let config = StepwiseConfig {
            migrations_dir: " ".into(),
            ..Default::default()
        };
        let err = directory_runner(&config, None, MemoryBackend::new())
            .err()
            .unwrap();
        assert!(matches!(err, MigrationError::MisconfiguredRunner(_)));
    }

    #[test]
    fn loads_message_catalog() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("messages.json"),
            r#"{"no_migrations_found": "Aucune migration."}"#,
        )
        .unwrap();

        let config = StepwiseConfig {
            messages: Some("messages.json".into()),
            ..Default::default()
        };
        let mut runner =
            directory_runner(&config, Some(tmp.path()), MemoryBackend::new()).unwrap();

        runner.install().unwrap_err();
        assert_eq!(runner.last_error(), Some("Aucune migration."));
    }

    #[test]
    fn missing_message_catalog_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let config = StepwiseConfig {
            messages: Some("missing.json".into()),
            ..Default::default()
        };
        let err = directory_runner(&config, Some(tmp.path()), MemoryBackend::new())
            .err()
            .unwrap();
        assert!(matches!(err, MigrationError::MisconfiguredRunner(ref r) if r.contains("missing.json")));
    }
}
