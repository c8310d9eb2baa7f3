// Re-export the runner and the types needed to drive it
pub use stepwise_runner::{
    MigrationOutcome, Report, ReportEvent, Runner, RunnerOptions, RunnerState, TracingReport,
    directory_runner,
};

pub use stepwise_config::{FileFormat, StepwiseConfig};
pub use stepwise_core::{
    Database, DatabaseError, DefaultCatalog, Direction, FnMigration, MapCatalog, MemoryBackend,
    MessageCatalog, MessageKey, Migration, MigrationError, Registry, UnitError, UnitId,
    UnitSource, VersionStore,
};
pub use stepwise_loader::{DirectorySource, UnitFile};
pub use stepwise_planner::{MigrationPlan, UnitRepository, plan_migration};
pub use stepwise_store::{DatabaseBackend, SqliteBackend, VersionTable};

/// Build a [`Registry`] from `identifier => unit` pairs.
///
/// ```
/// use stepwise::{FnMigration, stepwise_registry};
///
/// let registry = stepwise_registry! {
///     "001_create_users" => FnMigration::sql("CREATE TABLE users (id INTEGER)", "DROP TABLE users"),
///     "002_add_email" => FnMigration::sql(
///         "ALTER TABLE users ADD COLUMN email TEXT",
///         "ALTER TABLE users DROP COLUMN email",
///     ),
/// };
/// assert_eq!(registry.len(), 2);
/// ```
#[macro_export]
macro_rules! stepwise_registry {
    ($( $identifier:expr => $unit:expr ),* $(,)?) => {{
        let mut __registry = $crate::Registry::new();
        $(
            __registry.register($identifier, $unit);
        )*
        __registry
    }};
}
