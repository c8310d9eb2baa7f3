use stepwise_core::{
    Database, DefaultCatalog, Direction, MessageCatalog, MessageKey, MigrationError, UnitId,
    UnitSource, VersionStore,
};
use stepwise_planner::{MigrationPlan, UnitRepository, plan_migration};

use crate::options::RunnerOptions;
use crate::report::{Report, ReportEvent, TracingReport};

/// Where the runner is in its last (or current) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Validating,
    Executing,
    /// The run finished and every planned step is stored.
    Committed,
    /// The run stopped on an error. Steps completed before it stay stored.
    Failed,
}

/// Successful result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No unit had to run; the version is unchanged.
    NothingToDo { version: u32 },
    Migrated {
        direction: Direction,
        from: u32,
        to: u32,
        steps: usize,
    },
}

impl MigrationOutcome {
    /// Stored version after the run.
    pub fn version(&self) -> u32 {
        match *self {
            MigrationOutcome::NothingToDo { version } => version,
            MigrationOutcome::Migrated { to, .. } => to,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, MigrationOutcome::NothingToDo { .. })
    }
}

/// Moves a database between schema versions.
///
/// `B` is both the database units run against and the store of the applied
/// version; `S` is where units are discovered. A runner is driven through
/// `&mut self`, one run at a time.
pub struct Runner<B, S> {
    backend: B,
    repository: UnitRepository<S>,
    options: RunnerOptions,
    catalog: Box<dyn MessageCatalog>,
    report: Box<dyn Report>,
    state: RunnerState,
    last_error: Option<String>,
}

impl<B, S> Runner<B, S>
where
    B: Database + VersionStore,
    S: UnitSource,
{
    pub fn new(backend: B, source: S, options: RunnerOptions) -> Self {
        Self {
            backend,
            repository: UnitRepository::new(source),
            options,
            catalog: Box::new(DefaultCatalog),
            report: Box::new(TracingReport),
            state: RunnerState::Idle,
            last_error: None,
        }
    }

    /// Render errors and report lines through `catalog`.
    pub fn with_catalog(mut self, catalog: impl MessageCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    /// Send the verbose trace to `report` instead of `tracing`.
    pub fn with_report(mut self, report: impl Report + 'static) -> Self {
        self.report = Box::new(report);
        self
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.options.verbose = verbose;
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Rendered message of the most recent failure, cleared when a run starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn current_version(&mut self) -> Result<u32, MigrationError> {
        Ok(self.backend.get()?)
    }

    /// Valid units in the source, ordered by order key.
    pub fn candidates(&mut self) -> Result<Vec<UnitId>, MigrationError> {
        self.repository.refresh();
        self.repository.list_candidates()
    }

    /// Migrate to the newest unit in the source.
    pub fn install(&mut self) -> Result<MigrationOutcome, MigrationError> {
        self.last_error = None;
        self.repository.refresh();
        match self.repository.latest_key() {
            Ok(key) => self.version(key),
            Err(err) => self.fail(err),
        }
    }

    /// Migrate to the configured target version.
    pub fn latest(&mut self) -> Result<MigrationOutcome, MigrationError> {
        self.version(self.options.target_version)
    }

    /// Migrate to `target`, applying or reverting units one at a time.
    ///
    /// Every unit is validated before the first one runs. After each unit
    /// completes the new version is stored, so a failure part-way leaves the
    /// store at the last completed step.
    pub fn version(&mut self, target: u32) -> Result<MigrationOutcome, MigrationError> {
        self.last_error = None;
        match self.run(target) {
            Ok(outcome) => {
                self.state = RunnerState::Committed;
                Ok(outcome)
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail<T>(&mut self, err: MigrationError) -> Result<T, MigrationError> {
        let message = self.catalog.format_error(&err);
        tracing::warn!(state = ?self.state, "{message}");
        self.state = RunnerState::Failed;
        self.last_error = Some(message);
        Err(err)
    }

    fn run(&mut self, target: u32) -> Result<MigrationOutcome, MigrationError> {
        self.state = RunnerState::Validating;
        self.repository.refresh();

        let current = self.backend.get()?;
        let plan = plan_migration(&mut self.repository, current, target)?;
        tracing::debug!(
            current,
            target,
            direction = %plan.direction,
            steps = plan.len(),
            "validated migration plan"
        );

        if plan.is_empty() {
            let message = self.catalog.format(MessageKey::NothingToDo, &[]);
            self.emit(&ReportEvent::NothingToDo { version: current }, &message);
            return Ok(MigrationOutcome::NothingToDo { version: current });
        }

        self.state = RunnerState::Executing;
        self.execute(&plan)
    }

    fn execute(&mut self, plan: &MigrationPlan) -> Result<MigrationOutcome, MigrationError> {
        let direction = plan.direction;
        let message = format!(
            "{}\n{}",
            self.catalog
                .format(MessageKey::CurrentVersion, &[plan.from.to_string()]),
            self.catalog.format(
                MessageKey::MovingTo,
                &[direction.to_string(), plan.to.to_string()]
            )
        );
        self.emit(
            &ReportEvent::Started {
                current: plan.from,
                direction,
                target: plan.to,
            },
            &message,
        );

        let mut version = plan.from;
        for (index, resolved) in plan.units.iter().enumerate() {
            let unit = resolved.class_name();
            let order_key = resolved.order_key();
            self.emit(
                &ReportEvent::UnitStarted {
                    unit: &unit,
                    order_key,
                    direction,
                },
                &unit,
            );

            let result = match direction {
                Direction::Up => resolved.unit.up(&mut self.backend),
                Direction::Down => resolved.unit.down(&mut self.backend),
            };
            result.map_err(|source| MigrationError::UnitOperationFailed {
                unit: unit.clone(),
                order_key,
                source,
            })?;

            let next = plan.version_after(index);
            self.backend.set(next)?;
            tracing::debug!(unit = %unit, from = version, to = next, "migration step stored");
            self.emit(
                &ReportEvent::UnitFinished {
                    unit: &unit,
                    from: version,
                    to: next,
                },
                &format!("{unit}: {version} -> {next}"),
            );
            version = next;
        }

        let message = self
            .catalog
            .format(MessageKey::AllDone, &[version.to_string()]);
        self.emit(&ReportEvent::Finished { version }, &message);

        Ok(MigrationOutcome::Migrated {
            direction,
            from: plan.from,
            to: version,
            steps: plan.len(),
        })
    }

    fn emit(&mut self, event: &ReportEvent<'_>, message: &str) {
        if self.options.verbose {
            self.report.event(event, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;
    use stepwise_core::{DatabaseError, FnMigration, MapCatalog, MemoryBackend, Registry, UnitError};

    fn sql_unit(up: &str, down: &str) -> FnMigration {
        FnMigration::sql(up, down)
    }

    fn users_registry() -> Registry {
        Registry::new()
            .with(
                "001_create_users",
                sql_unit("CREATE TABLE users (id INTEGER)", "DROP TABLE users"),
            )
            .with(
                "002_add_email",
                sql_unit(
                    "ALTER TABLE users ADD COLUMN email TEXT",
                    "ALTER TABLE users DROP COLUMN email",
                ),
            )
    }

    fn dense_registry(n: u32) -> Registry {
        let mut registry = Registry::new();
        for key in 1..=n {
            registry.register(
                format!("{key:03}_step_{key}"),
                sql_unit(&format!("up {key}"), &format!("down {key}")),
            );
        }
        registry
    }

    fn runner(backend: MemoryBackend, registry: Registry) -> Runner<MemoryBackend, Registry> {
        Runner::new(backend, registry, RunnerOptions::default())
    }

    #[derive(Clone, Default)]
    struct RecordingReport(Rc<RefCell<Vec<String>>>);

    impl Report for RecordingReport {
        fn event(&mut self, _: &ReportEvent<'_>, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    /// Memory backend whose `set` fails once the stored version reaches `limit`.
    struct FlakyStore {
        inner: MemoryBackend,
        limit: u32,
    }

    impl Database for FlakyStore {
        fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
            self.inner.execute_batch(sql)
        }
    }

    impl VersionStore for FlakyStore {
        fn get(&mut self) -> Result<u32, DatabaseError> {
            self.inner.get()
        }

        fn set(&mut self, version: u32) -> Result<(), DatabaseError> {
            if version >= self.limit {
                return Err(DatabaseError::Backend("disk I/O error".into()));
            }
            self.inner.set(version)
        }
    }

    #[test]
    fn up_then_down_scenario() {
        let mut runner = runner(MemoryBackend::new(), users_registry());

        let outcome = runner.version(2).unwrap();
        assert_eq!(
            outcome,
            MigrationOutcome::Migrated {
                direction: Direction::Up,
                from: 0,
                to: 2,
                steps: 2
            }
        );
        assert_eq!(runner.backend().history(), &[1, 2]);
        assert_eq!(
            runner.backend().executed(),
            &[
                "CREATE TABLE users (id INTEGER)".to_string(),
                "ALTER TABLE users ADD COLUMN email TEXT".to_string(),
            ]
        );

        let outcome = runner.version(0).unwrap();
        assert_eq!(outcome.version(), 0);
        assert_eq!(runner.backend().history(), &[1, 2, 1, 0]);
        assert_eq!(
            &runner.backend().executed()[2..],
            &[
                "ALTER TABLE users DROP COLUMN email".to_string(),
                "DROP TABLE users".to_string(),
            ]
        );
        assert_eq!(runner.state(), RunnerState::Committed);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(4)]
    fn equal_version_is_a_noop(#[case] version: u32) {
        let mut runner = runner(MemoryBackend::at_version(version), dense_registry(4));

        for _ in 0..2 {
            let outcome = runner.version(version).unwrap();
            assert_eq!(outcome, MigrationOutcome::NothingToDo { version });
            assert!(outcome.is_noop());
        }
        assert!(runner.backend().history().is_empty());
        assert!(runner.backend().executed().is_empty());
        assert_eq!(runner.state(), RunnerState::Committed);
    }

    #[rstest]
    fn reaches_any_target_one_step_at_a_time(
        #[values(0, 1, 3, 4)] start: u32,
        #[values(0, 1, 2, 4)] target: u32,
    ) {
        let mut runner = runner(MemoryBackend::at_version(start), dense_registry(4));
        let outcome = runner.version(target).unwrap();

        assert_eq!(outcome.version(), target);
        assert_eq!(runner.current_version().unwrap(), target);

        let expected: Vec<u32> = if target > start {
            (start + 1..=target).collect()
        } else {
            (target..start).rev().collect()
        };
        assert_eq!(runner.backend().history(), expected.as_slice());
    }

    #[test]
    fn upward_target_beyond_last_unit_stops_at_last() {
        let registry = Registry::new().with("001_x", sql_unit("up", "down"));
        let mut runner = runner(MemoryBackend::new(), registry);

        let outcome = runner.version(5).unwrap();
        assert_eq!(outcome.version(), 1);
        assert_eq!(runner.backend().history(), &[1]);
        assert!(runner.last_error().is_none());
    }

    #[test]
    fn downward_gap_fails_before_touching_the_store() {
        let registry = Registry::new().with("001_x", sql_unit("up", "down"));
        let mut runner = runner(MemoryBackend::at_version(2), registry);

        let err = runner.version(0).unwrap_err();
        assert!(matches!(err, MigrationError::MissingVersion(2)));
        assert_eq!(runner.current_version().unwrap(), 2);
        assert!(runner.backend().executed().is_empty());
        assert_eq!(runner.state(), RunnerState::Failed);
        assert_eq!(
            runner.last_error(),
            Some("No migration could be found with the version number: 2.")
        );
    }

    #[test]
    fn shared_order_key_runs_nothing() {
        let registry = users_registry().with("002_add_phone", sql_unit("up", "down"));
        let mut runner = runner(MemoryBackend::new(), registry);

        let err = runner.version(2).unwrap_err();
        assert!(matches!(err, MigrationError::AmbiguousVersion(2)));
        assert!(runner.backend().executed().is_empty());
        assert!(runner.backend().history().is_empty());
    }

    #[test]
    fn duplicate_name_runs_nothing() {
        let registry = users_registry().with("003_CREATE_USERS", sql_unit("up", "down"));
        let mut runner = runner(MemoryBackend::new(), registry);

        let err = runner.version(3).unwrap_err();
        assert!(matches!(err, MigrationError::DuplicateName(ref name) if name == "create_users"));
        assert!(runner.backend().executed().is_empty());
        assert_eq!(runner.current_version().unwrap(), 0);
    }

    #[test]
    fn failing_unit_keeps_completed_steps() {
        let registry = users_registry().with(
            "003_broken",
            FnMigration::new(|_| Err(UnitError::other("syntax error")), |_| Ok(())),
        );
        let mut runner = runner(MemoryBackend::new(), registry);

        let err = runner.version(3).unwrap_err();
        match err {
            MigrationError::UnitOperationFailed {
                ref unit,
                order_key,
                ..
            } => {
                assert_eq!(unit, "Migration_Broken");
                assert_eq!(order_key, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.backend().history(), &[1, 2]);
        assert_eq!(runner.current_version().unwrap(), 2);
        assert_eq!(runner.state(), RunnerState::Failed);
        assert_eq!(
            runner.last_error(),
            Some("Migration \"Migration_Broken\" (version 3) failed: syntax error")
        );

        // A later successful run clears the error.
        runner.version(1).unwrap();
        assert!(runner.last_error().is_none());
        assert_eq!(runner.current_version().unwrap(), 1);
    }

    #[test]
    fn store_failure_stops_the_run() {
        let backend = FlakyStore {
            inner: MemoryBackend::new(),
            limit: 2,
        };
        let mut runner = Runner::new(backend, users_registry(), RunnerOptions::default());

        let err = runner.version(2).unwrap_err();
        assert!(matches!(err, MigrationError::Store(_)));
        assert_eq!(runner.backend().inner.history(), &[1]);
        assert_eq!(runner.backend().inner.executed().len(), 2);
    }

    #[test]
    fn install_migrates_to_highest_key() {
        let mut runner = runner(MemoryBackend::new(), dense_registry(3));
        assert_eq!(runner.install().unwrap().version(), 3);
        assert!(runner.install().unwrap().is_noop());
    }

    #[test]
    fn install_without_units_fails() {
        let registry = Registry::new().with("notes", sql_unit("up", "down"));
        let mut runner = runner(MemoryBackend::new(), registry);

        let err = runner.install().unwrap_err();
        assert!(matches!(err, MigrationError::NoMigrationsFound));
        assert_eq!(runner.last_error(), Some("No migrations found."));
        assert_eq!(runner.state(), RunnerState::Failed);
    }

    #[test]
    fn latest_uses_configured_target() {
        let options = RunnerOptions {
            target_version: 2,
            verbose: false,
        };
        let mut runner = Runner::new(MemoryBackend::new(), dense_registry(4), options);
        assert_eq!(runner.latest().unwrap().version(), 2);
        assert_eq!(runner.options().target_version, 2);
    }

    #[test]
    fn verbose_report_traces_each_step() {
        let report = RecordingReport::default();
        let lines = Rc::clone(&report.0);
        let mut runner = runner(MemoryBackend::new(), users_registry()).with_report(report);
        runner.set_verbose(true);

        runner.version(2).unwrap();
        runner.version(2).unwrap();

        assert_eq!(
            *lines.borrow(),
            vec![
                "Current schema version: 0\nMoving up to version 2".to_string(),
                "Migration_Create_users".to_string(),
                "Migration_Create_users: 0 -> 1".to_string(),
                "Migration_Add_email".to_string(),
                "Migration_Add_email: 1 -> 2".to_string(),
                "All done. Schema is at version 2.".to_string(),
                "Nothing to do, bye!".to_string(),
            ]
        );
    }

    #[test]
    fn quiet_runner_reports_nothing() {
        let report = RecordingReport::default();
        let lines = Rc::clone(&report.0);
        let mut runner = runner(MemoryBackend::new(), users_registry()).with_report(report);

        runner.version(2).unwrap();
        assert!(lines.borrow().is_empty());
    }

    #[test]
    fn custom_catalog_renders_errors() {
        let mut catalog = MapCatalog::default();
        catalog.insert(MessageKey::MigrationNotFound, "manque la version {}");
        let registry = Registry::new().with("001_x", sql_unit("up", "down"));
        let mut runner = runner(MemoryBackend::at_version(2), registry).with_catalog(catalog);

        runner.version(0).unwrap_err();
        assert_eq!(runner.last_error(), Some("manque la version 2"));
    }

    #[test]
    fn candidates_lists_valid_units() {
        let registry = users_registry().with("readme", sql_unit("", ""));
        let mut runner = runner(MemoryBackend::new(), registry);
        let names: Vec<String> = runner
            .candidates()
            .unwrap()
            .into_iter()
            .map(|id| id.identifier)
            .collect();
        assert_eq!(names, vec!["001_create_users", "002_add_email"]);
    }

    #[test]
    fn runs_against_sqlite() {
        use stepwise_store::SqliteBackend;

        let backend = SqliteBackend::open_in_memory("schema_version").unwrap();
        let registry = Registry::new()
            .with(
                "001_create_users",
                sql_unit("CREATE TABLE users (id INTEGER PRIMARY KEY)", "DROP TABLE users"),
            )
            .with(
                "002_create_posts",
                sql_unit("CREATE TABLE posts (id INTEGER PRIMARY KEY)", "DROP TABLE posts"),
            );
        let mut runner = Runner::new(backend, registry, RunnerOptions::default());

        assert_eq!(runner.version(2).unwrap().version(), 2);
        let tables: i64 = runner
            .backend()
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'posts')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);

        assert_eq!(runner.version(0).unwrap().version(), 0);
        assert_eq!(runner.current_version().unwrap(), 0);
    }
}
