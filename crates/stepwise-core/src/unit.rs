use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::UnitError;
use crate::store::Database;

/// Width of the zero-padded order key at the start of every identifier.
pub const ORDER_KEY_WIDTH: usize = 3;

/// Highest order key representable with [`ORDER_KEY_WIDTH`] digits.
pub const MAX_ORDER_KEY: u32 = 999;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{3})_([A-Za-z0-9_]+)$").expect("identifier grammar is a valid regex")
});

/// Which way a run moves the schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Amount the stored version moves after each completed unit.
    pub fn step(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// Name of the unit operation invoked in this direction.
    pub fn method(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Direction::Up)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// A reversible schema change.
///
/// Units receive the database they migrate as a trait object so the same unit
/// can run against any backend implementing [`Database`].
pub trait Migration {
    fn up(&self, db: &mut dyn Database) -> Result<(), UnitError>;

    fn down(&self, db: &mut dyn Database) -> Result<(), UnitError>;

    /// Whether the unit can run in `direction`.
    ///
    /// Units that only carry one of the two operations return `false` for the
    /// other; the planner refuses to schedule them at all.
    fn supports(&self, direction: Direction) -> bool {
        let _ = direction;
        true
    }
}

type Operation = Box<dyn Fn(&mut dyn Database) -> Result<(), UnitError>>;

/// Unit built from closures.
pub struct FnMigration {
    up: Option<Operation>,
    down: Option<Operation>,
}

impl FnMigration {
    pub fn new(
        up: impl Fn(&mut dyn Database) -> Result<(), UnitError> + 'static,
        down: impl Fn(&mut dyn Database) -> Result<(), UnitError> + 'static,
    ) -> Self {
        Self {
            up: Some(Box::new(up)),
            down: Some(Box::new(down)),
        }
    }

    /// Unit without a down operation. The planner will refuse to run it.
    pub fn up_only(up: impl Fn(&mut dyn Database) -> Result<(), UnitError> + 'static) -> Self {
        Self {
            up: Some(Box::new(up)),
            down: None,
        }
    }

    /// Unit applying and reverting fixed SQL batches.
    pub fn sql(up: impl Into<String>, down: impl Into<String>) -> Self {
        let up = up.into();
        let down = down.into();
        Self::new(
            move |db| Ok(db.execute_batch(&up)?),
            move |db| Ok(db.execute_batch(&down)?),
        )
    }

    fn run(&self, direction: Direction, db: &mut dyn Database) -> Result<(), UnitError> {
        let op = match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        };
        match op {
            Some(op) => op(db),
            None => Err(UnitError::other(format!(
                "unit has no {} operation",
                direction.method()
            ))),
        }
    }
}

impl fmt::Debug for FnMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("up", &self.up.is_some())
            .field("down", &self.down.is_some())
            .finish()
    }
}

impl Migration for FnMigration {
    fn up(&self, db: &mut dyn Database) -> Result<(), UnitError> {
        self.run(Direction::Up, db)
    }

    fn down(&self, db: &mut dyn Database) -> Result<(), UnitError> {
        self.run(Direction::Down, db)
    }

    fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up.is_some(),
            Direction::Down => self.down.is_some(),
        }
    }
}

/// Parsed form of an identifier such as `001_create_users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitId {
    pub order_key: u32,
    /// Lowercased name portion, used for duplicate detection.
    pub name: String,
    /// Identifier exactly as the source collection reported it.
    pub identifier: String,
}

impl UnitId {
    /// Derived name used in reports and messages, e.g. `Migration_Create_users`.
    pub fn class_name(&self) -> String {
        class_name(&self.name)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Parse `identifier` against the `NNN_name` grammar.
///
/// Returns `None` when the identifier does not match; callers decide whether
/// that is a filter or an error.
pub fn parse_identifier(identifier: &str) -> Option<UnitId> {
    let caps = IDENTIFIER.captures(identifier)?;
    let order_key = caps[1].parse().ok()?;
    Some(UnitId {
        order_key,
        name: caps[2].to_lowercase(),
        identifier: identifier.to_string(),
    })
}

/// Prefix every identifier for `order_key` starts with, e.g. `007_`.
pub fn key_prefix(order_key: u32) -> String {
    format!("{:0width$}_", order_key, width = ORDER_KEY_WIDTH)
}

/// `Migration_` followed by the name with its first letter uppercased.
pub fn class_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => format!("Migration_{}{}", first.to_uppercase(), chars.as_str()),
        None => "Migration_".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("001_create_users", 1, "create_users")]
    #[case("042_Add_Email", 42, "add_email")]
    #[case("999_x", 999, "x")]
    #[case("000_seed_2024", 0, "seed_2024")]
    fn parses_valid_identifiers(#[case] raw: &str, #[case] key: u32, #[case] name: &str) {
        let id = parse_identifier(raw).unwrap();
        assert_eq!(id.order_key, key);
        assert_eq!(id.name, name);
        assert_eq!(id.identifier, raw);
    }

    #[rstest]
    #[case("1_short")]
    #[case("0001_too_wide")]
    #[case("001_")]
    #[case("001-dash")]
    #[case("001_has-dash")]
    #[case("001_has space")]
    #[case("abc_letters")]
    #[case("README")]
    fn rejects_invalid_identifiers(#[case] raw: &str) {
        assert!(parse_identifier(raw).is_none());
    }

    #[rstest]
    #[case(0, "000_")]
    #[case(7, "007_")]
    #[case(123, "123_")]
    fn key_prefix_is_zero_padded(#[case] key: u32, #[case] expected: &str) {
        assert_eq!(key_prefix(key), expected);
    }

    #[test]
    fn class_name_capitalizes_first_letter_only() {
        assert_eq!(class_name("create_users"), "Migration_Create_users");
        assert_eq!(class_name("ADD_EMAIL"), "Migration_Add_email");
        assert_eq!(
            parse_identifier("002_add_email").unwrap().class_name(),
            "Migration_Add_email"
        );
    }

    #[test]
    fn fn_migration_runs_sql_batches() {
        use crate::store::MemoryBackend;

        let unit = FnMigration::sql("CREATE TABLE users (id INTEGER)", "DROP TABLE users");
        let mut db = MemoryBackend::new();
        unit.up(&mut db).unwrap();
        unit.down(&mut db).unwrap();
        assert_eq!(db.executed().len(), 2);
        assert!(unit.supports(Direction::Up) && unit.supports(Direction::Down));
    }

    #[test]
    fn up_only_unit_does_not_support_down() {
        use crate::store::MemoryBackend;

        let unit = FnMigration::up_only(|_| Ok(()));
        assert!(unit.supports(Direction::Up));
        assert!(!unit.supports(Direction::Down));

        let err = unit.down(&mut MemoryBackend::new()).unwrap_err();
        assert_eq!(err.to_string(), "unit has no down operation");
    }

    #[test]
    fn direction_step_and_method() {
        assert_eq!(Direction::Up.step(), 1);
        assert_eq!(Direction::Down.step(), -1);
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.method(), "down");
        assert!(Direction::Up.is_up());
    }
}
