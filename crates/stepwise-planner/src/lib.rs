pub mod plan;
pub mod repository;

pub use plan::{MigrationPlan, plan_migration};
pub use repository::{ResolvedUnit, UnitRepository};
