mod loader;
mod options;
mod report;
mod runtime;

pub use loader::directory_runner;
pub use options::RunnerOptions;
pub use report::{Report, ReportEvent, TracingReport};
pub use runtime::{MigrationOutcome, Runner, RunnerState};
