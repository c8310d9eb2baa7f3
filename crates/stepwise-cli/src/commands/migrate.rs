use anyhow::Result;
use colored::Colorize;
use stepwise_core::MigrationError;
use stepwise_loader::load_config;
use stepwise_runner::MigrationOutcome;

use crate::utils::{CliRunner, open_runner};

pub fn cmd_install(verbose: bool) -> Result<()> {
    run(verbose, |runner| runner.install())
}

pub fn cmd_latest(verbose: bool) -> Result<()> {
    run(verbose, |runner| runner.latest())
}

pub fn cmd_version(target: u32, verbose: bool) -> Result<()> {
    run(verbose, |runner| runner.version(target))
}

fn run(
    verbose: bool,
    op: impl FnOnce(&mut CliRunner) -> Result<MigrationOutcome, MigrationError>,
) -> Result<()> {
    let config = load_config()?;
    let verbose = verbose || config.verbose;
    let mut runner = open_runner(&config, verbose)?;

    match op(&mut runner) {
        Ok(outcome) => {
            if !verbose {
                print_outcome(&outcome);
            }
            Ok(())
        }
        Err(err) => {
            let message = runner
                .last_error()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            if err.is_validation() {
                tracing::debug!("validation failed before any unit ran");
            } else if let Ok(version) = runner.current_version() {
                eprintln!(
                    "{} {}",
                    "Schema version is now".bright_yellow(),
                    version.to_string().bright_magenta()
                );
            }
            Err(anyhow::anyhow!(message))
        }
    }
}

fn print_outcome(outcome: &MigrationOutcome) {
    match *outcome {
        MigrationOutcome::NothingToDo { version } => println!(
            "{} {}",
            "Nothing to do. Schema is at version".bright_yellow(),
            version.to_string().bright_magenta()
        ),
        MigrationOutcome::Migrated {
            direction,
            from,
            to,
            steps,
        } => println!(
            "{} {} {} {} {} ({} {})",
            "Migrated".bright_green().bold(),
            direction.to_string().bright_blue(),
            from.to_string().bright_magenta(),
            "->".bright_white(),
            to.to_string().bright_magenta(),
            steps.to_string().bright_yellow(),
            if steps == 1 { "unit" } else { "units" }
        ),
    }
}
