use anyhow::Result;
use colored::Colorize;
use stepwise_core::{UnitSource, VersionStore, parse_identifier};
use stepwise_loader::{DirectorySource, load_config};

use crate::utils::open_backend;

pub fn cmd_status() -> Result<()> {
    let config = load_config()?;

    println!("{}", "Configuration:".bright_cyan().bold());
    println!(
        "  {} {}",
        "Enabled:".cyan(),
        config.enabled.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Migrations directory:".cyan(),
        config.migrations_dir().bright_white()
    );
    println!(
        "  {} {}",
        "Database:".cyan(),
        config.database().display().to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Version table:".cyan(),
        config.version_table().bright_white()
    );
    println!(
        "  {} {}",
        "Target version:".cyan(),
        config.target_version().to_string().bright_white()
    );
    println!("  {} {:?}", "Unit format:".cyan(), config.unit_format());
    println!();

    // Reading the version must not create the database as a side effect.
    let current = if config.database().exists() {
        let mut backend = open_backend(&config)?;
        Some(backend.get()?)
    } else {
        None
    };
    match current {
        Some(version) => println!(
            "{} {}",
            "Stored version:".bright_cyan().bold(),
            version.to_string().bright_magenta()
        ),
        None => println!(
            "{} {}",
            "Stored version:".bright_cyan().bold(),
            "database not created yet".bright_yellow()
        ),
    }
    println!();

    let source = DirectorySource::from_config(&config, None);
    let identifiers = source.identifiers().map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut units: Vec<_> = identifiers
        .iter()
        .filter_map(|identifier| parse_identifier(identifier))
        .collect();
    units.sort_by_key(|id| id.order_key);

    println!(
        "{} {}",
        "Units:".bright_cyan().bold(),
        units.len().to_string().bright_yellow()
    );
    let applied = current.unwrap_or(0);
    for id in &units {
        let mark = if id.order_key <= applied {
            "applied".bright_green()
        } else {
            "pending".bright_yellow()
        };
        println!(
            "  {} {} ({})",
            "-".bright_white(),
            id.identifier.bright_white(),
            mark
        );
    }
    for identifier in identifiers.iter().filter(|i| parse_identifier(i).is_none()) {
        println!(
            "  {} {} ({})",
            "-".bright_white(),
            identifier.bright_black(),
            "ignored: not NNN_name".bright_red()
        );
    }
    println!();

    match units.last() {
        Some(latest) => println!(
            "{} {}",
            "Latest available:".bright_cyan().bold(),
            latest.order_key.to_string().bright_magenta()
        ),
        None => println!(
            "{} {}",
            "Status:".bright_cyan().bold(),
            "No migration units yet. Run 'stepwise new <name>'.".bright_yellow()
        ),
    }

    Ok(())
}
