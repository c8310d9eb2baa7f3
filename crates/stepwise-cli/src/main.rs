use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stepwise_config::FileFormat;
use tracing_subscriber::EnvFilter;

mod commands;
mod report;
mod utils;
use commands::{
    cmd_init, cmd_install, cmd_latest, cmd_new, cmd_schema, cmd_status, cmd_version,
};

/// stepwise command-line interface.
#[derive(Parser, Debug)]
#[command(name = "stepwise", author, version, about)]
struct Cli {
    /// Print each migration step as it runs.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize stepwise.json with defaults.
    Init,
    /// Create the next migration unit file.
    New {
        /// Unit name, e.g. "create_users".
        name: String,
        /// File format (defaults to the configured unit format).
        #[arg(short = 'f', long = "format", value_enum)]
        format: Option<FileFormat>,
        /// Comment stored in the unit file.
        #[arg(short = 'm', long = "message")]
        message: Option<String>,
    },
    /// Show configuration, stored version and applied/pending units.
    Status,
    /// Migrate to the newest unit.
    Install,
    /// Migrate to the configured target version.
    Latest,
    /// Migrate to a specific version.
    Version {
        /// Target version; 0 reverts every unit.
        target: u32,
    },
    /// Print the JSON Schema of stepwise.json.
    Schema,
}

fn init_logging(verbose: bool) {
    // RUST_LOG takes precedence over --verbose.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match cli.command {
        Some(Commands::Init) => cmd_init(),
        Some(Commands::New {
            name,
            format,
            message,
        }) => cmd_new(name, format, message),
        Some(Commands::Status) => cmd_status(),
        Some(Commands::Install) => cmd_install(verbose),
        Some(Commands::Latest) => cmd_latest(verbose),
        Some(Commands::Version { target }) => cmd_version(target, verbose),
        Some(Commands::Schema) => cmd_schema(),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
