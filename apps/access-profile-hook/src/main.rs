//! access-profile-hook - local host harness for the Access Profile reconciliation hook
//!
//! Loads the connector configuration, feeds an account update request through
//! the before-update hook and prints the result. `apply` additionally submits
//! the corrective patch to the Access Profiles API.

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod input;

use error::{CliError, CliResult};

/// Access Profile entitlement reconciliation
#[derive(Parser)]
#[command(name = "access-profile-hook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Connector source configuration (JSON). Falls back to ISC_* environment variables.
    #[arg(long, global = true, env = "ACCESS_PROFILE_HOOK_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the before-update hook and print the rewritten update request
    Reconcile(commands::reconcile::ReconcileArgs),

    /// Reconcile and submit the corrective patch to the API
    Apply(commands::apply::ApplyArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    xavyo_connector_access_profile::logging::init_logging(&cli.log_level)
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let config = input::load_config(cli.config.as_deref())?;

    let mut stdout = std::io::stdout();
    match cli.command {
        Commands::Reconcile(args) => {
            commands::reconcile::execute(args, &config, &mut stdout).await
        }
        Commands::Apply(args) => commands::apply::execute(args, &config, &mut stdout).await,
    }
}
