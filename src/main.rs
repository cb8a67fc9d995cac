use anyhow::Result;
use balancer::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for balancer::AppCommand {
    fn from(cmd: Commands) -> balancer::AppCommand {
        match cmd {
            Commands::Plan { output, strict } => balancer::AppCommand::Plan { output, strict },
            Commands::Check => balancer::AppCommand::Check,
            Commands::Symbols => balancer::AppCommand::Symbols,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch prices and write the buy-list for every account
    Plan {
        /// Write the CSV here instead of the configured output_filename
        #[arg(short, long)]
        output: Option<String>,

        /// Refuse to plan when strategy allocations don't sum to 100%
        #[arg(long)]
        strict: bool,
    },
    /// Check that strategy allocations sum to 100%
    Check,
    /// List every symbol the configuration needs a price for
    Symbols,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => balancer::cli::setup::setup_at_path(path),
            None => balancer::cli::setup::setup(),
        },
        Some(cmd) => balancer::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
