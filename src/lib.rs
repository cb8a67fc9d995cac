pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

/// Commands that run against a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Plan {
        output: Option<String>,
        strict: bool,
    },
    Check,
    Symbols,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Balancer starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Plan { output, strict } => {
            let provider = providers::AlphaVantageProvider::new(
                config.alpha_vantage_base_url(),
                &config.alpha_vantage_api_key,
            )?;
            cli::plan::run(&config, &provider, output.as_deref(), strict).await
        }
        AppCommand::Check => cli::check::run(&config),
        AppCommand::Symbols => {
            for symbol in config.all_symbols() {
                println!("{symbol}");
            }
            Ok(())
        }
    }
}
