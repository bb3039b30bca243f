//! agentdeck CLI entry point.

use clap::Parser;
use std::path::Path;

use agentdeck::cli::{commands, handle_error, Cli, Commands};
use agentdeck::domain::models::Config;
use agentdeck::infrastructure::config::ConfigLoader;
use agentdeck::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init { force } => commands::init::execute(force, json).await,
        Commands::Serve { host, port } => match load(config_path) {
            Ok((config, _logger)) => commands::serve::execute(config, host, port).await,
            Err(err) => Err(err),
        },
        Commands::Migrate => match load(config_path) {
            Ok((config, _logger)) => commands::migrate::execute(&config, json).await,
            Err(err) => Err(err),
        },
    };

    if let Err(err) = result {
        handle_error(err, json);
    }
}

fn load(config_path: Option<&Path>) -> anyhow::Result<(Config, LoggerImpl)> {
    let config = ConfigLoader::load(config_path)?;
    let logger = LoggerImpl::init(&config.logging)?;
    Ok((config, logger))
}
