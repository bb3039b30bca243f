//! Implementation of the `agentdeck init` command.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::setup::{create_config_file, open_database, SetupPaths};

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
    pub database: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        format!(
            "{}\n\nConfig:   {}\nDatabase: {}",
            self.message,
            self.config_file.display(),
            self.database
        )
    }
}

pub async fn execute(force: bool, json_mode: bool) -> Result<()> {
    let paths = SetupPaths::new()?;
    let already_initialized = paths.is_initialized();

    create_config_file(&paths, force)?;

    let config = ConfigLoader::load(Some(paths.config_file.as_path()))?;
    let pool = open_database(&config).await?;
    pool.close().await;

    let message = match (already_initialized, force) {
        (true, true) => "Project reinitialized.",
        (true, false) => "Project already initialized; pending migrations applied.",
        (false, _) => "Project initialized.",
    };

    output(
        &InitOutput {
            success: true,
            message: message.to_string(),
            config_file: paths.config_file,
            database: config.database.path,
        },
        json_mode,
    );
    Ok(())
}
