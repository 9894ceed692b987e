use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use studio_gateway::{config, server};
use tracing::info;

/// Execute the start command
///
/// Loads configuration from `config_path` and runs the server in the
/// foreground until SIGTERM/SIGINT.
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting studio gateway...".green());

    let cfg = config::load_config(config_path)?;
    info!(config = %config_path.display(), "Configuration loaded");

    server::start_server(cfg).await
}
