use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use studio_gateway::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Pick up log level/format from the config file when it loads; the
    // command itself reports load errors.
    match config::load_config(&args.config) {
        Ok(cfg) => init_tracing(&cfg.server),
        Err(_) => init_tracing(&config::ServerConfig::default()),
    }

    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => {
            println!("Studio Gateway v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
