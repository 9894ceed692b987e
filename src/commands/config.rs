use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use studio_gateway::config::{self, Config};
use tracing::info;

/// Execute the config show command
///
/// Displays the current configuration with secrets masked
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config(config_path)?;
    let sanitized = sanitize_secrets(&cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&sanitized)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!("Validating configuration file");

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Listen: {}:{}", cfg.server.host, cfg.server.port);
    println!("  Max concurrent AI calls: {}", cfg.throttle.max_concurrent);
    println!("  Gemini API key: {}", mask_api_key(&cfg.gemini.api_key));

    info!("Configuration validation successful");
    Ok(())
}

fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();
    sanitized.gemini.api_key = mask_api_key(&sanitized.gemini.api_key);
    sanitized
}

/// Mask an API key for safe display
///
/// Shows first 7 and last 4 characters
/// Example: "AIzaSyA1234567890abcd" -> "AIzaSyA...abcd"
fn mask_api_key(key: &str) -> String {
    if key.chars().count() <= 11 {
        return "***".to_string();
    }

    let prefix: String = key.chars().take(7).collect();
    let suffix: String = key.chars().skip(key.chars().count() - 4).collect();

    format!("{}...{}", prefix, suffix)
}
