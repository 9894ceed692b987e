use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub throttle: ThrottleConfig,
    pub gemini: GeminiConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            body_limit_mb: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleConfig {
    /// Maximum number of AI calls in flight at once
    pub max_concurrent: usize,
    /// Optional bound on time spent queued; unset means wait indefinitely
    pub admission_timeout_seconds: Option<u64>,
}

impl ThrottleConfig {
    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Model used by the image engines (try-on, logo, UI mockup)
    pub image_model: String,
    /// Model used by media analysis
    pub text_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

/// Load configuration: built-in defaults, then the optional TOML file at `path`,
/// then `STUDIO_GATEWAY__*` environment variables.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.log_level", "info")?
        .set_default("server.log_format", "text")?
        .set_default("server.body_limit_mb", 50)?
        .set_default("throttle.max_concurrent", 3)?
        .set_default("gemini.api_key", "")?
        .set_default(
            "gemini.base_url",
            "https://generativelanguage.googleapis.com/v1beta",
        )?
        .set_default("gemini.timeout_seconds", 300)?
        .set_default("gemini.image_model", "gemini-2.5-flash-image")?
        .set_default("gemini.text_model", "gemini-3-flash-preview")?
        .set_default("metrics.enabled", true)?
        .set_default("metrics.endpoint", "/metrics")?
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("STUDIO_GATEWAY").separator("__"))
        .build()?;

    let mut cfg: Config = config.try_deserialize()?;

    if cfg.gemini.api_key.is_empty() {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            cfg.gemini.api_key = key;
        }
    }

    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.throttle.max_concurrent == 0 {
        anyhow::bail!("throttle.max_concurrent must be at least 1");
    }

    if cfg.throttle.admission_timeout_seconds == Some(0) {
        anyhow::bail!("throttle.admission_timeout_seconds must be greater than 0 when set");
    }

    if cfg.gemini.api_key.trim().is_empty() {
        anyhow::bail!("Gemini API key is not configured (set gemini.api_key or GEMINI_API_KEY)");
    }

    if cfg.gemini.image_model.is_empty() || cfg.gemini.text_model.is_empty() {
        anyhow::bail!("Gemini model names cannot be empty");
    }

    if !cfg.gemini.base_url.starts_with("http://") && !cfg.gemini.base_url.starts_with("https://") {
        anyhow::bail!("Invalid gemini.base_url: {}", cfg.gemini.base_url);
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid server.log_format '{}': expected 'text' or 'json'", other),
    }

    if cfg.server.body_limit_mb == 0 {
        anyhow::bail!("server.body_limit_mb must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            body_limit_mb: 50,
        },
        throttle: ThrottleConfig {
            max_concurrent: 3,
            admission_timeout_seconds: None,
        },
        gemini: GeminiConfig {
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_seconds: 300,
            image_model: "gemini-2.5-flash-image".to_string(),
            text_model: "gemini-3-flash-preview".to_string(),
        },
        metrics: MetricsConfig {
            enabled: true,
            endpoint: "/metrics".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_config_accepts_defaults() {
        assert!(validate_config(&create_test_config()).is_ok());
    }

    #[test]
    fn test_validate_config_requires_positive_limit() {
        let mut cfg = create_test_config();
        cfg.throttle.max_concurrent = 0;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_concurrent"));
    }

    #[test]
    fn test_validate_config_requires_api_key() {
        let mut cfg = create_test_config();
        cfg.gemini.api_key = "  ".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key"));
    }

    #[test]
    fn test_validate_config_rejects_zero_admission_timeout() {
        let mut cfg = create_test_config();
        cfg.throttle.admission_timeout_seconds = Some(0);
        assert!(validate_config(&cfg).is_err());

        cfg.throttle.admission_timeout_seconds = Some(30);
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.throttle.admission_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validate_config_rejects_unknown_log_format() {
        let mut cfg = create_test_config();
        cfg.server.log_format = "xml".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_load_config_from_file_with_defaults() {
        let path = std::env::temp_dir().join(format!(
            "studio-gateway-config-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[throttle]\nmax_concurrent = 5\n\n[gemini]\napi_key = \"from-file\"\nimage_model = \"custom-image\""
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.throttle.max_concurrent, 5);
        assert_eq!(cfg.throttle.admission_timeout_seconds, None);
        assert_eq!(cfg.gemini.api_key, "from-file");
        assert_eq!(cfg.gemini.image_model, "custom-image");
        assert_eq!(cfg.gemini.text_model, "gemini-3-flash-preview");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.body_limit_mb, 50);
    }
}
