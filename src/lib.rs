pub mod config;
pub mod engines;
pub mod error;
pub mod handlers;
pub mod image_utils;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod providers;
pub mod server;
pub mod signals;
pub mod throttler;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServerConfig;

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over `server.log_level`. `server.log_format = "json"`
/// switches to structured output. Only the first call installs a subscriber.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if server.log_format == "json" {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    if let Err(e) = result {
        eprintln!("Warning: tracing already initialized: {}", e);
    }
}
