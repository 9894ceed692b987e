//! HTTP handlers
//!
//! - health: liveness probe
//! - engines: the four studio endpoints
//! - logs: request log snapshot, live log stream and throttle stats
//! - metrics_handler: Prometheus scrape endpoint

pub mod engines;
pub mod health;
pub mod logs;
pub mod metrics_handler;

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{engines::Studio, signals::ShutdownSignal};

/// Shared state for every `/api` route
#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<Studio>,
    /// Live streams end when this fires
    pub shutdown: broadcast::Sender<ShutdownSignal>,
}

impl AppState {
    pub fn new(studio: Arc<Studio>, shutdown: broadcast::Sender<ShutdownSignal>) -> Self {
        Self { studio, shutdown }
    }
}
