//! Feature engines: try-on, logo, UI mockup and media analysis
//!
//! Each engine call follows the same lifecycle:
//!
//! 1. create a `pending` entry in the request log with descriptive metadata
//! 2. run exactly one provider call through the shared [`Throttler`]
//! 3. finalize the entry to `success` or `error` with the elapsed time
//!
//! The gate and the log never talk to each other; only the call order ties
//! them together.

pub mod logo;
pub mod media_analysis;
pub mod try_on;
pub mod ui_mockup;

use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    config::Config,
    error::AppError,
    image_utils::to_data_url,
    metrics,
    observability::{Engine, LogId, LogService, LogUpdate, NewLogEntry},
    providers::{GenerationOutput, GenerationRequest, GenerativeProvider},
    throttler::Throttler,
};

pub use try_on::TryOnRequest;
pub use ui_mockup::UiMockupRequest;

/// Model selection and admission settings shared by all engines
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub image_model: String,
    pub text_model: String,
    pub admission_timeout: Option<Duration>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_model: config.gemini.image_model.clone(),
            text_model: config.gemini.text_model.clone(),
            admission_timeout: config.throttle.admission_timeout(),
        }
    }
}

/// Entry point for all engines; owns handles to the provider, gate and log
pub struct Studio {
    provider: Arc<dyn GenerativeProvider>,
    throttler: Arc<Throttler>,
    logs: LogService,
    settings: EngineSettings,
}

impl Studio {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        throttler: Arc<Throttler>,
        logs: LogService,
        settings: EngineSettings,
    ) -> Self {
        Self {
            provider,
            throttler,
            logs,
            settings,
        }
    }

    pub fn logs(&self) -> &LogService {
        &self.logs
    }

    pub fn throttler(&self) -> &Arc<Throttler> {
        &self.throttler
    }

    /// Run one provider call through the log + gate lifecycle
    async fn dispatch<T, F>(
        &self,
        engine: Engine,
        request_data: Value,
        success_summary: &'static str,
        request: GenerationRequest,
        extract: F,
    ) -> Result<T, AppError>
    where
        T: Send,
        F: FnOnce(GenerationOutput) -> Result<T, AppError> + Send,
    {
        let entry = self.logs.add_log(NewLogEntry::new(engine, request_data));
        let mut pending = PendingEntry::new(&self.logs, entry.id);
        metrics::record_request(engine.label());

        let provider = &self.provider;
        let operation = || async move {
            match AssertUnwindSafe(provider.generate(request)).catch_unwind().await {
                Ok(output) => output.and_then(extract),
                Err(_) => Err(AppError::InternalError(format!(
                    "{} provider call panicked",
                    provider.name()
                ))),
            }
        };

        let result = match self.settings.admission_timeout {
            Some(deadline) => self
                .throttler
                .run_with_deadline(deadline, operation)
                .await
                .map_err(AppError::from)
                .and_then(|output| output),
            None => self.throttler.run(operation).await,
        };

        let elapsed = pending.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        match &result {
            Ok(_) => {
                pending.finish(LogUpdate::success(success_summary, duration_ms));
                metrics::record_duration(engine.label(), "success", elapsed);
                tracing::info!(
                    engine = %engine,
                    log_id = %entry.id,
                    duration_ms,
                    "Engine request completed"
                );
            }
            Err(err) => {
                pending.finish(LogUpdate::error(err.to_string(), duration_ms));
                metrics::record_duration(engine.label(), "error", elapsed);
                metrics::record_error(engine.label(), err.type_name());
                tracing::warn!(
                    engine = %engine,
                    log_id = %entry.id,
                    duration_ms,
                    error = %err,
                    "Engine request failed"
                );
            }
        }

        result
    }
}

/// Finalizes a log entry to `error` if the engine call is dropped before it settles
/// (e.g. the HTTP client went away while the request was queued).
struct PendingEntry<'a> {
    logs: &'a LogService,
    id: LogId,
    started: Instant,
    finished: bool,
}

impl<'a> PendingEntry<'a> {
    fn new(logs: &'a LogService, id: LogId) -> Self {
        Self {
            logs,
            id,
            started: Instant::now(),
            finished: false,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn finish(&mut self, update: LogUpdate) {
        self.finished = true;
        self.logs.update_log(self.id, update);
    }
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let duration_ms = self.elapsed().as_millis() as u64;
            self.logs.update_log(
                self.id,
                LogUpdate::error("Request cancelled before completion", duration_ms),
            );
        }
    }
}

/// Turn the first image part into a data URL, or fail with `failure`
fn image_data_url(output: GenerationOutput, failure: &str) -> Result<String, AppError> {
    output
        .first_image()
        .map(|(mime_type, data)| to_data_url(mime_type, data))
        .ok_or_else(|| AppError::EmptyResponse(failure.to_string()))
}


#[cfg(test)]
mod tests {
    use super::testing::{studio, ScriptedProvider};
    use super::*;
    use crate::observability::LogStatus;
    use crate::providers::OutputPart;
    use async_trait::async_trait;

    struct PanickingProvider;

    #[async_trait]
    impl GenerativeProvider for PanickingProvider {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutput, AppError> {
            panic!("provider bug")
        }
    }

    #[tokio::test]
    async fn test_empty_response_marks_entry_error() {
        let provider = ScriptedProvider::returning(vec![OutputPart::Text("no image".to_string())]);
        let studio = studio(provider);

        let err = studio.generate_logo("a fox").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate logo.");

        let entry = &studio.logs().snapshot()[0];
        assert_eq!(entry.status, LogStatus::Error);
        assert_eq!(entry.error_message.as_deref(), Some("Failed to generate logo."));
        assert!(entry.duration.is_some());
        assert_eq!(studio.throttler().stats().active, 0);
    }

    #[tokio::test]
    async fn test_provider_panic_is_reported_as_error() {
        let studio = Studio::new(
            Arc::new(PanickingProvider),
            Arc::new(Throttler::new(1).unwrap()),
            LogService::new(),
            EngineSettings {
                image_model: "image-model".to_string(),
                text_model: "text-model".to_string(),
                admission_timeout: None,
            },
        );

        let err = studio.generate_logo("crash").await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
        assert_eq!(studio.logs().snapshot()[0].status, LogStatus::Error);
        assert_eq!(studio.throttler().stats().active, 0);
    }

    struct HangingProvider;

    #[async_trait]
    impl GenerativeProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutput, AppError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_call_finalizes_entry() {
        let studio = Studio::new(
            Arc::new(HangingProvider),
            Arc::new(Throttler::new(1).unwrap()),
            LogService::new(),
            EngineSettings {
                image_model: "image-model".to_string(),
                text_model: "text-model".to_string(),
                admission_timeout: None,
            },
        );

        {
            let call = studio.generate_logo("abandoned");
            futures::pin_mut!(call);
            // Poll once so the entry is created and the slot taken, then drop the call.
            assert!(futures::poll!(call.as_mut()).is_pending());
            assert_eq!(studio.throttler().stats().active, 1);
        }

        let entry = &studio.logs().snapshot()[0];
        assert_eq!(entry.status, LogStatus::Error);
        assert_eq!(
            entry.error_message.as_deref(),
            Some("Request cancelled before completion")
        );
        assert_eq!(studio.throttler().stats().active, 0);
    }
}
