use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::time::Duration;

use crate::throttler::ThrottleError;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Configuration error
    ConfigError(String),
    /// Missing or malformed request field
    BadRequest(String),
    /// Inline payload could not be decoded
    ConversionError(String),
    /// Upstream API error
    UpstreamError { status: StatusCode, message: String },
    /// Provider answered, but without an image or text part
    EmptyResponse(String),
    /// No admission slot freed up before the configured deadline
    AdmissionTimeout(Duration),
    /// Internal server error
    InternalError(String),
    /// HTTP request error
    HttpRequest(reqwest::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::BadRequest(msg) => write!(f, "{}", msg),
            Self::ConversionError(msg) => write!(f, "Conversion error: {}", msg),
            Self::UpstreamError { status, message } => {
                write!(f, "Upstream error ({}): {}", status, message)
            }
            Self::EmptyResponse(msg) => write!(f, "{}", msg),
            Self::AdmissionTimeout(waited) => write!(
                f,
                "Server busy: no capacity became available within {}s",
                waited.as_secs_f64()
            ),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
            Self::HttpRequest(err) => write!(f, "HTTP request error: {}", err),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ConversionError(_) => StatusCode::BAD_REQUEST,
            Self::AdmissionTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConfigError(_)
            | Self::UpstreamError { .. }
            | Self::EmptyResponse(_)
            | Self::InternalError(_)
            | Self::HttpRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "config_error",
            Self::BadRequest(_) => "bad_request",
            Self::ConversionError(_) => "conversion_error",
            Self::UpstreamError { .. } => "upstream_error",
            Self::EmptyResponse(_) => "empty_response",
            Self::AdmissionTimeout(_) => "admission_timeout",
            Self::InternalError(_) => "internal_error",
            Self::HttpRequest(_) => "http_request_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Validation failures answer `{error}`; engine and server failures add `success: false`
        let body = if status == StatusCode::BAD_REQUEST {
            json!({ "error": self.to_string() })
        } else {
            json!({
                "success": false,
                "error": self.to_string(),
            })
        };

        (status, Json(body)).into_response()
    }
}

// Implement conversions from common error types
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // The message ends up in the public request log
        Self::HttpRequest(err.without_url())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConversionError(format!("JSON error: {}", err))
    }
}

impl From<ThrottleError> for AppError {
    fn from(err: ThrottleError) -> Self {
        match err {
            ThrottleError::AdmissionTimeout(waited) => Self::AdmissionTimeout(waited),
            ThrottleError::ZeroLimit => Self::ConfigError(err.to_string()),
        }
    }
}
