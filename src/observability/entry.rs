//! Log entry types for the request log

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Feature that issued an outbound AI call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "VTO Bubble")]
    TryOn,
    #[serde(rename = "Logo Forge")]
    Logo,
    #[serde(rename = "UI Designer")]
    UiMockup,
    #[serde(rename = "Media Analyzer")]
    MediaAnalysis,
}

impl Engine {
    pub fn label(self) -> &'static str {
        match self {
            Self::TryOn => "VTO Bubble",
            Self::Logo => "Logo Forge",
            Self::UiMockup => "UI Designer",
            Self::MediaAnalysis => "Media Analyzer",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Pending,
    Success,
    Error,
}

impl LogStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Process-local entry identifier, issued from a monotonically increasing counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub u64);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One outbound operation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogId,
    /// Creation time, Unix milliseconds
    pub timestamp: i64,
    pub engine: Engine,
    pub status: LogStatus,
    /// Descriptive metadata only (sizes, flags, prompt text), never raw payloads
    pub request_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Elapsed milliseconds, set on the terminal transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// Caller-supplied part of a new entry; id, timestamp and status are assigned by the log
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub engine: Engine,
    pub request_data: Value,
}

impl NewLogEntry {
    pub fn new(engine: Engine, request_data: Value) -> Self {
        Self {
            engine,
            request_data,
        }
    }
}

/// Partial update merged into an existing entry; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogUpdate {
    pub status: Option<LogStatus>,
    pub response_data: Option<Value>,
    pub error_message: Option<String>,
    pub duration: Option<u64>,
}

impl LogUpdate {
    pub fn success(response_data: impl Into<Value>, duration: u64) -> Self {
        Self {
            status: Some(LogStatus::Success),
            response_data: Some(response_data.into()),
            error_message: None,
            duration: Some(duration),
        }
    }

    pub fn error(message: impl Into<String>, duration: u64) -> Self {
        Self {
            status: Some(LogStatus::Error),
            response_data: None,
            error_message: Some(message.into()),
            duration: Some(duration),
        }
    }

    pub(crate) fn apply(self, entry: &mut LogEntry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(response_data) = self.response_data {
            entry.response_data = Some(response_data);
        }
        if let Some(error_message) = self.error_message {
            entry.error_message = Some(error_message);
        }
        if let Some(duration) = self.duration {
            entry.duration = Some(duration);
        }
    }
}
