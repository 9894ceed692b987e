//! Request observability for studio-gateway
//!
//! Every engine call is recorded as a [`LogEntry`] that starts `pending` and is
//! finalized to `success` or `error` once the outbound call settles. Observers
//! (the SSE stream, tests, tooling) subscribe to the full log and receive a new
//! snapshot on every change.
//!
//! ## Lifecycle
//!
//! ```text
//! add_log ──▶ pending ──┬──▶ success
//!                       └──▶ error
//! ```
//!
//! Entries live in memory only and are never removed individually.

pub mod entry;
pub mod log_service;

pub use entry::{Engine, LogEntry, LogId, LogStatus, LogUpdate, NewLogEntry};
pub use log_service::{LogService, LogSnapshot, Subscription};
