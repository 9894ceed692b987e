//! Bounded-concurrency admission gate for outbound AI calls
//!
//! At most `limit` operations run at once. Callers that arrive while the gate is
//! full wait in a FIFO queue and are admitted strictly in arrival order.
//!
//! ## Invariants
//! - `active` never exceeds `limit`.
//! - A finishing operation either hands its slot to the head of the queue or
//!   frees it, inside one critical section. No other admission decision can
//!   interleave between the two steps.
//! - Slots are owned by an RAII [`Permit`], so success, error and panic paths all
//!   release exactly once.

use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThrottleError {
    #[error("concurrency limit must be at least 1")]
    ZeroLimit,
    #[error("no admission slot became free within {0:?}")]
    AdmissionTimeout(Duration),
}

/// Point-in-time view of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrottleStats {
    pub limit: usize,
    pub active: usize,
    pub queued: usize,
}

struct GateState {
    active: usize,
    // A sender whose receiver is gone belongs to an abandoned caller and is skipped on release.
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl GateState {
    /// Queued callers that are still waiting; abandoned senders are not counted
    fn live_waiters(&self) -> usize {
        self.waiters.iter().filter(|waiter| !waiter.is_closed()).count()
    }
}

pub struct Throttler {
    limit: usize,
    state: Mutex<GateState>,
}

impl Throttler {
    pub fn new(limit: usize) -> Result<Self, ThrottleError> {
        if limit == 0 {
            return Err(ThrottleError::ZeroLimit);
        }

        metrics::update_throttle(limit, 0, 0);

        Ok(Self {
            limit,
            state: Mutex::new(GateState {
                active: 0,
                waiters: VecDeque::new(),
            }),
        })
    }

    pub fn stats(&self) -> ThrottleStats {
        let state = self.lock();
        ThrottleStats {
            limit: self.limit,
            active: state.active,
            queued: state.live_waiters(),
        }
    }

    /// Run `operation` once a slot is free.
    ///
    /// The operation's output is returned untouched, so an `Err` from the
    /// operation reaches the caller exactly as it was produced.
    pub async fn run<F, Fut>(&self, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let _permit = self.acquire().await;
        operation().await
    }

    /// Like [`Throttler::run`], but gives up if no slot frees up within `deadline`.
    ///
    /// The deadline only bounds the time spent queued. An admitted operation is
    /// never interrupted.
    pub async fn run_with_deadline<F, Fut>(
        &self,
        deadline: Duration,
        operation: F,
    ) -> Result<Fut::Output, ThrottleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let permit = tokio::time::timeout(deadline, self.acquire())
            .await
            .map_err(|_| {
                tracing::warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "Admission deadline elapsed while queued"
                );
                ThrottleError::AdmissionTimeout(deadline)
            })?;

        let output = operation().await;
        drop(permit);
        Ok(output)
    }

    async fn acquire(&self) -> Permit<'_> {
        loop {
            let receiver = {
                let mut state = self.lock();
                if state.active < self.limit {
                    state.active += 1;
                    self.publish(&state);
                    return Permit { gate: self };
                }

                let (sender, receiver) = oneshot::channel();
                state.waiters.push_back(sender);
                tracing::debug!(
                    active = state.active,
                    queued = state.live_waiters(),
                    limit = self.limit,
                    "Concurrency limit reached, request queued"
                );
                self.publish(&state);
                receiver
            };

            let mut waiting = Waiting {
                gate: self,
                receiver: Some(receiver),
            };

            let handed_over = match waiting.receiver.as_mut() {
                Some(receiver) => receiver.await.is_ok(),
                None => false,
            };

            // From here on the slot (if any) belongs to the permit, not to the waiter.
            waiting.receiver = None;

            if handed_over {
                return Permit { gate: self };
            }
        }
    }

    fn release(&self) {
        let mut state = self.lock();

        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                // Slot handed to the next waiter; active count is unchanged.
                self.publish(&state);
                return;
            }
        }

        state.active -= 1;
        self.publish(&state);
    }

    fn publish(&self, state: &GateState) {
        metrics::update_throttle(self.limit, state.active, state.live_waiters());
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // The critical sections never panic mid-update, so a poisoned lock still holds consistent state.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Throttler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttler")
            .field("stats", &self.stats())
            .finish()
    }
}

/// One occupied slot. Dropping it releases the slot.
struct Permit<'a> {
    gate: &'a Throttler,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// A queued caller. If the caller's future is dropped after a slot was handed
/// to it but before it could run, the slot is passed on instead of leaking.
struct Waiting<'a> {
    gate: &'a Throttler,
    receiver: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
            if receiver.try_recv().is_ok() {
                self.gate.release();
            } else {
                let state = self.gate.lock();
                self.gate.publish(&state);
            }
        }
    }
}
