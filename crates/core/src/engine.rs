// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution engine: run one job to a terminal result
//!
//! A run is one or more sequential attempts. Each attempt races the handler
//! against the per-attempt timeout; failures retry with linear or
//! exponential backoff until attempts are exhausted. Every lifecycle
//! transition is emitted on the event bus, and the terminal outcome is
//! reified into an [`ExecutionResult`]; nothing thrown by a handler or
//! callback escapes `run`.

use crate::clock::{Clock, SystemClock};
use crate::events::{EventBus, ExecutionEvent};
use crate::id::RunId;
use crate::job::{Backoff, CancelSignal, JobContext, JobRecord, RetryConfig, DEFAULT_INITIAL_DELAY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How long the engine waits after a timeout for a handler to observe its
/// cancellation signal before detaching the attempt task.
const TIMEOUT_GRACE: Duration = Duration::from_millis(50);

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
    Timeout,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
            RunStatus::Timeout => "timeout",
        };
        write!(f, "{}", s)
    }
}

/// A handler failure captured for results and events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    fn from_handler(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::new(err.to_string())
    }

    fn from_join(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| payload.downcast_ref::<&str>().copied())
                .unwrap_or("opaque panic payload");
            Self::new(format!("handler panicked: {}", message))
        } else {
            Self::new("handler task was cancelled")
        }
    }

    fn timed_out(job_name: &str, timeout: Duration) -> Self {
        Self::new(format!(
            "Job '{}' timed out after {}ms",
            job_name,
            timeout.as_millis()
        ))
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExecutionError {}

/// Terminal outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub job_id: String,
    pub run_id: RunId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_ms: i64,
    /// Attempt number of the terminal outcome
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    /// Synthetic failure returned when the worker declines a fire during
    /// shutdown. No attempt ran, so `attempt` is 0.
    pub(crate) fn shutdown_rejected(job_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.to_string(),
            run_id: RunId::skipped(now),
            status: RunStatus::Failure,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            attempt: 0,
            error: Some(ExecutionError::new("Scheduler is shutting down")),
        }
    }
}

struct AttemptFailure {
    error: ExecutionError,
    timed_out: bool,
}

/// Runs jobs to completion. Re-entrant; carries no per-run state.
pub struct Engine<C: Clock = SystemClock> {
    bus: EventBus,
    clock: C,
}

impl Engine<SystemClock> {
    pub fn new(bus: EventBus) -> Self {
        Self::with_clock(bus, SystemClock)
    }
}

impl<C: Clock> Engine<C> {
    pub fn with_clock(bus: EventBus, clock: C) -> Self {
        Self { bus, clock }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run a job now, as if fired at this instant
    pub async fn run(&self, job: &JobRecord) -> ExecutionResult {
        let now = self.clock.now();
        self.run_fired(job, RunId::generate(now), now).await
    }

    /// Run a job for a specific fire, with the run id chosen by the caller
    /// (the worker keys its in-flight table by run id before the run starts)
    pub async fn run_fired(
        &self,
        job: &JobRecord,
        run_id: RunId,
        scheduled_at: DateTime<Utc>,
    ) -> ExecutionResult {
        let started_at = self.clock.now();
        let timeout = job.config.timeout_duration();
        let max_attempts = job.config.max_attempts();

        tracing::info!(job_id = %job.id, run_id = %run_id, "run started");
        self.bus.emit(&ExecutionEvent::Start {
            job_id: job.id.clone(),
            run_id: run_id.clone(),
            timestamp: started_at,
            attempt: 1,
        });

        let mut attempt = 1u32;
        loop {
            let (cancel_tx, signal) = CancelSignal::new();
            let ctx = JobContext {
                job_id: job.id.clone(),
                job_name: job.name.clone(),
                run_id: run_id.clone(),
                scheduled_at,
                started_at: self.clock.now(),
                attempt,
                signal,
            };

            match self.run_attempt(job, &ctx, timeout, cancel_tx).await {
                Ok(()) => {
                    let completed_at = self.clock.now();
                    let result = ExecutionResult {
                        job_id: job.id.clone(),
                        run_id: run_id.clone(),
                        status: RunStatus::Success,
                        started_at,
                        completed_at,
                        duration_ms: (completed_at - started_at).num_milliseconds(),
                        attempt,
                        error: None,
                    };
                    tracing::info!(
                        job_id = %job.id,
                        run_id = %run_id,
                        attempt,
                        duration_ms = result.duration_ms,
                        "run succeeded"
                    );
                    self.bus.emit(&ExecutionEvent::Success {
                        job_id: job.id.clone(),
                        run_id: run_id.clone(),
                        timestamp: completed_at,
                        attempt,
                        duration_ms: result.duration_ms,
                    });
                    self.invoke_on_success(job, &ctx);
                    return result;
                }
                Err(failure) => {
                    if attempt < max_attempts {
                        tracing::warn!(
                            job_id = %job.id,
                            run_id = %run_id,
                            attempt,
                            error = %failure.error,
                            "attempt failed, retrying"
                        );
                        self.bus.emit(&ExecutionEvent::Retry {
                            job_id: job.id.clone(),
                            run_id: run_id.clone(),
                            timestamp: self.clock.now(),
                            attempt,
                            error: failure.error.clone(),
                        });
                        tokio::time::sleep(retry_delay(attempt, job.config.retry.as_ref())).await;
                        attempt += 1;
                        continue;
                    }

                    let completed_at = self.clock.now();
                    let status = if failure.timed_out {
                        RunStatus::Timeout
                    } else {
                        RunStatus::Failure
                    };
                    let result = ExecutionResult {
                        job_id: job.id.clone(),
                        run_id: run_id.clone(),
                        status,
                        started_at,
                        completed_at,
                        duration_ms: (completed_at - started_at).num_milliseconds(),
                        attempt,
                        error: Some(failure.error.clone()),
                    };
                    tracing::warn!(
                        job_id = %job.id,
                        run_id = %run_id,
                        attempt,
                        status = %status,
                        error = %failure.error,
                        "run settled with failure"
                    );
                    let event = if failure.timed_out {
                        ExecutionEvent::Timeout {
                            job_id: job.id.clone(),
                            run_id: run_id.clone(),
                            timestamp: completed_at,
                            attempt,
                            duration_ms: result.duration_ms,
                            error: failure.error.clone(),
                        }
                    } else {
                        ExecutionEvent::Failure {
                            job_id: job.id.clone(),
                            run_id: run_id.clone(),
                            timestamp: completed_at,
                            attempt,
                            duration_ms: result.duration_ms,
                            error: failure.error.clone(),
                        }
                    };
                    self.bus.emit(&event);
                    self.invoke_on_failure(job, &failure.error, &ctx);
                    return result;
                }
            }
        }
    }

    /// One attempt: the handler races the per-attempt timer. On timeout the
    /// cancellation signal fires and the task gets a short grace window
    /// before being detached, so the engine never blocks on a handler that
    /// ignores its signal.
    async fn run_attempt(
        &self,
        job: &JobRecord,
        ctx: &JobContext,
        timeout: Duration,
        cancel_tx: watch::Sender<bool>,
    ) -> Result<(), AttemptFailure> {
        let handler = Arc::clone(&job.handler);
        let handler_ctx = ctx.clone();
        let mut task = tokio::spawn(async move { handler.run(handler_ctx).await });

        tokio::select! {
            joined = &mut task => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(AttemptFailure {
                    error: ExecutionError::from_handler(err),
                    timed_out: false,
                }),
                Err(join_err) => Err(AttemptFailure {
                    error: ExecutionError::from_join(join_err),
                    timed_out: false,
                }),
            },
            _ = tokio::time::sleep(timeout) => {
                let _ = cancel_tx.send(true);
                let _ = tokio::time::timeout(TIMEOUT_GRACE, &mut task).await;
                Err(AttemptFailure {
                    error: ExecutionError::timed_out(&job.name, timeout),
                    timed_out: true,
                })
            }
        }
    }

    fn invoke_on_success(&self, job: &JobRecord, ctx: &JobContext) {
        if let Some(callback) = &job.config.on_success {
            if catch_unwind(AssertUnwindSafe(|| callback(ctx))).is_err() {
                tracing::warn!(job_id = %job.id, "onSuccess callback panicked");
            }
        }
    }

    fn invoke_on_failure(&self, job: &JobRecord, error: &ExecutionError, ctx: &JobContext) {
        if let Some(callback) = &job.config.on_failure {
            if catch_unwind(AssertUnwindSafe(|| callback(error, ctx))).is_err() {
                tracing::warn!(job_id = %job.id, "onFailure callback panicked");
            }
        }
    }
}

/// Delay before the retry that follows `attempt`
fn retry_delay(attempt: u32, retry: Option<&RetryConfig>) -> Duration {
    let Some(config) = retry else {
        return DEFAULT_INITIAL_DELAY;
    };
    let base = config.initial_delay_duration();
    match config.backoff {
        Backoff::Linear => base.checked_mul(attempt).unwrap_or(Duration::MAX),
        Backoff::Exponential => 1u32
            .checked_shl(attempt - 1)
            .and_then(|factor| base.checked_mul(factor))
            .unwrap_or(Duration::MAX),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
