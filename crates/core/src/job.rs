// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records, configuration, and the handler contract

use crate::duration::parse_duration;
use crate::engine::ExecutionError;
use crate::error::InputError;
use crate::id::RunId;
use crate::schedule::ScheduleDescriptor;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default per-attempt timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// What a handler returns; any error is reified into the run result
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// The work a job performs on each attempt
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, ctx: JobContext) -> HandlerResult;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> JobHandler for FnHandler<F>
where
    F: Fn(JobContext) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn run(&self, ctx: JobContext) -> HandlerResult {
        (self.0)(ctx).await
    }
}

/// Wrap an async closure as a [`JobHandler`]
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn JobHandler>
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Backoff curve between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Linear,
    Exponential,
}

/// Retry policy: total attempts (not retries) and the delay curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Total attempts, at least 1
    pub attempts: u32,
    #[serde(default)]
    pub backoff: Backoff,
    /// Duration string; defaults to `"1s"` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_delay: Option<String>,
}

impl RetryConfig {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            backoff: Backoff::default(),
            initial_delay: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_initial_delay(mut self, delay: impl Into<String>) -> Self {
        self.initial_delay = Some(delay.into());
        self
    }

    pub(crate) fn initial_delay_duration(&self) -> Duration {
        self.initial_delay
            .as_deref()
            .and_then(|s| parse_duration(s).ok())
            .unwrap_or(DEFAULT_INITIAL_DELAY)
    }

    pub(crate) fn validate(&self) -> Result<(), InputError> {
        if self.attempts < 1 {
            return Err(InputError::InvalidRetry(format!(
                "attempts must be at least 1, got {}",
                self.attempts
            )));
        }
        if let Some(delay) = &self.initial_delay {
            parse_duration(delay)?;
        }
        Ok(())
    }
}

/// Success callback, invoked in-line after the terminal success event
pub type OnSuccess = Arc<dyn Fn(&JobContext) + Send + Sync>;
/// Failure callback, invoked in-line after the terminal failure/timeout event
pub type OnFailure = Arc<dyn Fn(&ExecutionError, &JobContext) + Send + Sync>;

/// Per-job configuration supplied alongside the handler
#[derive(Clone, Default)]
pub struct JobConfig {
    /// Human label; defaults to the job id
    pub name: Option<String>,
    pub retry: Option<RetryConfig>,
    /// Per-attempt timeout as a duration string; default is 5 minutes
    pub timeout: Option<String>,
    pub on_success: Option<OnSuccess>,
    pub on_failure: Option<OnFailure>,
}

impl JobConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&JobContext) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ExecutionError, &JobContext) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(callback));
        self
    }

    /// Per-attempt timeout, falling back to the 5-minute default
    pub(crate) fn timeout_duration(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(|s| parse_duration(s).ok())
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Total attempts; 1 when no retry is configured
    pub(crate) fn max_attempts(&self) -> u32 {
        self.retry.as_ref().map(|r| r.attempts.max(1)).unwrap_or(1)
    }

    pub(crate) fn validate(&self) -> Result<(), InputError> {
        if let Some(timeout) = &self.timeout {
            parse_duration(timeout)?;
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobConfig")
            .field("name", &self.name)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// A registered job: schedule, config, and handler
#[derive(Clone)]
pub struct JobRecord {
    /// Unique id, derived from the source file path or the config name
    pub id: String,
    pub name: String,
    pub schedule: ScheduleDescriptor,
    pub config: JobConfig,
    pub handler: Arc<dyn JobHandler>,
    /// Source reference for jobs produced by file discovery
    pub file_path: Option<PathBuf>,
}

impl JobRecord {
    pub fn new(
        id: impl Into<String>,
        schedule: ScheduleDescriptor,
        config: JobConfig,
        handler: Arc<dyn JobHandler>,
    ) -> Self {
        let id = id.into();
        let name = config.name.clone().unwrap_or_else(|| id.clone());
        Self {
            id,
            name,
            schedule,
            config,
            handler,
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

impl fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("config", &self.config)
            .field("file_path", &self.file_path)
            .finish()
    }
}

/// Cancellation signal handed to each attempt; fires on timeout
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub(crate) fn new() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve when cancellation is requested
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Per-attempt context passed to the handler and callbacks
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: String,
    pub job_name: String,
    pub run_id: RunId,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    /// 1-based attempt number
    pub attempt: u32,
    pub signal: CancelSignal,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
