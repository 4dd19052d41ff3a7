// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job execution history ring

use chrono::{DateTime, Duration, Utc};
use hj_core::{ExecutionError, ExecutionEvent, RunId, RunStatus};
use serde::Serialize;

/// Most recent entries kept per job
pub const HISTORY_LIMIT: usize = 50;

/// Dashboard projection of a job's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Success,
    Failed,
}

impl JobStatus {
    /// Projection rule: running beats history, history beats idle
    pub fn project(in_flight: bool, last: Option<&HistoryEntry>) -> Self {
        if in_flight {
            return JobStatus::Running;
        }
        match last.map(|entry| entry.status) {
            Some(RunStatus::Success) => JobStatus::Success,
            Some(RunStatus::Failure) | Some(RunStatus::Timeout) => JobStatus::Failed,
            None => JobStatus::Idle,
        }
    }
}

/// One settled run as shown in `/api/jobs/{id}/runs`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub run_id: RunId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_ms: i64,
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
}

impl HistoryEntry {
    /// Build an entry from a terminal event; start/retry events yield none
    pub fn from_event(event: &ExecutionEvent) -> Option<(String, Self)> {
        let (status, error) = match event {
            ExecutionEvent::Success { .. } => (RunStatus::Success, None),
            ExecutionEvent::Failure { error, .. } => (RunStatus::Failure, Some(error.clone())),
            ExecutionEvent::Timeout { error, .. } => (RunStatus::Timeout, Some(error.clone())),
            _ => return None,
        };
        let duration_ms = match event {
            ExecutionEvent::Success { duration_ms, .. }
            | ExecutionEvent::Failure { duration_ms, .. }
            | ExecutionEvent::Timeout { duration_ms, .. } => *duration_ms,
            _ => 0,
        };
        let completed_at = event.timestamp();
        Some((
            event.job_id().to_string(),
            Self {
                run_id: event.run_id().clone(),
                status,
                started_at: completed_at - Duration::milliseconds(duration_ms),
                completed_at,
                duration_ms,
                attempt: event.attempt(),
                error,
            },
        ))
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
