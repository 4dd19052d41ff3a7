// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution event union, tagged by `type` on the wire

use crate::engine::ExecutionError;
use crate::id::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event kinds, matching the wire tags used by the dashboard stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Success,
    Failure,
    Timeout,
    Retry,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Start,
        EventKind::Success,
        EventKind::Failure,
        EventKind::Timeout,
        EventKind::Retry,
    ];

    /// Terminal kinds settle a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Success | EventKind::Failure | EventKind::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "job:start",
            EventKind::Success => "job:success",
            EventKind::Failure => "job:failure",
            EventKind::Timeout => "job:timeout",
            EventKind::Retry => "job:retry",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One event in a run's lifecycle.
///
/// Events for a single run are strictly ordered
/// `start → (retry)* → (success | failure | timeout)`; across runs there is
/// no ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    #[serde(rename = "job:start", rename_all = "camelCase")]
    Start {
        job_id: String,
        run_id: RunId,
        timestamp: DateTime<Utc>,
        attempt: u32,
    },
    #[serde(rename = "job:success", rename_all = "camelCase")]
    Success {
        job_id: String,
        run_id: RunId,
        timestamp: DateTime<Utc>,
        attempt: u32,
        #[serde(rename = "duration")]
        duration_ms: i64,
    },
    #[serde(rename = "job:failure", rename_all = "camelCase")]
    Failure {
        job_id: String,
        run_id: RunId,
        timestamp: DateTime<Utc>,
        attempt: u32,
        #[serde(rename = "duration")]
        duration_ms: i64,
        error: ExecutionError,
    },
    #[serde(rename = "job:timeout", rename_all = "camelCase")]
    Timeout {
        job_id: String,
        run_id: RunId,
        timestamp: DateTime<Utc>,
        attempt: u32,
        #[serde(rename = "duration")]
        duration_ms: i64,
        error: ExecutionError,
    },
    #[serde(rename = "job:retry", rename_all = "camelCase")]
    Retry {
        job_id: String,
        run_id: RunId,
        timestamp: DateTime<Utc>,
        /// The attempt that just failed
        attempt: u32,
        error: ExecutionError,
    },
}

impl ExecutionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ExecutionEvent::Start { .. } => EventKind::Start,
            ExecutionEvent::Success { .. } => EventKind::Success,
            ExecutionEvent::Failure { .. } => EventKind::Failure,
            ExecutionEvent::Timeout { .. } => EventKind::Timeout,
            ExecutionEvent::Retry { .. } => EventKind::Retry,
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            ExecutionEvent::Start { job_id, .. }
            | ExecutionEvent::Success { job_id, .. }
            | ExecutionEvent::Failure { job_id, .. }
            | ExecutionEvent::Timeout { job_id, .. }
            | ExecutionEvent::Retry { job_id, .. } => job_id,
        }
    }

    pub fn run_id(&self) -> &RunId {
        match self {
            ExecutionEvent::Start { run_id, .. }
            | ExecutionEvent::Success { run_id, .. }
            | ExecutionEvent::Failure { run_id, .. }
            | ExecutionEvent::Timeout { run_id, .. }
            | ExecutionEvent::Retry { run_id, .. } => run_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ExecutionEvent::Start { timestamp, .. }
            | ExecutionEvent::Success { timestamp, .. }
            | ExecutionEvent::Failure { timestamp, .. }
            | ExecutionEvent::Timeout { timestamp, .. }
            | ExecutionEvent::Retry { timestamp, .. } => *timestamp,
        }
    }

    pub fn attempt(&self) -> u32 {
        match self {
            ExecutionEvent::Start { attempt, .. }
            | ExecutionEvent::Success { attempt, .. }
            | ExecutionEvent::Failure { attempt, .. }
            | ExecutionEvent::Timeout { attempt, .. }
            | ExecutionEvent::Retry { attempt, .. } => *attempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_wire_names() {
        let event = ExecutionEvent::Success {
            job_id: "reports/daily".to_string(),
            run_id: RunId("run_1_abcdefghi".to_string()),
            timestamp: Utc::now(),
            attempt: 2,
            duration_ms: 1500,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "job:success");
        assert_eq!(json["jobId"], "reports/daily");
        assert_eq!(json["runId"], "run_1_abcdefghi");
        assert_eq!(json["attempt"], 2);
        assert_eq!(json["duration"], 1500);
    }

    #[test]
    fn terminal_kinds() {
        assert!(EventKind::Success.is_terminal());
        assert!(EventKind::Failure.is_terminal());
        assert!(EventKind::Timeout.is_terminal());
        assert!(!EventKind::Start.is_terminal());
        assert!(!EventKind::Retry.is_terminal());
    }
}
