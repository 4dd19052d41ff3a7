// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input validation errors raised at build and registration time
//!
//! Every variant carries the offending literal so a job author can see
//! exactly which input was rejected. Runtime execution failures never use
//! this type; they are reified into `ExecutionResult::error` instead.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid duration: '{0}' (expected e.g. \"30s\", \"5m\", \"250ms\")")]
    InvalidDuration(String),

    #[error("invalid interval: '{0}' (expected <positive integer><s|m|h|d|w>)")]
    InvalidInterval(String),

    #[error("invalid time: '{0}' (expected 24-hour \"HH:MM\")")]
    InvalidTime(String),

    #[error("invalid weekday: '{0}' (expected sun, mon, tue, wed, thu, fri, or sat)")]
    InvalidWeekday(String),

    #[error(
        "daily times {0} must share the same hour or same minute \
         (e.g. \"09:00\",\"17:00\" or \"09:15\",\"09:45\")"
    )]
    MixedDailyTimes(String),

    #[error("invalid day of month: {0} (expected 1-31 or \"last-<weekday>\")")]
    InvalidDayOfMonth(String),

    #[error("invalid cron expression: '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("unknown timezone: '{0}' (expected an IANA zone name)")]
    UnknownTimezone(String),

    #[error("invalid retry config: {0}")]
    InvalidRetry(String),

    #[error("job '{0}' is already registered")]
    DuplicateJob(String),
}
