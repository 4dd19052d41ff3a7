// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hj-core: Core library for the Heron Jobs (hj) runner
//!
//! Heron Jobs is an in-process cron-style job runner. This crate holds the
//! pieces the worker binary and dashboard are assembled from:
//! - **schedule**: builder DSL that compiles to canonical cron expressions
//! - **cron**: cron expression parsing and timezone-aware next-run computation
//! - **registry**: process-wide job registration
//! - **engine**: single-run execution with timeout, retries, and callbacks
//! - **events**: synchronous pub/sub bus for execution events
//! - **worker**: cron triggers, in-flight tracking, and graceful shutdown

pub mod clock;
pub mod cron;
pub mod duration;
pub mod engine;
pub mod error;
pub mod events;
pub mod id;
pub mod job;
pub mod registry;
pub mod schedule;
pub mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use cron::CronExpr;
pub use duration::{parse_clock_time, parse_duration, parse_weekday};
pub use engine::{Engine, ExecutionError, ExecutionResult, RunStatus};
pub use error::InputError;
pub use events::{EventBus, EventKind, ExecutionEvent, ListenerHandle};
pub use id::RunId;
pub use job::{
    handler_fn, Backoff, CancelSignal, HandlerResult, JobConfig, JobContext, JobHandler, JobRecord,
    RetryConfig,
};
pub use registry::{schedule, schedule_in, JobRegistry};
pub use schedule::{
    cron, daily, every, monthly, weekly, MonthlyDay, ScheduleDescriptor, ScheduleKind,
};
pub use worker::{ShutdownReport, Worker, WorkerConfig, WorkerError, WorkerStats};
