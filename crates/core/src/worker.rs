// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler/worker: binds registered jobs to cron triggers
//!
//! Each job gets its own trigger task that sleeps until the next matching
//! instant and fires the execution engine. Fires of the same job may
//! overlap by default; an opt-in skip-if-running mode logs and skips
//! instead. In-flight runs are tracked by run id so graceful shutdown can
//! wait for them under a deadline.

use crate::clock::{Clock, SystemClock};
use crate::engine::{Engine, ExecutionResult};
use crate::error::InputError;
use crate::events::EventBus;
use crate::id::RunId;
use crate::job::JobRecord;
use crate::registry::JobRegistry;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Deadline used by [`Worker::shutdown_default`]
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Worker-level configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Timezone for descriptors that do not pin one
    pub default_timezone: Tz,
    /// Skip a fire while the same job is still in flight, instead of
    /// overlapping. Off by default; fires are never dropped silently.
    pub skip_if_running: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            default_timezone: chrono_tz::UTC,
            skip_if_running: false,
        }
    }
}

/// Counts reported by [`Worker::stats`], surfaced by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub jobs: usize,
    pub in_flight: usize,
    pub running: bool,
}

/// Result of a graceful shutdown: runs that settled before the deadline
/// and runs still outstanding when it elapsed
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    pub completed: Vec<RunId>,
    pub interrupted: Vec<RunId>,
}

struct InFlight {
    job_id: String,
    done: watch::Receiver<bool>,
}

struct Trigger {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct Shared<C: Clock> {
    engine: Engine<C>,
    clock: C,
    registry: Arc<JobRegistry>,
    config: WorkerConfig,
    running: watch::Sender<bool>,
    shutting_down: AtomicBool,
    in_flight: Mutex<HashMap<String, InFlight>>,
    triggers: Mutex<HashMap<String, Trigger>>,
}

impl<C: Clock> Shared<C> {
    /// Run one fire through the engine, tracked in the in-flight table.
    /// During shutdown the fire is declined with a synthetic failure.
    async fn execute(&self, job: &JobRecord, scheduled_at: DateTime<Utc>) -> ExecutionResult {
        if self.shutting_down.load(Ordering::SeqCst) {
            tracing::warn!(job_id = %job.id, "fire declined: scheduler is shutting down");
            return ExecutionResult::shutdown_rejected(&job.id, self.clock.now());
        }

        let run_id = RunId::generate(self.clock.now());
        let (done_tx, done_rx) = watch::channel(false);
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            in_flight.insert(
                run_id.as_str().to_string(),
                InFlight {
                    job_id: job.id.clone(),
                    done: done_rx,
                },
            );
        }

        let result = self.engine.run_fired(job, run_id.clone(), scheduled_at).await;

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            in_flight.remove(run_id.as_str());
        }
        let _ = done_tx.send(true);
        result
    }

    fn job_in_flight(&self, job_id: &str) -> bool {
        let in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.values().any(|entry| entry.job_id == job_id)
    }
}

/// Binds jobs to triggers and owns the worker lifecycle. Cheap to clone;
/// clones share all state.
pub struct Worker<C: Clock = SystemClock> {
    shared: Arc<Shared<C>>,
}

impl Worker<SystemClock> {
    pub fn new(registry: Arc<JobRegistry>, bus: EventBus) -> Self {
        Self::with_clock(registry, bus, SystemClock, WorkerConfig::default())
    }
}

impl<C: Clock> Worker<C> {
    pub fn with_clock(
        registry: Arc<JobRegistry>,
        bus: EventBus,
        clock: C,
        config: WorkerConfig,
    ) -> Self {
        let (running, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                engine: Engine::with_clock(bus, clock.clone()),
                clock,
                registry,
                config,
                running,
                shutting_down: AtomicBool::new(false),
                in_flight: Mutex::new(HashMap::new()),
                triggers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Arm a trigger for a job, replacing any existing trigger with the
    /// same id. The trigger stays paused until the worker is running.
    pub fn add(&self, job: JobRecord) {
        let trigger = spawn_trigger(Arc::clone(&self.shared), job.clone());
        let mut triggers = self
            .shared
            .triggers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = triggers.insert(job.id.clone(), trigger) {
            tracing::debug!(job_id = %job.id, "trigger replaced");
            stop_trigger(previous);
        }
    }

    /// Stop and detach a job's trigger. In-flight runs are unaffected.
    pub fn remove(&self, job_id: &str) -> bool {
        let removed = {
            let mut triggers = self
                .shared
                .triggers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            triggers.remove(job_id)
        };
        match removed {
            Some(trigger) => {
                stop_trigger(trigger);
                true
            }
            None => false,
        }
    }

    /// Arm triggers for every job currently in the registry
    pub fn arm_registered(&self) {
        for job in self.shared.registry.get_all() {
            self.add(job);
        }
    }

    /// Resume all triggers. Also clears the shutting-down flag left by an
    /// interrupted shutdown, making the worker reusable.
    pub fn start(&self) {
        self.shared.shutting_down.store(false, Ordering::SeqCst);
        self.shared.running.send_replace(true);
        tracing::info!(jobs = self.stats().jobs, "worker started");
    }

    /// Pause all triggers without cancelling in-flight runs
    pub fn stop(&self) {
        self.shared.running.send_replace(false);
        tracing::info!("worker stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.shared.running.borrow()
    }

    /// Run a job immediately, through the same path as a trigger fire
    pub async fn execute_job(&self, job: &JobRecord) -> ExecutionResult {
        let now = self.shared.clock.now();
        self.shared.execute(job, now).await
    }

    /// Manual fire by id; unknown ids surface as an error to the caller
    pub async fn trigger(&self, job_id: &str) -> Result<ExecutionResult, WorkerError> {
        let job = self
            .shared
            .registry
            .get(job_id)
            .ok_or_else(|| WorkerError::JobNotFound(job_id.to_string()))?;
        Ok(self.execute_job(&job).await)
    }

    /// Next fire instant for a registered job
    pub fn get_next_run(&self, job_id: &str) -> Result<Option<DateTime<Utc>>, WorkerError> {
        let job = self
            .shared
            .registry
            .get(job_id)
            .ok_or_else(|| WorkerError::JobNotFound(job_id.to_string()))?;
        let expr = job.schedule.compiled()?;
        let tz = job
            .schedule
            .resolve_timezone(self.shared.config.default_timezone);
        Ok(expr.next_after(self.shared.clock.now(), tz))
    }

    /// Job ids with at least one run currently in flight
    pub fn in_flight_jobs(&self) -> Vec<String> {
        let in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = in_flight.values().map(|e| e.job_id.clone()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn stats(&self) -> WorkerStats {
        let jobs = {
            let triggers = self
                .shared
                .triggers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            triggers.len()
        };
        let in_flight = {
            let in_flight = self
                .shared
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            in_flight.len()
        };
        WorkerStats {
            jobs,
            in_flight,
            running: self.is_running(),
        }
    }

    /// [`Worker::shutdown`] with the standard 30-second deadline
    pub async fn shutdown_default(&self) -> ShutdownReport {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Graceful shutdown: stop all triggers, then wait for in-flight runs
    /// under a shared deadline. Runs that settle in time are reported as
    /// completed; the rest are interrupted and keep running detached.
    ///
    /// New fires are declined from the moment shutdown begins. When every
    /// run settled, the worker is immediately reusable; after an
    /// interrupted shutdown it keeps declining fires until [`Worker::start`].
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.shared.shutting_down.store(true, Ordering::SeqCst);
        self.shared.running.send_replace(false);

        {
            let mut triggers = self
                .shared
                .triggers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            for (_, trigger) in triggers.drain() {
                stop_trigger(trigger);
            }
        }

        let handles: Vec<(String, watch::Receiver<bool>)> = {
            let in_flight = self
                .shared
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            in_flight
                .iter()
                .map(|(run_id, entry)| (run_id.clone(), entry.done.clone()))
                .collect()
        };

        tracing::info!(in_flight = handles.len(), "waiting for in-flight runs");
        let deadline = tokio::time::Instant::now() + timeout;
        let mut report = ShutdownReport::default();
        for (run_id, mut done) in handles {
            let settled = *done.borrow()
                || matches!(
                    tokio::time::timeout_at(deadline, done.wait_for(|settled| *settled)).await,
                    Ok(Ok(_))
                );
            if settled {
                report.completed.push(RunId(run_id));
            } else {
                tracing::warn!(run_id = %run_id, "run interrupted by shutdown deadline");
                report.interrupted.push(RunId(run_id));
            }
        }

        if report.interrupted.is_empty() {
            self.shared.shutting_down.store(false, Ordering::SeqCst);
        }
        tracing::info!(
            completed = report.completed.len(),
            interrupted = report.interrupted.len(),
            "shutdown finished"
        );
        report
    }
}

impl<C: Clock> Clone for Worker<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn stop_trigger(trigger: Trigger) {
    let _ = trigger.cancel.send(true);
    trigger.task.abort();
}

/// One task per job: sleep until the next matching instant, then fire.
/// Paused whenever the worker's running flag is false; after a delayed
/// wake, at most the single most-recent missed fire is delivered.
fn spawn_trigger<C: Clock>(shared: Arc<Shared<C>>, job: JobRecord) -> Trigger {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    let mut running_rx = shared.running.subscribe();

    let task = tokio::spawn(async move {
        let Ok(expr) = job.schedule.compiled() else {
            tracing::error!(job_id = %job.id, cron = %job.schedule.cron, "schedule failed to compile; trigger disarmed");
            return;
        };
        let tz = job.schedule.resolve_timezone(shared.config.default_timezone);
        let mut after = shared.clock.now();

        loop {
            // Park while paused
            while !*running_rx.borrow() {
                tokio::select! {
                    changed = running_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = cancel_rx.changed() => {
                        if *cancel_rx.borrow() {
                            return;
                        }
                    }
                }
            }

            // Fires missed while paused or delayed are skipped, except the
            // one being slept toward.
            let now = shared.clock.now();
            if after < now {
                after = now;
            }
            let Some(next) = expr.next_after(after, tz) else {
                tracing::warn!(job_id = %job.id, cron = %job.schedule.cron, "no future fire; trigger disarmed");
                return;
            };

            let wait = (next - shared.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if *running_rx.borrow() {
                        if shared.config.skip_if_running && shared.job_in_flight(&job.id) {
                            tracing::warn!(job_id = %job.id, "fire skipped: previous run still in flight");
                        } else {
                            let shared = Arc::clone(&shared);
                            let job = job.clone();
                            tokio::spawn(async move {
                                let _ = shared.execute(&job, next).await;
                            });
                        }
                    }
                    after = next;
                }
                _ = cancel_rx.changed() => {
                    if *cancel_rx.borrow() {
                        return;
                    }
                }
                changed = running_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    // Re-evaluate the running flag at the top of the loop
                }
            }
        }
    });

    Trigger {
        cancel: cancel_tx,
        task,
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
