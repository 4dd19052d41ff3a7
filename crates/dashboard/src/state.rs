// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared dashboard state: history rings and SSE client set

use crate::history::{HistoryEntry, JobStatus, HISTORY_LIMIT};
use hj_core::{EventBus, ExecutionEvent, JobRegistry, Worker};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;

type EventSender = mpsc::UnboundedSender<ExecutionEvent>;

/// State behind every dashboard endpoint
pub struct DashboardState {
    registry: Arc<JobRegistry>,
    worker: Worker,
    /// job id → settled runs, newest first, capped at [`HISTORY_LIMIT`]
    history: RwLock<HashMap<String, VecDeque<HistoryEntry>>>,
    clients: Mutex<HashMap<String, EventSender>>,
}

impl DashboardState {
    pub fn new(registry: Arc<JobRegistry>, worker: Worker) -> Self {
        Self {
            registry,
            worker,
            history: RwLock::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to the bus: terminal events feed the history rings, and
    /// every event is fanned out to connected SSE clients.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        let state = Arc::clone(self);
        drop(bus.on_all(move |event| {
            state.record(event);
            state.broadcast(event);
        }));
    }

    pub(crate) fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub(crate) fn worker(&self) -> &Worker {
        &self.worker
    }

    fn record(&self, event: &ExecutionEvent) {
        let Some((job_id, entry)) = HistoryEntry::from_event(event) else {
            return;
        };
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        let ring = history.entry(job_id).or_default();
        ring.push_front(entry);
        ring.truncate(HISTORY_LIMIT);
    }

    /// Best-effort fan-out; a client whose channel is gone is dropped
    fn broadcast(&self, event: &ExecutionEvent) {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        clients.retain(|client_id, tx| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                tracing::debug!(client_id = %client_id, "sse client disconnected");
            }
            delivered
        });
    }

    /// Run history for a job, newest first
    pub fn runs(&self, job_id: &str) -> Vec<HistoryEntry> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history
            .get(job_id)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Newest settled run for a job
    pub fn last_run(&self, job_id: &str) -> Option<HistoryEntry> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history.get(job_id).and_then(|ring| ring.front().cloned())
    }

    /// Current dashboard status for a job
    pub fn status(&self, job_id: &str) -> JobStatus {
        let in_flight = self.worker.in_flight_jobs().iter().any(|id| id == job_id);
        JobStatus::project(in_flight, self.last_run(job_id).as_ref())
    }

    pub(crate) fn register_client(&self, client_id: String, tx: EventSender) {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        clients.insert(client_id, tx);
    }

    #[cfg(test)]
    pub(crate) fn client_count(&self) -> usize {
        let clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        clients.len()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
