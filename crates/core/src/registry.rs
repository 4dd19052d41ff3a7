// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide job registry
//!
//! The registry exclusively owns job records; every other component refers
//! to jobs by id. Ids are unique: registering a duplicate fails.

use crate::error::InputError;
use crate::id::next_anonymous_job_id;
use crate::job::{JobConfig, JobHandler, JobRecord};
use crate::schedule::ScheduleDescriptor;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

#[derive(Default)]
struct Inner {
    records: HashMap<String, JobRecord>,
    /// Registration order, for stable snapshots
    order: Vec<String>,
}

/// In-memory id → record map with a uniqueness invariant
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<Inner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Fails if the id is already present.
    pub fn register(&self, job: JobRecord) -> Result<(), InputError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.records.contains_key(&job.id) {
            return Err(InputError::DuplicateJob(job.id));
        }
        tracing::debug!(job_id = %job.id, schedule = %job.schedule.cron, "job registered");
        inner.order.push(job.id.clone());
        inner.records.insert(job.id.clone(), job);
        Ok(())
    }

    /// Remove a record; returns whether an entry existed
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.order.retain(|existing| existing != id);
        inner.records.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<JobRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.contains_key(id)
    }

    /// Snapshot of all records in registration order
    pub fn get_all(&self) -> Vec<JobRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record. Test and worker-restart hook.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.records.clear();
        inner.order.clear();
    }
}

/// The process-global registry used by the [`schedule`] façade
pub fn global() -> Arc<JobRegistry> {
    static GLOBAL: OnceLock<Arc<JobRegistry>> = OnceLock::new();
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(JobRegistry::new())))
}

/// Declare a job: validate its config, derive an id, and register it in the
/// process-global registry. Returns the registered record.
///
/// The id comes from `config.name`; anonymous jobs receive
/// `anonymous-job-<N>`.
pub fn schedule(
    descriptor: ScheduleDescriptor,
    config: JobConfig,
    handler: Arc<dyn JobHandler>,
) -> Result<JobRecord, InputError> {
    let registry = global();
    schedule_in(&registry, descriptor, config, handler)
}

/// [`schedule`] against an explicit registry (used by tests and embeddings)
pub fn schedule_in(
    registry: &JobRegistry,
    descriptor: ScheduleDescriptor,
    config: JobConfig,
    handler: Arc<dyn JobHandler>,
) -> Result<JobRecord, InputError> {
    config.validate()?;
    descriptor.validate()?;

    let id = config
        .name
        .clone()
        .unwrap_or_else(next_anonymous_job_id);
    let record = JobRecord::new(id, descriptor, config, handler);
    registry.register(record.clone())?;
    Ok(record)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
