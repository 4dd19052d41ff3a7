// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run and job identifier generation

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Unique identifier for a single run of a job
///
/// Format: `run_<unix-ms>_<9-char base36 random>`. Only required to be
/// unique within a process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a fresh run id stamped with the given instant
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("run_{}_{}", now.timestamp_millis(), suffix))
    }

    /// Synthetic id for a fire declined during shutdown
    pub fn skipped(now: DateTime<Utc>) -> Self {
        Self(format!("skipped_{}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static ANON_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Next id for a job registered without a name: `anonymous-job-<N>`
pub fn next_anonymous_job_id() -> String {
    let n = ANON_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
    format!("anonymous-job-{}", n)
}

/// Reset the anonymous-job counter. Test hook only.
pub fn reset_anonymous_job_ids() {
    ANON_COUNTER.store(0, Ordering::SeqCst);
}

// Serializes tests that assert on absolute anonymous-counter values.
#[cfg(test)]
pub(crate) static ANON_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
