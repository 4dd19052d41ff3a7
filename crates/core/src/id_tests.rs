// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use std::collections::HashSet;

#[test]
fn run_id_has_expected_shape() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let id = RunId::generate(now);

    let parts: Vec<&str> = id.as_str().splitn(3, '_').collect();
    assert_eq!(parts[0], "run");
    assert_eq!(parts[1], now.timestamp_millis().to_string());
    assert_eq!(parts[2].len(), 9);
    assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn run_ids_are_unique() {
    let now = Utc::now();
    let ids: HashSet<String> = (0..1000)
        .map(|_| RunId::generate(now).0)
        .collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn skipped_id_is_prefixed() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let id = RunId::skipped(now);
    assert_eq!(id.as_str(), format!("skipped_{}", now.timestamp_millis()));
}

#[test]
fn anonymous_ids_count_up_from_one_after_reset() {
    let _guard = ANON_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    reset_anonymous_job_ids();
    assert_eq!(next_anonymous_job_id(), "anonymous-job-1");
    assert_eq!(next_anonymous_job_id(), "anonymous-job-2");
    reset_anonymous_job_ids();
    assert_eq!(next_anonymous_job_id(), "anonymous-job-1");
}
