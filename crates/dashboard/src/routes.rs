// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON endpoints: job list, detail, run history, manual trigger

use crate::history::{HistoryEntry, JobStatus};
use crate::state::DashboardState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use hj_core::{JobRecord, RetryConfig};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobSummary {
    id: String,
    name: String,
    /// Human-readable schedule text
    schedule: String,
    cron: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,
    status: JobStatus,
    last_run: Option<DateTime<Utc>>,
    next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobDetail {
    #[serde(flatten)]
    summary: JobSummary,
    config: JobConfigView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobConfigView {
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
}

fn summarize(state: &DashboardState, job: &JobRecord) -> JobSummary {
    JobSummary {
        id: job.id.clone(),
        name: job.name.clone(),
        schedule: job.schedule.human_readable.clone(),
        cron: job.schedule.cron.clone(),
        timezone: job.schedule.timezone.clone(),
        status: state.status(&job.id),
        last_run: state.last_run(&job.id).map(|entry| entry.completed_at),
        next_run: state.worker().get_next_run(&job.id).ok().flatten(),
    }
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("job '{}' not found", id) })),
    )
        .into_response()
}

/// GET /api/jobs
pub(crate) async fn list_jobs(State(state): State<Arc<DashboardState>>) -> Json<Vec<JobSummary>> {
    let jobs = state
        .registry()
        .get_all()
        .iter()
        .map(|job| summarize(&state, job))
        .collect();
    Json(jobs)
}

/// GET /api/jobs/{id}
pub(crate) async fn get_job(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> Response {
    let Some(job) = state.registry().get(&id) else {
        return not_found(&id);
    };
    let detail = JobDetail {
        summary: summarize(&state, &job),
        config: JobConfigView {
            retry: job.config.retry.clone(),
            timeout: job.config.timeout.clone(),
        },
    };
    Json(detail).into_response()
}

/// GET /api/jobs/{id}/runs
pub(crate) async fn job_runs(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> Response {
    if !state.registry().contains(&id) {
        return not_found(&id);
    }
    let runs: Vec<HistoryEntry> = state.runs(&id);
    Json(runs).into_response()
}

/// POST /api/jobs/{id}/trigger: kick off a run in the background and
/// return immediately
pub(crate) async fn trigger_job(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> Response {
    if !state.registry().contains(&id) {
        return not_found(&id);
    }

    let worker = state.worker().clone();
    let job_id = id.clone();
    tokio::spawn(async move {
        match worker.trigger(&job_id).await {
            Ok(result) => {
                tracing::info!(job_id = %job_id, status = %result.status, "manual trigger settled")
            }
            Err(err) => tracing::warn!(job_id = %job_id, error = %err, "manual trigger failed"),
        }
    });

    Json(json!({
        "message": "Job triggered",
        "jobId": id,
    }))
    .into_response()
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
