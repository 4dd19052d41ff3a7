// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hj-dashboard: read-only HTTP projection of the runner
//!
//! Serves the job list, per-job detail and run history, a manual trigger
//! endpoint, and a server-sent-events stream of every execution event.
//! History is an in-memory ring per job, fed by the event bus; nothing
//! survives a restart.

mod history;
mod routes;
pub mod secret;
mod sse;
mod state;

pub use history::{HistoryEntry, JobStatus};
pub use secret::{verify_cron_request, CronVerification};
pub use state::DashboardState;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the dashboard router. CORS is permissive: the UI is served from
/// its own dev server.
pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/api/jobs", get(routes::list_jobs))
        .route("/api/jobs/{id}", get(routes::get_job))
        .route("/api/jobs/{id}/runs", get(routes::job_runs))
        .route("/api/jobs/{id}/trigger", post(routes::trigger_job))
        .route("/api/events", get(sse::events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
