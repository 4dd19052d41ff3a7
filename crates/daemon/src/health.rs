// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker health endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use hj_core::JobRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

pub struct HealthState {
    pub registry: Arc<JobRegistry>,
    pub started: Instant,
}

pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// GET /health: liveness probe with job count and uptime in seconds
async fn health(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "jobs": state.registry.len(),
        "uptime": state.started.elapsed().as_secs(),
    }))
}
