// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hj_core::{
    every, handler_fn, EventBus, JobConfig, JobRegistry, RetryConfig as Retry, Worker,
};
use serde_json::Value;

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn fixture() -> (Arc<DashboardState>, EventBus) {
    let registry = Arc::new(JobRegistry::new());
    let bus = EventBus::new();
    let worker = Worker::new(Arc::clone(&registry), bus.clone());
    let state = Arc::new(DashboardState::new(Arc::clone(&registry), worker));
    state.attach(&bus);

    registry
        .register(
            hj_core::JobRecord::new(
                "reports/daily",
                every("15m").unwrap().with_timezone("America/New_York").unwrap(),
                JobConfig::named("Daily report")
                    .with_timeout("30s")
                    .with_retry(Retry::new(3)),
                handler_fn(|_ctx| async { Ok(()) }),
            ),
        )
        .unwrap();

    (state, bus)
}

#[tokio::test]
async fn list_jobs_projects_summaries() {
    let (state, _bus) = fixture();

    let Json(jobs) = list_jobs(State(state)).await;
    assert_eq!(jobs.len(), 1);

    let json = serde_json::to_value(&jobs[0]).unwrap();
    assert_eq!(json["id"], "reports/daily");
    assert_eq!(json["name"], "Daily report");
    assert_eq!(json["schedule"], "every 15 minutes");
    assert_eq!(json["cron"], "*/15 * * * *");
    assert_eq!(json["timezone"], "America/New_York");
    assert_eq!(json["status"], "idle");
    assert_eq!(json["lastRun"], Value::Null);
    assert!(json["nextRun"].is_string());
}

#[tokio::test]
async fn get_job_includes_config() {
    let (state, _bus) = fixture();

    let response = get_job(State(state), Path("reports/daily".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], "reports/daily");
    assert_eq!(json["config"]["timeout"], "30s");
    assert_eq!(json["config"]["retry"]["attempts"], 3);
    assert_eq!(json["config"]["retry"]["backoff"], "linear");
}

#[tokio::test]
async fn unknown_job_is_404() {
    let (state, _bus) = fixture();

    let response = get_job(State(Arc::clone(&state)), Path("nope".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = job_runs(State(Arc::clone(&state)), Path("nope".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = trigger_job(State(state), Path("nope".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trigger_returns_immediately_and_runs_in_background() {
    let (state, bus) = fixture();

    let settled = Arc::new(tokio::sync::Notify::new());
    let notify = Arc::clone(&settled);
    drop(bus.on(hj_core::EventKind::Success, move |_| notify.notify_one()));

    let response = trigger_job(State(Arc::clone(&state)), Path("reports/daily".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["jobId"], "reports/daily");
    assert!(json["message"].as_str().is_some());

    // The background run settles and lands in history.
    tokio::time::timeout(std::time::Duration::from_secs(2), settled.notified())
        .await
        .unwrap();
    assert_eq!(state.runs("reports/daily").len(), 1);
}

#[tokio::test]
async fn runs_endpoint_returns_history() {
    let (state, _bus) = fixture();

    state.worker().trigger("reports/daily").await.unwrap();

    let response = job_runs(State(Arc::clone(&state)), Path("reports/daily".to_string())).await;
    let json = body_json(response).await;
    let runs = json.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["status"], "success");
    assert_eq!(runs[0]["attempt"], 1);
}
