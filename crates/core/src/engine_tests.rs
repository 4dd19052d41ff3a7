// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::events::EventKind;
use crate::job::{handler_fn, JobConfig, JobRecord, RetryConfig};
use crate::schedule::every;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

fn collect_kinds(bus: &EventBus) -> Arc<Mutex<Vec<EventKind>>> {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    // Handle intentionally dropped; listeners survive their handles.
    drop(bus.on_all(move |event| {
        sink.lock().unwrap().push(event.kind());
    }));
    kinds
}

fn job_with(config: JobConfig, handler: Arc<dyn crate::job::JobHandler>) -> JobRecord {
    JobRecord::new("test/job", every("1m").unwrap(), config, handler)
}

#[tokio::test]
async fn happy_path_single_attempt() {
    let bus = EventBus::new();
    let kinds = collect_kinds(&bus);
    let engine = Engine::new(bus);

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let job = job_with(
        JobConfig::default(),
        handler_fn(move |_ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.attempt, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(result.error.is_none());
    assert_eq!(
        *kinds.lock().unwrap(),
        vec![EventKind::Start, EventKind::Success]
    );
}

#[tokio::test]
async fn retries_until_success() {
    let bus = EventBus::new();
    let kinds = collect_kinds(&bus);
    let engine = Engine::new(bus);

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let config = JobConfig::default()
        .with_retry(RetryConfig::new(3).with_initial_delay("10ms"));
    let job = job_with(
        config,
        handler_fn(move |_ctx| {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("flaky".into())
                } else {
                    Ok(())
                }
            }
        }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.attempt, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *kinds.lock().unwrap(),
        vec![
            EventKind::Start,
            EventKind::Retry,
            EventKind::Retry,
            EventKind::Success
        ]
    );
}

#[tokio::test]
async fn exhausted_retries_settle_as_failure() {
    let bus = EventBus::new();
    let kinds = collect_kinds(&bus);
    let engine = Engine::new(bus);

    let config = JobConfig::default()
        .with_retry(RetryConfig::new(2).with_initial_delay("10ms"));
    let job = job_with(
        config,
        handler_fn(|_ctx| async { Err("persistent failure".into()) }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.attempt, 2);
    assert_eq!(
        result.error.as_ref().map(|e| e.message.as_str()),
        Some("persistent failure")
    );
    assert_eq!(
        *kinds.lock().unwrap(),
        vec![EventKind::Start, EventKind::Retry, EventKind::Failure]
    );
}

#[tokio::test]
async fn timeout_produces_timeout_status() {
    let bus = EventBus::new();
    let kinds = collect_kinds(&bus);
    let engine = Engine::new(bus);

    let job = job_with(
        JobConfig::default().with_timeout("50ms"),
        handler_fn(|_ctx| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Timeout);
    assert_eq!(result.attempt, 1);
    let message = result.error.as_ref().map(|e| e.message.as_str()).unwrap_or("");
    assert!(message.contains("timed out"), "got: {}", message);
    assert_eq!(
        *kinds.lock().unwrap(),
        vec![EventKind::Start, EventKind::Timeout]
    );
}

#[tokio::test]
async fn timeout_fires_the_cancellation_signal() {
    let bus = EventBus::new();
    let engine = Engine::new(bus);

    let observed = Arc::new(AtomicU32::new(0));
    let flag = Arc::clone(&observed);
    let job = job_with(
        JobConfig::default().with_timeout("40ms"),
        handler_fn(move |ctx| {
            let flag = Arc::clone(&flag);
            async move {
                ctx.signal.cancelled().await;
                flag.fetch_add(1, Ordering::SeqCst);
                Err("cancelled".into())
            }
        }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Timeout);
    // The handler saw the signal inside the grace window.
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_panic_is_reified_not_propagated() {
    let bus = EventBus::new();
    let engine = Engine::new(bus);

    let job = job_with(
        JobConfig::default(),
        handler_fn(|_ctx| async { panic!("handler bug") }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Failure);
    let message = result.error.as_ref().map(|e| e.message.as_str()).unwrap_or("");
    assert!(message.contains("handler panicked"), "got: {}", message);
    assert!(message.contains("handler bug"), "got: {}", message);
}

#[tokio::test]
async fn callbacks_fire_and_their_panics_are_swallowed() {
    let bus = EventBus::new();
    let engine = Engine::new(bus);

    let succeeded = Arc::new(AtomicU32::new(0));
    let flag = Arc::clone(&succeeded);
    let config = JobConfig::default().on_success(move |ctx| {
        assert_eq!(ctx.attempt, 1);
        flag.fetch_add(1, Ordering::SeqCst);
        panic!("callback bug");
    });
    let job = job_with(config, handler_fn(|_ctx| async { Ok(()) }));

    let result = engine.run(&job).await;

    // The panicking callback neither changes the result nor escapes.
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(succeeded.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failure_callback_receives_the_terminal_error() {
    let bus = EventBus::new();
    let engine = Engine::new(bus);

    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let config = JobConfig::default().on_failure(move |error, _ctx| {
        *sink.lock().unwrap() = Some(error.message.clone());
    });
    let job = job_with(config, handler_fn(|_ctx| async { Err("boom".into()) }));

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("boom"));
}

#[tokio::test]
async fn duration_covers_attempts_and_backoff() {
    let bus = EventBus::new();
    let engine = Engine::new(bus);

    // Two 20ms attempts plus a 30ms linear backoff in between.
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let config = JobConfig::default()
        .with_retry(RetryConfig::new(2).with_initial_delay("30ms"));
    let job = job_with(
        config,
        handler_fn(move |_ctx| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("first".into())
                } else {
                    Ok(())
                }
            }
        }),
    );

    let result = engine.run(&job).await;

    assert_eq!(result.status, RunStatus::Success);
    assert!(
        result.duration_ms >= 70,
        "duration {}ms below attempt+backoff floor",
        result.duration_ms
    );
    assert!(result.completed_at >= result.started_at);
}

#[test]
fn retry_delay_scales_linearly_and_exponentially() {
    let linear = RetryConfig::new(5).with_initial_delay("100ms");
    assert_eq!(retry_delay(1, Some(&linear)), Duration::from_millis(100));
    assert_eq!(retry_delay(2, Some(&linear)), Duration::from_millis(200));
    assert_eq!(retry_delay(3, Some(&linear)), Duration::from_millis(300));

    let expo = RetryConfig::new(5)
        .with_initial_delay("100ms")
        .with_backoff(Backoff::Exponential);
    assert_eq!(retry_delay(1, Some(&expo)), Duration::from_millis(100));
    assert_eq!(retry_delay(2, Some(&expo)), Duration::from_millis(200));
    assert_eq!(retry_delay(3, Some(&expo)), Duration::from_millis(400));
    assert_eq!(retry_delay(4, Some(&expo)), Duration::from_millis(800));

    // Defaults: 1s initial delay, linear curve.
    assert_eq!(retry_delay(1, None), Duration::from_secs(1));
    let bare = RetryConfig::new(2);
    assert_eq!(retry_delay(2, Some(&bare)), Duration::from_secs(2));
}

#[tokio::test]
async fn shutdown_rejection_shape() {
    let now = Utc::now();
    let result = ExecutionResult::shutdown_rejected("test/job", now);

    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.attempt, 0);
    assert!(result.run_id.as_str().starts_with("skipped_"));
    assert_eq!(
        result.error.as_ref().map(|e| e.message.as_str()),
        Some("Scheduler is shutting down")
    );
}
