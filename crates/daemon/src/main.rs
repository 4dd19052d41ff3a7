// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heron Jobs Daemon (hjd)
//!
//! Worker-mode process: arms triggers for every registered job, serves the
//! dashboard API and health endpoint, and shuts down gracefully on
//! SIGTERM/SIGINT.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod health;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use hj_core::{registry, EventBus, SystemClock, Worker, WorkerConfig};
use hj_dashboard::DashboardState;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{info, warn};

use crate::config::{Args, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::from_args(Args::parse())?;

    let registry = registry::global();
    if registry.is_empty() {
        warn!("no jobs registered; the worker will idle until jobs are added");
    }

    let bus = EventBus::new();
    let worker = Worker::with_clock(
        Arc::clone(&registry),
        bus.clone(),
        SystemClock,
        WorkerConfig {
            default_timezone: config.default_timezone,
            skip_if_running: false,
        },
    );

    let dashboard = Arc::new(DashboardState::new(Arc::clone(&registry), worker.clone()));
    dashboard.attach(&bus);

    worker.arm_registered();
    worker.start();
    info!(jobs = registry.len(), tz = %config.default_timezone, "worker running");

    let app = hj_dashboard::router(dashboard).merge(health::router(Arc::new(
        health::HealthState {
            registry: Arc::clone(&registry),
            started: Instant::now(),
        },
    )));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "dashboard and health endpoints listening");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let server = axum::serve(listener, app).into_future();

    tokio::select! {
        result = server => result?,
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down...");
            graceful_shutdown(&worker, config.shutdown_timeout, &mut sigterm, &mut sigint).await;
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down...");
            graceful_shutdown(&worker, config.shutdown_timeout, &mut sigterm, &mut sigint).await;
        }
    }

    info!("daemon stopped");
    Ok(())
}

/// Wait for in-flight runs under the configured deadline. A second signal
/// skips the wait.
async fn graceful_shutdown(
    worker: &Worker,
    timeout: Duration,
    sigterm: &mut Signal,
    sigint: &mut Signal,
) {
    tokio::select! {
        report = worker.shutdown(timeout) => {
            info!(
                completed = report.completed.len(),
                interrupted = report.interrupted.len(),
                "graceful shutdown finished"
            );
        }
        _ = sigterm.recv() => warn!("second signal received, exiting without waiting"),
        _ = sigint.recv() => warn!("second signal received, exiting without waiting"),
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
