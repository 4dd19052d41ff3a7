// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-sent events stream of execution events
//!
//! Every bus event is forwarded verbatim as a `data:` message. The first
//! message identifies the connection; a comment heartbeat keeps proxies
//! from closing idle streams.

use crate::state::DashboardState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// GET /api/events
pub(crate) async fn events(
    State(state): State<Arc<DashboardState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let client_id = uuid::Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::unbounded_channel();
    state.register_client(client_id.clone(), tx);
    tracing::debug!(client_id = %client_id, "sse client connected");

    let hello = serde_json::json!({
        "type": "connected",
        "clientId": client_id,
    });
    let first = tokio_stream::once(Ok(Event::default().data(hello.to_string())));

    let rest = UnboundedReceiverStream::new(rx).map(|event| {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().data(payload))
    });

    Sse::new(first.chain(rest)).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
