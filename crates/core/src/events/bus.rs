// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous event bus with per-kind listeners and a wildcard channel
//!
//! Listeners run on the emitter's thread, in registration order:
//! specific-kind listeners first, then wildcard listeners. A panicking
//! listener is isolated from the emitter and from other listeners.

use super::event::{EventKind, ExecutionEvent};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock, Weak};

type Listener = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    by_kind: HashMap<EventKind, Vec<(u64, Listener)>>,
    wildcard: Vec<(u64, Listener)>,
    next_id: u64,
}

impl Registry {
    fn insert(&mut self, kind: Option<EventKind>, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        match kind {
            Some(kind) => self.by_kind.entry(kind).or_default().push((id, listener)),
            None => self.wildcard.push((id, listener)),
        }
        id
    }

    fn remove(&mut self, kind: Option<EventKind>, id: u64) {
        match kind {
            Some(kind) => {
                if let Some(listeners) = self.by_kind.get_mut(&kind) {
                    listeners.retain(|(lid, _)| *lid != id);
                }
            }
            None => self.wildcard.retain(|(lid, _)| *lid != id),
        }
    }
}

/// Routes execution events to registered listeners
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
        }
    }

    /// Register a listener for one event kind. Returns an unsubscribe handle.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerHandle
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(listener))
    }

    /// Register a wildcard listener that receives every event
    pub fn on_all<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(listener))
    }

    fn register(&self, kind: Option<EventKind>, listener: Listener) -> ListenerHandle {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        let id = registry.insert(kind, listener);
        ListenerHandle {
            registry: Arc::downgrade(&self.registry),
            kind,
            id,
        }
    }

    /// Deliver an event to matching listeners, specific kind first.
    ///
    /// Listener sets are snapshotted before dispatch, so a listener may
    /// subscribe or unsubscribe without deadlocking the bus.
    pub fn emit(&self, event: &ExecutionEvent) {
        let snapshot: Vec<Listener> = {
            let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
            let specific = registry
                .by_kind
                .get(&event.kind())
                .into_iter()
                .flat_map(|listeners| listeners.iter());
            specific
                .chain(registry.wildcard.iter())
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(kind = %event.kind(), "event listener panicked");
            }
        }
    }

    /// Drop every subscription
    pub fn remove_all_listeners(&self) {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        registry.by_kind.clear();
        registry.wildcard.clear();
    }

    /// Number of registered listeners, wildcard included
    pub fn listener_count(&self) -> usize {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry.by_kind.values().map(Vec::len).sum::<usize>() + registry.wildcard.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Handle returned by [`EventBus::on`]; detachable, so dropping it does
/// not remove the listener
pub struct ListenerHandle {
    registry: Weak<RwLock<Registry>>,
    kind: Option<EventKind>,
    id: u64,
}

impl ListenerHandle {
    /// Remove the listener this handle refers to
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.write().unwrap_or_else(|e| e.into_inner());
            registry.remove(self.kind, self.id);
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
