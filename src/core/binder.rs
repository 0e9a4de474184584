//! Delegated action listeners scoped to a container.
//!
//! A listener delivers at most one pending [`ActionEvent`] at a time: further
//! triggers are ignored until the handler calls [`ActionEvent::finish`]. This
//! is the completion gate that keeps a save control from double-submitting.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Identifies the element a listener is scoped to, e.g. one modal body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

struct Listener {
    scope: ScopeId,
    event: String,
    selector: String,
    pending: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<ActionEvent>,
}

#[derive(Clone, Default)]
pub struct ActionBinder {
    listeners: Arc<Mutex<HashMap<u64, Listener>>>,
    next_id: Arc<AtomicU64>,
}

impl ActionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, scope: ScopeId, event: &str, selector: &str) -> Binding {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Listener {
            scope,
            event: event.to_string(),
            selector: selector.to_string(),
            pending: Arc::new(AtomicBool::new(false)),
            tx,
        };
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        tracing::debug!("Bound {} listener for {} in {}", event, selector, scope);

        Binding {
            id,
            binder: self.clone(),
            rx,
        }
    }

    /// Dispatches an event raised on `selector` inside `scope`. Returns how
    /// many listeners accepted it; listeners still handling an earlier event
    /// are skipped.
    pub fn trigger(&self, scope: ScopeId, event: &str, selector: &str) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0;

        for listener in listeners.values() {
            if listener.scope != scope || listener.event != event || listener.selector != selector
            {
                continue;
            }
            if listener
                .pending
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                tracing::debug!("Ignoring {} on {}: previous event not finished", event, selector);
                continue;
            }
            let action_event = ActionEvent {
                event: event.to_string(),
                selector: selector.to_string(),
                pending: Arc::clone(&listener.pending),
                finished: false,
            };
            if listener.tx.send(action_event).is_ok() {
                delivered += 1;
            }
        }

        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn unbind(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// A live listener. Dropping it unbinds.
pub struct Binding {
    id: u64,
    binder: ActionBinder,
    rx: mpsc::UnboundedReceiver<ActionEvent>,
}

impl Binding {
    pub async fn next(&mut self) -> Option<ActionEvent> {
        self.rx.recv().await
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.binder.unbind(self.id);
    }
}

#[derive(Debug)]
pub struct ActionEvent {
    event: String,
    selector: String,
    pending: Arc<AtomicBool>,
    finished: bool,
}

impl ActionEvent {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Marks the handling as complete and reopens the listener's gate.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.finished {
            self.finished = true;
            self.pending.store(false, Ordering::Release);
        }
    }
}

impl Drop for ActionEvent {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("{} event on {} dropped without finish", self.event, self.selector);
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAVE: &str = "[data-content-save]";

    #[tokio::test]
    async fn test_trigger_delivers_within_scope_only() {
        let binder = ActionBinder::new();
        let mut binding = binder.bind(ScopeId(1), "click", SAVE);

        assert_eq!(binder.trigger(ScopeId(2), "click", SAVE), 0);
        assert_eq!(binder.trigger(ScopeId(1), "change", SAVE), 0);
        assert_eq!(binder.trigger(ScopeId(1), "click", SAVE), 1);

        let event = binding.next().await.unwrap();
        assert_eq!(event.event(), "click");
        assert_eq!(event.selector(), SAVE);
        event.finish();
    }

    #[tokio::test]
    async fn test_gate_blocks_until_finished() {
        let binder = ActionBinder::new();
        let mut binding = binder.bind(ScopeId(7), "click", SAVE);

        assert_eq!(binder.trigger(ScopeId(7), "click", SAVE), 1);
        assert_eq!(binder.trigger(ScopeId(7), "click", SAVE), 0);

        let event = binding.next().await.unwrap();
        assert_eq!(binder.trigger(ScopeId(7), "click", SAVE), 0);
        event.finish();
        assert_eq!(binder.trigger(ScopeId(7), "click", SAVE), 1);
    }

    #[test]
    fn test_drop_unbinds() {
        let binder = ActionBinder::new();
        let first = binder.bind(ScopeId(1), "click", SAVE);
        let second = binder.bind(ScopeId(2), "click", SAVE);
        assert_eq!(binder.listener_count(), 2);

        drop(first);
        assert_eq!(binder.listener_count(), 1);
        drop(second);
        assert_eq!(binder.listener_count(), 0);
        assert_eq!(binder.trigger(ScopeId(1), "click", SAVE), 0);
    }

    #[tokio::test]
    async fn test_dropped_event_releases_gate() {
        let binder = ActionBinder::new();
        let mut binding = binder.bind(ScopeId(3), "click", SAVE);
        binder.trigger(ScopeId(3), "click", SAVE);
        drop(binding.next().await);
        assert_eq!(binder.trigger(ScopeId(3), "click", SAVE), 1);
    }
}
