use crate::domain::model::ContentKey;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentEventKind {
    Saved,
    Removed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentEvent {
    pub kind: ContentEventKind,
    pub key: Option<ContentKey>,
    pub at: DateTime<Utc>,
}

/// Page-wide bus announcing content saves and removals.
#[derive(Clone)]
pub struct ContentEvents {
    tx: broadcast::Sender<ContentEvent>,
}

impl ContentEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, kind: ContentEventKind, key: Option<ContentKey>) {
        let event = ContentEvent {
            kind,
            key,
            at: Utc::now(),
        };
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for ContentEvents {
    fn default() -> Self {
        Self::new()
    }
}
