//! # Store adapter
//!
//! The store owns the current document snapshot. The core never writes to it directly - it emits a
//! [`StoreEvent`] describing the edit along with the revision it produced, and leaves persistence and
//! replication to whoever implements [`Store`].

use std::sync::{Arc, Weak};

use crate::commands::Command;
use crate::document::DrawingDocument;

/// What produced a revision.
#[derive(strum::AsRefStr, strum::Display, PartialEq, Eq, Copy, Clone, Hash, Debug)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    AddShape,
    UpdateShape,
    DeleteShape,
    ClearCanvas,
    Batch,
    Undo,
    Redo,
    /// Merged in from another replica.
    Remote,
}

#[derive(Clone, Debug)]
pub struct StoreEvent {
    pub kind: EventKind,
    /// The command that was applied, or undone for [`EventKind::Undo`]. None for remote merges.
    pub action: Option<Command>,
    /// The revision this event produced.
    pub snapshot: Arc<DrawingDocument>,
}

pub type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

pub trait Store: Send + Sync {
    /// The current snapshot. May change between calls, as remote edits land.
    fn doc(&self) -> Arc<DrawingDocument>;
    fn apply_action(&self, event: StoreEvent);
    /// Listen to every applied event, until the returned guard is dropped.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// Unsubscribes on drop.
#[must_use = "the listener is removed as soon as the subscription is dropped"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}
impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
    /// Keep listening for the life of the store.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

struct Listeners {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Single-replica store, keeping the snapshot in memory.
pub struct InMemoryStore {
    document: parking_lot::RwLock<Arc<DrawingDocument>>,
    listeners: Arc<parking_lot::Mutex<Listeners>>,
}
impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(DrawingDocument::default())
    }
}
impl InMemoryStore {
    #[must_use]
    pub fn new(document: DrawingDocument) -> Self {
        Self {
            document: parking_lot::RwLock::new(Arc::new(document)),
            listeners: Arc::new(parking_lot::Mutex::new(Listeners {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }
    /// Simulate another replica's edit landing, applied against whatever is current.
    pub fn merge_remote(&self, updater: impl FnOnce(&mut DrawingDocument)) {
        let snapshot = {
            let current = self.document.read();
            let mut draft = DrawingDocument::clone(&current);
            updater(&mut draft);
            Arc::new(draft)
        };
        self.apply_action(StoreEvent {
            kind: EventKind::Remote,
            action: None,
            snapshot,
        });
    }
}
impl Store for InMemoryStore {
    fn doc(&self) -> Arc<DrawingDocument> {
        self.document.read().clone()
    }
    fn apply_action(&self, event: StoreEvent) {
        log::trace!("store event {}", event.kind);
        *self.document.write() = event.snapshot.clone();
        // Call outside the lock, so listeners may read the store or subscribe.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }
    fn subscribe(&self, listener: Listener) -> Subscription {
        let id = {
            let mut lock = self.listeners.lock();
            let id = lock.next_id;
            lock.next_id += 1;
            lock.listeners.push((id, listener));
            id
        };
        let listeners: Weak<_> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().listeners.retain(|(other, _)| *other != id);
            }
        })
    }
}
