//! Editor notification bus.
//!
//! Architecture:
//! - front-ends subscribe with callbacks (invoked immediately on emit)
//! - emit() also queues the event for deferred processing
//! - poll() drains the queue in the caller's loop
//!
//! Callbacks run in subscription order.

use log::warn;
use std::sync::{Arc, Mutex, RwLock};

use crate::protocol::Position;

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// What the editor has to tell its front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Transient status line text
    Status(String),
    /// Blocking notice: validation failure or engine-reported error
    Notice(String),
    NodesRefreshed(Vec<String>),
    ScenesRefreshed(Vec<String>),
    ObjectSpawned { name: String, position: Position },
    ModeChanged { mode7: bool },
    PlacementChanged(bool),
}

type Callback = Arc<dyn Fn(&EditorEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Callback>>>,
    queue: Arc<Mutex<Vec<EditorEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&EditorEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    /// Invoke callbacks, then queue for poll().
    pub fn emit(&self, event: EditorEvent) {
        emit_into(&self.subscribers, &self.queue, event);
    }

    /// All events emitted since the last poll.
    pub fn poll(&self) -> Vec<EditorEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Handle for code that only emits.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            subscribers: Arc::clone(&self.subscribers),
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Emit-only handle sharing the bus state.
#[derive(Clone)]
pub struct EventEmitter {
    subscribers: Arc<RwLock<Vec<Callback>>>,
    queue: Arc<Mutex<Vec<EditorEvent>>>,
}

impl EventEmitter {
    pub fn emit(&self, event: EditorEvent) {
        emit_into(&self.subscribers, &self.queue, event);
    }

    pub fn status(&self, text: impl Into<String>) {
        self.emit(EditorEvent::Status(text.into()));
    }

    pub fn notice(&self, text: impl Into<String>) {
        self.emit(EditorEvent::Notice(text.into()));
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscribers", &self.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

fn emit_into(subscribers: &RwLock<Vec<Callback>>, queue: &Mutex<Vec<EditorEvent>>, event: EditorEvent) {
    for cb in subscribers.read().unwrap_or_else(|e| e.into_inner()).iter() {
        cb(&event);
    }

    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= MAX_QUEUE_SIZE {
        let evict_count = queue.len() / 2;
        warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
        queue.drain(0..evict_count);
    }
    queue.push(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();
        bus.emit(EditorEvent::Status("a".into()));
        bus.emit(EditorEvent::ModeChanged { mode7: true });

        let events = bus.poll();
        assert_eq!(events, vec![EditorEvent::Status("a".into()), EditorEvent::ModeChanged { mode7: true }]);
        assert!(bus.poll().is_empty());
    }

    #[test]
    fn test_subscriber_called_immediately() {
        let bus = EventBus::new();
        let notices = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notices);
        bus.subscribe(move |e| {
            if matches!(e, EditorEvent::Notice(_)) {
                n.fetch_add(1, Ordering::SeqCst);
            }
        });

        let emitter = bus.emitter();
        emitter.notice("Cannot delete the main scene");
        emitter.status("idle");
        assert_eq!(notices.load(Ordering::SeqCst), 1);
        assert_eq!(bus.queue_len(), 2);
    }

    #[test]
    fn test_queue_eviction() {
        let bus = EventBus::new();
        for i in 0..MAX_QUEUE_SIZE + 1 {
            bus.emit(EditorEvent::Status(i.to_string()));
        }
        let events = bus.poll();
        assert_eq!(events.len(), MAX_QUEUE_SIZE / 2 + 1);
        assert_eq!(events.last(), Some(&EditorEvent::Status(MAX_QUEUE_SIZE.to_string())));
    }
}
