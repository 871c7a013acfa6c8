//! In-process transport with file-protocol semantics.
//!
//! Flags and documents live in a mutex-guarded map instead of a directory.
//! An optional responder plays the engine: it runs synchronously every time a
//! flag is raised and may write results or lower the flag. Raises are kept in
//! a bounded log (oldest dropped first) so tests can assert what was signalled.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::Transport;
use crate::error::Result;
use crate::protocol::{Flag, Payload};

/// Shared exchange contents.
#[derive(Debug, Default, Clone)]
pub struct MemoryState {
    flags: HashMap<Flag, String>,
    docs: HashMap<Payload, Value>,
}

impl MemoryState {
    pub fn raise(&mut self, flag: Flag, content: &str) {
        self.flags.insert(flag, content.to_string());
    }

    pub fn lower(&mut self, flag: Flag) {
        self.flags.remove(&flag);
    }

    pub fn is_raised(&self, flag: Flag) -> bool {
        self.flags.contains_key(&flag)
    }

    pub fn put(&mut self, payload: Payload, doc: Value) {
        self.docs.insert(payload, doc);
    }

    pub fn get(&self, payload: Payload) -> Option<&Value> {
        self.docs.get(&payload)
    }

    pub fn take(&mut self, payload: Payload) -> Option<Value> {
        self.docs.remove(&payload)
    }
}

type Responder = Box<dyn Fn(Flag, &mut MemoryState) + Send + Sync>;

/// Raises remembered for [`MemoryTransport::drain_raised`].
pub const RAISE_LOG_CAPACITY: usize = 256;

pub struct MemoryTransport {
    state: Mutex<MemoryState>,
    responder: Option<Responder>,
    raised_tx: Sender<Flag>,
    raised_rx: Receiver<Flag>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (raised_tx, raised_rx) = bounded(RAISE_LOG_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            responder: None,
            raised_tx,
            raised_rx,
        }
    }

    /// Transport whose engine side is `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(Flag, &mut MemoryState) + Send + Sync + 'static,
    {
        Self { responder: Some(Box::new(responder)), ..Self::new() }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Tag content of a raised flag.
    pub fn flag_content(&self, flag: Flag) -> Option<String> {
        self.state().flags.get(&flag).cloned()
    }

    /// Run `f` against the shared contents (engine-side access).
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state();
        f(&mut state)
    }

    /// Flags raised since the last call, in order. Only the most recent
    /// [`RAISE_LOG_CAPACITY`] are kept.
    pub fn drain_raised(&self) -> Vec<Flag> {
        self.raised_rx.try_iter().collect()
    }

    // Called with the state lock held, so evict + retry cannot interleave
    fn log_raise(&self, flag: Flag) {
        if let Err(TrySendError::Full(flag)) = self.raised_tx.try_send(flag) {
            let _ = self.raised_rx.try_recv();
            let _ = self.raised_tx.try_send(flag);
        }
    }
}

impl Transport for MemoryTransport {
    fn raise(&self, flag: Flag, content: &str) -> Result<()> {
        let mut state = self.state();
        state.raise(flag, content);
        self.log_raise(flag);
        if let Some(responder) = &self.responder {
            responder(flag, &mut state);
        }
        Ok(())
    }

    fn clear(&self, flag: Flag) -> Result<()> {
        self.state().lower(flag);
        Ok(())
    }

    fn is_raised(&self, flag: Flag) -> bool {
        self.state().is_raised(flag)
    }

    fn load(&self, payload: Payload) -> Option<Value> {
        self.state().get(payload).cloned()
    }

    fn store(&self, payload: Payload, doc: &Value) -> bool {
        self.state().put(payload, doc.clone());
        true
    }

    fn discard(&self, payload: Payload) -> bool {
        self.state().take(payload).is_some()
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
