//! Request/response primitives over an injected transport.
//!
//! # Purpose
//!
//! The engine only understands flag + JSON file pairs, but call sites should
//! not care. [`Transport`] is the seam: [`FileTransport`] speaks the real
//! protocol on disk, [`MemoryTransport`] keeps the same semantics in process.
//!
//! # Lifecycle of one request
//!
//! ```text
//!   IDLE ──signal()──▶ SIGNALED ──wait (fixed / until cleared)──▶ RESOLVED { Data | Empty | TimedOut }
//! ```
//!
//! - payload is written first, flag second ([`send`])
//! - the flag is owned by a [`FlagGuard`] and removed on every exit path
//! - a channel whose flag is still up is busy; nothing is overwritten
//!
//! # Used by
//!
//! - `client.rs` - every editor operation
//! - `core/session.rs` - click event polling and latched toggles

pub mod file;
pub mod memory;

pub use file::{FileTransport, read_json, write_json};
pub use memory::{MemoryState, MemoryTransport};

use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{EditorError, Result};
use crate::protocol::{Flag, Payload};

/// Shared exchange medium between editor and engine.
///
/// Implementations never panic and never surface read failures: a document
/// that cannot be read is simply absent.
pub trait Transport: Send + Sync {
    /// Create (or overwrite) a flag with the given tag content.
    fn raise(&self, flag: Flag, content: &str) -> Result<()>;

    /// Remove a flag. Removing an absent flag is not an error.
    fn clear(&self, flag: Flag) -> Result<()>;

    fn is_raised(&self, flag: Flag) -> bool;

    /// Current payload document, `None` if absent or unreadable.
    fn load(&self, payload: Payload) -> Option<Value>;

    /// Overwrite a payload document. `false` on any failure.
    fn store(&self, payload: Payload, doc: &Value) -> bool;

    /// Delete a payload document. `true` if something was removed.
    fn discard(&self, payload: Payload) -> bool;

    /// Short description for logs.
    fn describe(&self) -> String;

    /// Path as the engine will see it. The engine resolves relative paths
    /// against its own working directory, which is the exchange medium.
    fn resolve(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Typed [`Transport::load`]. Shape mismatches are logged and read as absent.
pub fn load_as<T: DeserializeOwned>(transport: &dyn Transport, payload: Payload) -> Option<T> {
    let value = transport.load(payload)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Unexpected shape in {}: {}", payload.file_name(), e);
            None
        }
    }
}

/// Typed [`Transport::store`].
pub fn store_as<T: Serialize>(transport: &dyn Transport, payload: Payload, doc: &T) -> bool {
    match serde_json::to_value(doc) {
        Ok(value) => transport.store(payload, &value),
        Err(e) => {
            warn!("Failed to serialize {}: {}", payload.file_name(), e);
            false
        }
    }
}

/// Scoped flag. Dropping the guard removes the flag unless it was latched.
#[must_use = "dropping the guard immediately lowers the flag"]
pub struct FlagGuard<'a> {
    transport: &'a dyn Transport,
    flag: Flag,
    armed: bool,
}

impl FlagGuard<'_> {
    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// Leave the flag raised after the guard goes away (toggles, liveness).
    pub fn latch(mut self) {
        self.armed = false;
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.transport.clear(self.flag) {
            warn!("Failed to lower {}: {}", self.flag.file_name(), e);
        } else {
            trace!("Lowered {}", self.flag.file_name());
        }
    }
}

/// Raise `flag` with `content` and return the guard that lowers it.
pub fn signal<'a>(transport: &'a dyn Transport, flag: Flag, content: &str) -> Result<FlagGuard<'a>> {
    transport.raise(flag, content)?;
    trace!("Raised {} ({:?})", flag.file_name(), content);
    Ok(FlagGuard { transport, flag, armed: true })
}

/// How long to keep a flag up before reading results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitMode {
    /// Unconditional sleep. This is what the engine has always been driven with.
    Fixed(Duration),
    /// Poll until the engine removes the flag, bounded by `timeout`.
    UntilCleared { timeout: Duration, poll: Duration },
}

/// Wait strategy plus bounded re-reads for results that arrive late.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitPolicy {
    pub mode: WaitMode,
    /// Extra result reads after the first one comes back empty.
    pub retries: u32,
    /// Delay before the first re-read; doubles on every further attempt.
    pub backoff: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            mode: WaitMode::Fixed(Duration::from_millis(100)),
            retries: 0,
            backoff: Duration::from_millis(100),
        }
    }
}

impl WaitPolicy {
    pub fn fixed(wait: Duration) -> Self {
        Self { mode: WaitMode::Fixed(wait), ..Self::default() }
    }

    pub fn until_cleared(timeout: Duration, poll: Duration) -> Self {
        Self { mode: WaitMode::UntilCleared { timeout, poll }, ..Self::default() }
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Result of a request/response exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The result document was present.
    Data(Value),
    /// The engine consumed the flag but left no result.
    Empty,
    /// The flag was still up when waiting ended.
    TimedOut,
}

impl Reply {
    pub fn into_data(self) -> Option<Value> {
        match self {
            Reply::Data(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Reply::Data(_))
    }
}

/// Delivery confirmation for one-way requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The engine removed the flag while we were waiting.
    Consumed,
    /// Waiting ended with the flag still up. The engine may still act on it.
    Unconfirmed,
}

/// Keep the flag up according to `mode`. Returns true once the flag is gone.
fn hold(transport: &dyn Transport, flag: Flag, mode: WaitMode) -> bool {
    match mode {
        WaitMode::Fixed(wait) => {
            thread::sleep(wait);
            !transport.is_raised(flag)
        }
        WaitMode::UntilCleared { timeout, poll } => {
            let started = Instant::now();
            loop {
                if !transport.is_raised(flag) {
                    return true;
                }
                if started.elapsed() >= timeout {
                    return false;
                }
                thread::sleep(poll.min(timeout.saturating_sub(started.elapsed())));
            }
        }
    }
}

fn ensure_idle(transport: &dyn Transport, flag: Flag) -> Result<()> {
    if transport.is_raised(flag) {
        return Err(EditorError::ChannelBusy(flag));
    }
    Ok(())
}

/// Signal `flag`, wait per `policy`, then read `result`.
///
/// With `clear_stale` the previous result document is discarded first, so an
/// old answer is never mistaken for a new one.
pub fn request(
    transport: &dyn Transport,
    flag: Flag,
    content: &str,
    result: Payload,
    policy: &WaitPolicy,
    clear_stale: bool,
) -> Result<Reply> {
    ensure_idle(transport, flag)?;
    if clear_stale && transport.discard(result) {
        trace!("Discarded stale {}", result.file_name());
    }

    let guard = signal(transport, flag, content)?;
    let consumed = hold(transport, flag, policy.mode);

    let mut attempt = 0;
    let data = loop {
        if let Some(doc) = transport.load(result) {
            break Some(doc);
        }
        if attempt >= policy.retries {
            break None;
        }
        let delay = policy.backoff_for(attempt);
        debug!(
            "No {} yet, re-reading in {:?} ({}/{})",
            result.file_name(),
            delay,
            attempt + 1,
            policy.retries
        );
        thread::sleep(delay);
        attempt += 1;
    };
    drop(guard);

    Ok(match data {
        Some(doc) => Reply::Data(doc),
        None if consumed => Reply::Empty,
        None => Reply::TimedOut,
    })
}

/// `signal` + wait + read, degrading every failure to "no data".
pub fn request_and_wait(
    transport: &dyn Transport,
    flag: Flag,
    result: Payload,
    wait: Duration,
) -> Option<Value> {
    match request(transport, flag, crate::protocol::tags::DEFAULT, result, &WaitPolicy::fixed(wait), false) {
        Ok(reply) => reply.into_data(),
        Err(e) => {
            warn!("Request {} failed: {}", flag.file_name(), e);
            None
        }
    }
}

/// Write `doc` to `payload`, then raise `flag` and hold it per `policy`.
pub fn send<T: Serialize>(
    transport: &dyn Transport,
    flag: Flag,
    content: &str,
    payload: Payload,
    doc: &T,
    policy: &WaitPolicy,
) -> Result<Ack> {
    ensure_idle(transport, flag)?;
    if !store_as(transport, payload, doc) {
        return Err(EditorError::PayloadWrite(payload));
    }

    let _guard = signal(transport, flag, content)?;
    let ack = if hold(transport, flag, policy.mode) {
        Ack::Consumed
    } else {
        Ack::Unconfirmed
    };
    debug!("{} -> {:?}", flag.file_name(), ack);
    Ok(ack)
}
