//! Core editor modules - session state, update loop, notifications
//!
//! Independent of any front-end: the CLI drives them, a GUI could too.

pub mod event_bus;
pub mod session;

// Re-exports for convenience
pub use event_bus::{EditorEvent, EventBus, EventEmitter};
pub use session::{EditorSession, TickOutcome};
