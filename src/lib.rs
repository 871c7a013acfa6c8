//! scene-link - editor front-end for the file-polling game engine
//!
//! The engine and the editor share one directory. The editor raises `.flag`
//! files and writes `.json` payloads; the engine picks them up on its own
//! frame loop and answers through more JSON files. This crate wraps that
//! exchange in typed operations.
//!
//! Re-exports all modules for use by the binary target.

// Wire format
pub mod protocol;

// Exchange medium (files on disk, or in-process)
pub mod transport;

// Editor operations and update loop
pub mod client;
pub mod core;
pub mod draft;

// App modules
pub mod cli;
pub mod error;
pub mod paths;
pub mod settings;

// Re-export commonly used types
pub use client::EditorClient;
pub use crate::core::{EditorEvent, EditorSession, EventBus, TickOutcome};
pub use draft::{BitmapTextDraft, ObjectDraft};
pub use error::{EditorError, Result, ValidationError};
pub use protocol::{Flag, Payload, Position};
pub use settings::EditorSettings;
pub use transport::{Ack, FileTransport, MemoryTransport, Reply, Transport, WaitPolicy};
