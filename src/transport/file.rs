//! Flag/JSON files in a shared directory: the transport the engine speaks.

use log::{error, warn};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::Transport;
use crate::error::{EditorError, Result};
use crate::protocol::{Flag, Payload};

/// Parse the JSON document at `path`.
///
/// Absent file is `None` without noise; unreadable or malformed files are
/// logged and also `None`. Never fails.
pub fn read_json(path: &Path) -> Option<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Error reading JSON {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Error parsing JSON {}: {}", path.display(), e);
            None
        }
    }
}

/// Serialize `doc` over whatever is at `path`. `false` on any failure.
pub fn write_json(path: &Path, doc: &Value) -> bool {
    let text = match serde_json::to_string(doc) {
        Ok(text) => text,
        Err(e) => {
            error!("Error serializing JSON for {}: {}", path.display(), e);
            return false;
        }
    };
    match fs::write(path, text) {
        Ok(()) => true,
        Err(e) => {
            error!("Error writing JSON {}: {}", path.display(), e);
            false
        }
    }
}

/// Exchange directory shared with the engine process.
#[derive(Debug, Clone)]
pub struct FileTransport {
    dir: PathBuf,
}

impl FileTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn flag_path(&self, flag: Flag) -> PathBuf {
        self.dir.join(flag.file_name())
    }

    pub fn payload_path(&self, payload: Payload) -> PathBuf {
        self.dir.join(payload.file_name())
    }
}

impl Transport for FileTransport {
    fn raise(&self, flag: Flag, content: &str) -> Result<()> {
        let path = self.flag_path(flag);
        fs::write(&path, content).map_err(|e| EditorError::io(&path, e))
    }

    fn clear(&self, flag: Flag) -> Result<()> {
        let path = self.flag_path(flag);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EditorError::io(&path, e)),
        }
    }

    fn is_raised(&self, flag: Flag) -> bool {
        self.flag_path(flag).exists()
    }

    fn load(&self, payload: Payload) -> Option<Value> {
        read_json(&self.payload_path(payload))
    }

    fn store(&self, payload: Payload, doc: &Value) -> bool {
        write_json(&self.payload_path(payload), doc)
    }

    fn discard(&self, payload: Payload) -> bool {
        let path = self.payload_path(payload);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("files in {}", self.dir.display())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let joined = self.dir.join(path);
        std::path::absolute(&joined).unwrap_or(joined)
    }
}
