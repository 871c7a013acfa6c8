//! Persistent editor settings (`scene_link.json`).
//!
//! Missing file means defaults. A corrupt file is reported and ignored so a
//! bad edit never keeps the editor from talking to the engine.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EditorError, Result};
use crate::transport::{WaitMode, WaitPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaitStyle {
    /// Sleep `wait_ms` unconditionally (engine default)
    #[default]
    Fixed,
    /// Poll every `poll_ms` until the engine removes the flag, up to `timeout_ms`
    UntilCleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    // Exchange timing
    pub wait_ms: u64,
    pub wait_mode: WaitStyle,
    pub timeout_ms: u64,
    pub poll_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub clear_stale_results: bool,

    // Update loop
    pub tick_ms: u64,

    // Scene rules
    pub root_names: Vec<String>,
    pub main_scene: String,
    pub saves_dir: PathBuf,

    // Bitmap text font sheet
    pub bitmap_font_texture: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            wait_ms: 100,
            wait_mode: WaitStyle::Fixed,
            timeout_ms: 1000,
            poll_ms: 10,
            retries: 0,
            backoff_ms: 100,
            clear_stale_results: true,
            tick_ms: 16,
            root_names: vec!["root".to_string(), "Root".to_string()],
            main_scene: "main".to_string(),
            saves_dir: PathBuf::from("./saves"),
            bitmap_font_texture: "./assets/images/textspritesheet.bmp".to_string(),
        }
    }
}

impl EditorSettings {
    /// Wait policy derived from the timing fields.
    pub fn wait_policy(&self) -> WaitPolicy {
        let mode = match self.wait_mode {
            WaitStyle::Fixed => WaitMode::Fixed(Duration::from_millis(self.wait_ms)),
            WaitStyle::UntilCleared => WaitMode::UntilCleared {
                timeout: Duration::from_millis(self.timeout_ms),
                poll: Duration::from_millis(self.poll_ms.max(1)),
            },
        };
        WaitPolicy {
            mode,
            retries: self.retries,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Load from `path`; defaults when missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| EditorError::Json { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|source| EditorError::Json { path: path.to_path_buf(), source })?;
        fs::write(path, text).map_err(|e| EditorError::io(path, e))
    }
}
