//! JSON documents carried by payload files.
//!
//! Field names follow the engine's reader exactly (including the camelCase
//! `activeName` in `active_scene.json`).

use serde::{Deserialize, Serialize};

/// Object position. 2D objects use integer pixels, Mode7 objects use
/// normalized world coordinates in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Pixel { x: i32, y: i32 },
    World { x: f64, y: f64 },
}

impl Position {
    /// Pixel position from raw click coordinates (truncated toward zero).
    pub fn pixel(x: f64, y: f64) -> Self {
        Position::Pixel { x: x as i32, y: y as i32 }
    }

    pub fn world(x: f64, y: f64) -> Self {
        Position::World { x, y }
    }

    pub fn is_world(&self) -> bool {
        matches!(self, Position::World { .. })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Pixel { x, y } => write!(f, "({}, {})", x, y),
            Position::World { x, y } => write!(f, "({}, {})", x, y),
        }
    }
}

/// `node_operation.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NodeOperation {
    AddNode { name: String, parent: String },
    RemoveNode { name: String, reparent: bool },
}

/// `temp_object.json` for regular sprites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObjectDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub position: Position,
    pub texture_path: String,
    pub has_collision: bool,
    pub has_script: bool,
    pub script_path: String,
    pub parent_node: String,
    pub is_mode7: bool,
}

pub const OBJECT_KIND_CUSTOM: &str = "custom";
pub const OBJECT_KIND_BITMAP_TEXT: &str = "bitmap_text";

/// `temp_object.json` for bitmap-font score text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapTextDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub position: Position,
    pub initial_score: i32,
    pub parent_node: String,
    pub texture_path: String,
}

/// `scene_operation.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SceneOperation {
    Create { name: String },
    Delete { name: String },
}

/// `available_scenes.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneList {
    #[serde(default)]
    pub scenes: Vec<String>,
}

/// `switch_scene.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchScene {
    pub scene: String,
}

/// `load_scene.json`, shared by save and load requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePath {
    pub path: String,
}

/// `mode_switch.json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSwitch {
    pub mode7: bool,
}

/// `mode7_textures.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode7Textures {
    pub ground_texture: String,
    pub sky_texture: String,
}

/// `active_scene.json` (engine output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveScene {
    #[serde(rename = "activeName")]
    pub active_name: String,
}

/// `spawn_error.json` (engine output, consumed by the editor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnError {
    pub error: String,
}

/// `click_event.json` (engine output). Coordinates are window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub x: f64,
    pub y: f64,
}
