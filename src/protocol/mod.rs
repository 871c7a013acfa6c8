//! File exchange protocol between editor and engine.
//!
//! # Purpose
//!
//! The engine and the editor share one working directory. A request is a
//! *flag* file (presence = "act now", optional one-line tag as content) and,
//! for most channels, a paired JSON *payload* file. File names are the
//! compatibility contract and must not change.
//!
//! # Channels
//!
//! | Flag                   | Payload                  | Direction              |
//! |------------------------|--------------------------|------------------------|
//! | `running.flag`         | -                        | editor (liveness)      |
//! | `placement_mode.flag`  | -                        | editor -> engine       |
//! | `show_colliders.flag`  | -                        | editor -> engine       |
//! | `request_nodes.flag`   | `available_nodes.json`   | editor -> engine -> editor |
//! | `click_event.flag`     | `click_event.json`       | engine -> editor       |
//! | `node_operation.flag`  | `node_operation.json`    | editor -> engine       |
//! | `spawn_object.flag`    | `temp_object.json`       | editor -> engine       |
//! | `save_scene.flag`      | `load_scene.json`        | editor -> engine       |
//! | `load_scene.flag`      | `load_scene.json`        | editor -> engine       |
//! | `request_scenes.flag`  | `available_scenes.json`  | editor -> engine -> editor |
//! | `scene_operation.flag` | `scene_operation.json`   | editor -> engine       |
//! | `switch_scene.flag`    | `switch_scene.json`      | editor -> engine       |
//! | `mode_switch.flag`     | `mode_switch.json`       | editor -> engine       |
//! | `mode7_textures.flag`  | `mode7_textures.json`    | editor -> engine       |
//!
//! Ad hoc engine outputs: `active_scene.json`, `spawn_error.json`.

pub mod hierarchy;
pub mod messages;

pub use hierarchy::{Hierarchy, NodeDescriptor, flatten_forest, flatten_hierarchy, is_root_name};
pub use messages::*;

use serde::{Deserialize, Serialize};

/// Flag tag contents written by the editor.
pub mod tags {
    pub const DEFAULT: &str = "1";
    pub const RUNNING: &str = "running";
    pub const PLACING: &str = "placing";
    pub const SHOW: &str = "show";
    pub const REQUEST: &str = "request";
    pub const SAVE: &str = "save";
    pub const LOAD: &str = "load";
}

/// Sentinel flag files, one per operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Running,
    Placement,
    ShowColliders,
    RequestNodes,
    ClickEvent,
    NodeOperation,
    SpawnObject,
    SaveScene,
    LoadScene,
    RequestScenes,
    SceneOperation,
    SwitchScene,
    ModeSwitch,
    Mode7Textures,
}

impl Flag {
    pub const ALL: [Flag; 14] = [
        Flag::Running,
        Flag::Placement,
        Flag::ShowColliders,
        Flag::RequestNodes,
        Flag::ClickEvent,
        Flag::NodeOperation,
        Flag::SpawnObject,
        Flag::SaveScene,
        Flag::LoadScene,
        Flag::RequestScenes,
        Flag::SceneOperation,
        Flag::SwitchScene,
        Flag::ModeSwitch,
        Flag::Mode7Textures,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            Flag::Running => "running.flag",
            Flag::Placement => "placement_mode.flag",
            Flag::ShowColliders => "show_colliders.flag",
            Flag::RequestNodes => "request_nodes.flag",
            Flag::ClickEvent => "click_event.flag",
            Flag::NodeOperation => "node_operation.flag",
            Flag::SpawnObject => "spawn_object.flag",
            Flag::SaveScene => "save_scene.flag",
            Flag::LoadScene => "load_scene.flag",
            Flag::RequestScenes => "request_scenes.flag",
            Flag::SceneOperation => "scene_operation.flag",
            Flag::SwitchScene => "switch_scene.flag",
            Flag::ModeSwitch => "mode_switch.flag",
            Flag::Mode7Textures => "mode7_textures.flag",
        }
    }

    /// Flags the editor leaves raised between requests (toggles + liveness).
    pub const fn is_latched(self) -> bool {
        matches!(self, Flag::Running | Flag::Placement | Flag::ShowColliders)
    }
}

/// JSON documents exchanged next to flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payload {
    AvailableNodes,
    ClickEvent,
    NodeOperation,
    TempObject,
    LoadScene,
    AvailableScenes,
    SceneOperation,
    SwitchScene,
    ModeSwitch,
    Mode7Textures,
    ActiveScene,
    SpawnError,
}

impl Payload {
    pub const fn file_name(self) -> &'static str {
        match self {
            Payload::AvailableNodes => "available_nodes.json",
            Payload::ClickEvent => "click_event.json",
            Payload::NodeOperation => "node_operation.json",
            Payload::TempObject => "temp_object.json",
            Payload::LoadScene => "load_scene.json",
            Payload::AvailableScenes => "available_scenes.json",
            Payload::SceneOperation => "scene_operation.json",
            Payload::SwitchScene => "switch_scene.json",
            Payload::ModeSwitch => "mode_switch.json",
            Payload::Mode7Textures => "mode7_textures.json",
            Payload::ActiveScene => "active_scene.json",
            Payload::SpawnError => "spawn_error.json",
        }
    }
}
