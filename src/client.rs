//! Editor operations against the engine.
//!
//! # Purpose
//!
//! One method per editor intent (add node, spawn object, switch scene, ...).
//! Each method validates its input first and only then touches the
//! transport, so a rejected request never leaves a payload or flag behind.
//!
//! # Used by
//!
//! - `core/session.rs` - placement clicks, mode toggles, refreshes
//! - `main.rs` - one subcommand per method

use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::draft::{BitmapTextDraft, ObjectDraft, check_world_coords};
use crate::error::{EditorError, Result, ValidationError};
use crate::protocol::{
    ActiveScene, ClickEvent, Flag, Hierarchy, Mode7Textures, ModeSwitch, NodeOperation, Payload, Position,
    SceneList, SceneOperation, ScenePath, SpawnError, SwitchScene, is_root_name, tags,
};
use crate::settings::EditorSettings;
use crate::transport::{self, Ack, Reply, Transport, WaitPolicy, load_as, signal};

pub struct EditorClient {
    transport: Arc<dyn Transport>,
    settings: EditorSettings,
    policy: WaitPolicy,
}

impl EditorClient {
    pub fn new(transport: Arc<dyn Transport>, settings: EditorSettings) -> Self {
        let policy = settings.wait_policy();
        info!("Editor client on {} (wait: {:?})", transport.describe(), policy.mode);
        Self { transport, settings, policy }
    }

    pub fn transport(&self) -> &dyn Transport {
        &*self.transport
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    fn query(&self, flag: Flag, content: &str, result: Payload) -> Result<Reply> {
        let reply = transport::request(
            self.transport(),
            flag,
            content,
            result,
            &self.policy,
            self.settings.clear_stale_results,
        )?;
        if !reply.is_data() {
            debug!("{} answered {:?}", flag.file_name(), reply);
        }
        Ok(reply)
    }

    fn send<T: Serialize>(&self, flag: Flag, content: &str, payload: Payload, doc: &T) -> Result<Ack> {
        transport::send(self.transport(), flag, content, payload, doc, &self.policy)
    }

    // ========== Scene tree ==========

    /// Current scene hierarchy, `None` when the engine gave no usable answer.
    pub fn hierarchy(&self) -> Result<Option<Hierarchy>> {
        match self.query(Flag::RequestNodes, tags::REQUEST, Payload::AvailableNodes)? {
            Reply::Data(value) => Ok(Hierarchy::from_value(value)),
            _ => Ok(None),
        }
    }

    /// Pre-order node names for selection lists.
    pub fn node_names(&self) -> Result<Vec<String>> {
        Ok(self.hierarchy()?.map(|h| h.names()).unwrap_or_default())
    }

    fn ensure_unique(&self, name: &str) -> Result<()> {
        if let Some(hierarchy) = self.hierarchy()? {
            if hierarchy.contains(name) {
                return Err(ValidationError::DuplicateName(name.to_string()).into());
            }
        }
        Ok(())
    }

    fn is_root(&self, name: &str) -> bool {
        is_root_name(name, &self.settings.root_names)
    }

    pub fn add_node(&self, name: &str, parent: &str) -> Result<Ack> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let parent = parent.trim();
        if parent.is_empty() {
            return Err(ValidationError::MissingSelection("parent node").into());
        }
        if self.is_root(name) {
            return Err(ValidationError::RootNode(name.to_string()).into());
        }
        self.ensure_unique(name)?;

        let op = NodeOperation::AddNode { name: name.to_string(), parent: parent.to_string() };
        let ack = self.send(Flag::NodeOperation, tags::DEFAULT, Payload::NodeOperation, &op)?;
        info!("Added node '{}' under '{}'", name, parent);
        Ok(ack)
    }

    /// Remove a node; its children are re-parented by the engine.
    pub fn remove_node(&self, name: &str) -> Result<Ack> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingSelection("node to remove").into());
        }
        if self.is_root(name) {
            return Err(ValidationError::RootNode(name.to_string()).into());
        }

        let op = NodeOperation::RemoveNode { name: name.to_string(), reparent: true };
        let ack = self.send(Flag::NodeOperation, tags::DEFAULT, Payload::NodeOperation, &op)?;
        info!("Removed node '{}'", name);
        Ok(ack)
    }

    // ========== Objects ==========

    /// Spawn `draft` at `position`. Errors reported by the engine through
    /// `spawn_error.json` are consumed and returned as [`EditorError::Engine`].
    pub fn spawn_object(&self, draft: &ObjectDraft, position: Position) -> Result<Ack> {
        draft.validate()?;
        if let Position::World { x, y } = position {
            check_world_coords(x, y)?;
        }
        self.ensure_unique(draft.name.trim())?;

        let descriptor = draft.descriptor(position);
        self.spawn(&descriptor, &descriptor.name, position)
    }

    /// Mode7 placement at normalized world coordinates.
    pub fn place_mode7(&self, draft: &ObjectDraft, x: f64, y: f64) -> Result<Ack> {
        draft.validate()?;
        check_world_coords(x, y)?;
        self.spawn_object(draft, Position::world(x, y))
    }

    pub fn spawn_bitmap_text(&self, draft: &BitmapTextDraft) -> Result<Ack> {
        draft.validate()?;
        self.ensure_unique(draft.name.trim())?;

        let descriptor = draft.descriptor(&self.settings.bitmap_font_texture);
        self.spawn(&descriptor, &descriptor.name, descriptor.position)
    }

    fn spawn<T: Serialize>(&self, descriptor: &T, name: &str, position: Position) -> Result<Ack> {
        if self.transport.discard(Payload::SpawnError) {
            debug!("Dropped stale spawn error");
        }
        let ack = self.send(Flag::SpawnObject, tags::DEFAULT, Payload::TempObject, descriptor)?;

        if let Some(err) = load_as::<SpawnError>(self.transport(), Payload::SpawnError) {
            self.transport.discard(Payload::SpawnError);
            warn!("Engine refused '{}': {}", name, err.error);
            return Err(EditorError::Engine(err.error));
        }
        info!("Created object '{}' at {}", name, position);
        Ok(ack)
    }

    // ========== Scenes ==========

    /// Scene names, `None` when the engine gave no answer.
    pub fn scenes(&self) -> Result<Option<Vec<String>>> {
        match self.query(Flag::RequestScenes, tags::DEFAULT, Payload::AvailableScenes)? {
            Reply::Data(value) => match serde_json::from_value::<SceneList>(value) {
                Ok(list) => Ok(Some(list.scenes)),
                Err(e) => {
                    warn!("Malformed scene list: {}", e);
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    pub fn create_scene(&self, name: &str) -> Result<Ack> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let op = SceneOperation::Create { name: name.to_string() };
        let ack = self.send(Flag::SceneOperation, tags::DEFAULT, Payload::SceneOperation, &op)?;
        info!("Created scene '{}'", name);
        Ok(ack)
    }

    pub fn delete_scene(&self, name: &str) -> Result<Ack> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingSelection("scene").into());
        }
        if name == self.settings.main_scene {
            return Err(ValidationError::MainScene.into());
        }
        let op = SceneOperation::Delete { name: name.to_string() };
        let ack = self.send(Flag::SceneOperation, tags::DEFAULT, Payload::SceneOperation, &op)?;
        info!("Deleted scene '{}'", name);
        Ok(ack)
    }

    pub fn switch_scene(&self, name: &str) -> Result<Ack> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingSelection("scene").into());
        }
        let doc = SwitchScene { scene: name.to_string() };
        let ack = self.send(Flag::SwitchScene, tags::DEFAULT, Payload::SwitchScene, &doc)?;
        info!("Switched to scene '{}'", name);
        Ok(ack)
    }

    /// Name the engine last published in `active_scene.json`.
    pub fn active_scene(&self) -> Option<String> {
        load_as::<ActiveScene>(self.transport(), Payload::ActiveScene)
            .map(|a| a.active_name)
            .filter(|name| !name.is_empty())
    }

    /// Ask the engine to save the active scene. Without `target` the file
    /// goes to `<saves_dir>/<active scene>.json`. Relative paths are taken
    /// from the engine's side of the exchange.
    pub fn save_scene(&self, target: Option<&Path>) -> Result<PathBuf> {
        let active = self.active_scene().ok_or(EditorError::NoActiveScene)?;
        let path = match target {
            Some(path) => self.transport.resolve(path),
            None => {
                let dir = self.transport.resolve(&self.settings.saves_dir);
                std::fs::create_dir_all(&dir).map_err(|e| EditorError::io(&dir, e))?;
                dir.join(format!("{}.json", active))
            }
        };

        let doc = ScenePath { path: path.to_string_lossy().into_owned() };
        self.send(Flag::SaveScene, tags::SAVE, Payload::LoadScene, &doc)?;
        info!("Scene '{}' saved as {}", active, path.display());
        Ok(path)
    }

    pub fn load_scene(&self, path: &Path) -> Result<Ack> {
        let path = self.transport.resolve(path);
        let doc = ScenePath { path: path.to_string_lossy().into_owned() };
        let ack = self.send(Flag::LoadScene, tags::LOAD, Payload::LoadScene, &doc)?;
        info!("Scene loaded from {}", path.display());
        Ok(ack)
    }

    // ========== Render mode ==========

    pub fn set_mode(&self, mode7: bool) -> Result<Ack> {
        let ack = self.send(Flag::ModeSwitch, tags::DEFAULT, Payload::ModeSwitch, &ModeSwitch { mode7 })?;
        info!("Switched to {} mode", if mode7 { "Mode7" } else { "2D" });
        Ok(ack)
    }

    pub fn apply_mode7_textures(&self, ground: Option<&str>, sky: Option<&str>) -> Result<Ack> {
        let ground = ground.filter(|s| !s.is_empty()).ok_or(ValidationError::MissingSelection("ground texture"))?;
        let sky = sky.filter(|s| !s.is_empty()).ok_or(ValidationError::MissingSelection("sky texture"))?;
        let doc = Mode7Textures { ground_texture: ground.to_string(), sky_texture: sky.to_string() };
        let ack = self.send(Flag::Mode7Textures, tags::DEFAULT, Payload::Mode7Textures, &doc)?;
        info!("Mode7 textures updated");
        Ok(ack)
    }

    // ========== Latched flags ==========

    fn set_latched(&self, flag: Flag, content: &str, on: bool) -> Result<()> {
        if on {
            signal(self.transport(), flag, content)?.latch();
        } else {
            self.transport.clear(flag)?;
        }
        debug!("{} {}", flag.file_name(), if on { "up" } else { "down" });
        Ok(())
    }

    pub fn set_show_colliders(&self, on: bool) -> Result<()> {
        self.set_latched(Flag::ShowColliders, tags::SHOW, on)
    }

    pub fn set_placement(&self, on: bool) -> Result<()> {
        self.set_latched(Flag::Placement, tags::PLACING, on)
    }

    pub fn mark_running(&self) -> Result<()> {
        self.set_latched(Flag::Running, tags::RUNNING, true)
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_raised(Flag::Running)
    }

    /// Remove the editor's latched flags. Failures are logged, not returned.
    pub fn cleanup(&self) {
        for flag in [Flag::ShowColliders, Flag::Running, Flag::Placement] {
            if let Err(e) = self.transport.clear(flag) {
                warn!("Error during cleanup: {}", e);
            }
        }
    }

    // ========== Engine events ==========

    /// Take the pending click event, if any. Both click files are removed
    /// whether or not the payload was readable.
    pub fn take_click(&self) -> Option<ClickEvent> {
        if !self.transport.is_raised(Flag::ClickEvent) {
            return None;
        }
        let click = load_as::<ClickEvent>(self.transport(), Payload::ClickEvent);
        if let Err(e) = self.transport.clear(Flag::ClickEvent) {
            warn!("Failed to remove click flag: {}", e);
        }
        self.transport.discard(Payload::ClickEvent);
        click
    }
}
