//! Interactive editor session: the object form plus the 16ms update loop.
//!
//! **Architecture**: the session owns an [`EditorClient`] and the state the
//! editor window used to keep in widgets (current draft, placement toggle,
//! 2D/Mode7 mode). Front-ends observe it through the [`EventBus`].
//!
//! # Update loop
//!
//! ```text
//!   tick ──▶ running.flag gone? ──yes──▶ Stop
//!                │ no
//!                ▼
//!        click_event.flag? ──▶ spawn draft at click (placement on) ──▶ remove click files
//! ```
//!
//! At most one click is handled per tick. Both click files are removed even
//! when placement is off or the payload is unreadable.

use crossbeam_channel::{Receiver, select, tick};
use log::{debug, info, trace};

use super::event_bus::{EditorEvent, EventBus, EventEmitter};
use crate::client::EditorClient;
use crate::draft::ObjectDraft;
use crate::error::{EditorError, Result, ValidationError};
use crate::protocol::{ClickEvent, Position};

/// What the loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

pub struct EditorSession {
    client: EditorClient,
    draft: ObjectDraft,
    placement: bool,
    mode7: bool,
    show_colliders: bool,
    events: EventBus,
}

impl EditorSession {
    pub fn new(client: EditorClient) -> Self {
        Self {
            client,
            draft: ObjectDraft::default(),
            placement: false,
            mode7: false,
            show_colliders: false,
            events: EventBus::new(),
        }
    }

    pub fn client(&self) -> &EditorClient {
        &self.client
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn emitter(&self) -> EventEmitter {
        self.events.emitter()
    }

    pub fn draft(&self) -> &ObjectDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ObjectDraft {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: ObjectDraft) {
        self.draft = draft;
    }

    pub fn is_placing(&self) -> bool {
        self.placement
    }

    pub fn is_mode7(&self) -> bool {
        self.mode7
    }

    /// Turn click-to-place on or off. Turning it on needs a complete draft
    /// and 2D mode; Mode7 objects are placed by coordinates instead.
    pub fn toggle_placement(&mut self) -> Result<bool> {
        let enable = !self.placement;
        if enable {
            if let Err(e) = self.draft.validate() {
                return Err(self.report(e.into()));
            }
            if self.mode7 {
                return Err(self.report(ValidationError::ModeMismatch("Mode7").into()));
            }
        }

        self.client.set_placement(enable).map_err(|e| self.report(e))?;
        self.placement = enable;
        let emitter = self.emitter();
        emitter.emit(EditorEvent::PlacementChanged(enable));
        if enable {
            emitter.status("Click in game window to place object");
        } else {
            emitter.status("");
        }
        Ok(enable)
    }

    /// Switch between 2D and Mode7 and tell the engine. Placement is left as is.
    pub fn toggle_mode(&mut self) -> Result<bool> {
        let mode7 = !self.mode7;
        self.client.set_mode(mode7).map_err(|e| self.report(e))?;
        self.mode7 = mode7;
        let emitter = self.emitter();
        emitter.emit(EditorEvent::ModeChanged { mode7 });
        emitter.status(format!("Switched to {} mode", if mode7 { "Mode7" } else { "2D" }));
        Ok(mode7)
    }

    pub fn toggle_colliders(&mut self) -> Result<bool> {
        let on = !self.show_colliders;
        self.client.set_show_colliders(on).map_err(|e| self.report(e))?;
        self.show_colliders = on;
        Ok(on)
    }

    /// Place the current draft at Mode7 world coordinates.
    pub fn place_mode7(&mut self, x: f64, y: f64) -> Result<()> {
        if !self.mode7 {
            return Err(self.report(ValidationError::ModeMismatch("2D").into()));
        }
        match self.client.place_mode7(&self.draft, x, y) {
            Ok(_) => {
                self.spawned(Position::world(x, y));
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Re-query the node list and publish it.
    pub fn refresh_nodes(&self) -> Vec<String> {
        match self.client.node_names() {
            Ok(names) => {
                self.events.emit(EditorEvent::NodesRefreshed(names.clone()));
                names
            }
            Err(e) => {
                self.report(e);
                Vec::new()
            }
        }
    }

    /// Re-query the scene list. Nothing is published when the engine gave no answer.
    pub fn refresh_scenes(&self) -> Option<Vec<String>> {
        match self.client.scenes() {
            Ok(Some(scenes)) => {
                self.events.emit(EditorEvent::ScenesRefreshed(scenes.clone()));
                Some(scenes)
            }
            Ok(None) => None,
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    /// One pass of the update loop.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.client.is_running() {
            info!("running.flag removed, stopping editor loop");
            return TickOutcome::Stop;
        }

        if let Some(click) = self.client.take_click() {
            if self.placement {
                self.place_click(click);
            } else {
                trace!("Click at ({}, {}) ignored, placement off", click.x, click.y);
            }
        }
        TickOutcome::Continue
    }

    fn place_click(&mut self, click: ClickEvent) {
        let position = Position::pixel(click.x, click.y);
        match self.client.spawn_object(&self.draft, position) {
            Ok(_) => self.spawned(position),
            Err(e) => {
                self.report(e);
            }
        }
    }

    fn spawned(&self, position: Position) {
        let name = self.draft.name.trim().to_string();
        self.events.emit(EditorEvent::Status(format!("Created object '{}' at {}", name, position)));
        self.events.emit(EditorEvent::ObjectSpawned { name, position });
    }

    /// Run the update loop until `running.flag` disappears or `shutdown`
    /// fires (or disconnects). Latched flags are removed on the way out.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<()> {
        self.client.mark_running()?;
        let period = self.client.settings().tick();
        let ticker = tick(period);
        info!("Editor loop started ({:?} tick)", period);

        loop {
            select! {
                recv(ticker) -> _ => {
                    if self.tick() == TickOutcome::Stop {
                        break;
                    }
                }
                recv(shutdown) -> _ => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.client.cleanup();
        self.placement = false;
        self.show_colliders = false;
        info!("Editor loop stopped");
        Ok(())
    }

    /// Publish an error: user-facing ones as a blocking notice, the rest as
    /// status text. Returns the error for propagation.
    fn report(&self, err: EditorError) -> EditorError {
        debug!("Reporting: {}", err);
        if err.is_user_facing() {
            self.events.emit(EditorEvent::Notice(err.to_string()));
        } else {
            self.events.emit(EditorEvent::Status(format!("Error: {}", err)));
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Flag, Payload};
    use crate::settings::EditorSettings;
    use crate::transport::{MemoryTransport, Transport};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    /// Consumes one-shot flags and reports an empty hierarchy.
    fn engine() -> Arc<MemoryTransport> {
        Arc::new(MemoryTransport::with_responder(|flag, state| {
            if flag == Flag::RequestNodes {
                state.put(Payload::AvailableNodes, json!([{"name": "root", "children": []}]));
            }
            // click_event.flag belongs to the engine side
            if !flag.is_latched() && flag != Flag::ClickEvent {
                state.lower(flag);
            }
        }))
    }

    fn session(t: &Arc<MemoryTransport>) -> EditorSession {
        let settings = EditorSettings { wait_ms: 0, tick_ms: 1, ..EditorSettings::default() };
        let mut s = EditorSession::new(EditorClient::new(t.clone(), settings));
        s.set_draft(ObjectDraft { name: "Coin".into(), texture_path: "coin.bmp".into(), ..ObjectDraft::default() });
        s
    }

    /// Engine-side click: written straight into the state so the responder
    /// never sees it.
    fn click(t: &MemoryTransport, x: i32, y: i32) {
        t.with_state(|s| {
            s.put(Payload::ClickEvent, json!({"x": x, "y": y}));
            s.raise(Flag::ClickEvent, "1");
        });
    }

    #[test]
    fn test_tick_stops_without_running_flag() {
        let t = engine();
        let mut s = session(&t);
        assert_eq!(s.tick(), TickOutcome::Stop);
        s.client().mark_running().unwrap();
        assert_eq!(s.tick(), TickOutcome::Continue);
    }

    #[test]
    fn test_click_spawns_when_placing() {
        let t = engine();
        let mut s = session(&t);
        s.client().mark_running().unwrap();
        assert!(s.toggle_placement().unwrap());
        assert!(t.is_raised(Flag::Placement));
        s.events().poll();

        click(&t, 120, 48);
        assert_eq!(s.tick(), TickOutcome::Continue);

        let doc = t.load(Payload::TempObject).unwrap();
        assert_eq!(doc["position"], json!({"x": 120, "y": 48}));
        assert_eq!(doc["is_mode7"], json!(false));
        assert!(!t.is_raised(Flag::ClickEvent));
        assert!(t.load(Payload::ClickEvent).is_none());
        assert!(s.events().poll().contains(&EditorEvent::ObjectSpawned {
            name: "Coin".into(),
            position: Position::Pixel { x: 120, y: 48 },
        }));
    }

    #[test]
    fn test_click_discarded_when_not_placing() {
        let t = engine();
        let mut s = session(&t);
        s.client().mark_running().unwrap();
        click(&t, 1, 1);
        s.tick();
        assert!(t.load(Payload::TempObject).is_none());
        assert!(!t.is_raised(Flag::ClickEvent));
        assert!(t.load(Payload::ClickEvent).is_none());
    }

    #[test]
    fn test_placement_needs_valid_draft() {
        let t = engine();
        let mut s = session(&t);
        s.draft_mut().texture_path.clear();
        let err = s.toggle_placement().unwrap_err();
        assert!(matches!(err, EditorError::Validation(ValidationError::MissingSelection("texture"))));
        assert!(!s.is_placing());
        assert!(!t.is_raised(Flag::Placement));
        assert_eq!(s.events().poll(), vec![EditorEvent::Notice("Please select a texture".into())]);
    }

    #[test]
    fn test_placement_refused_in_mode7() {
        let t = engine();
        let mut s = session(&t);
        assert!(s.toggle_mode().unwrap());
        assert_eq!(t.load(Payload::ModeSwitch), Some(json!({"mode7": true})));
        assert!(matches!(
            s.toggle_placement(),
            Err(EditorError::Validation(ValidationError::ModeMismatch(_)))
        ));
        assert!(!s.is_placing());
    }

    #[test]
    fn test_mode_toggle_keeps_placement() {
        let t = engine();
        let mut s = session(&t);
        s.toggle_placement().unwrap();
        s.toggle_mode().unwrap();
        assert!(s.is_placing());
        assert!(t.is_raised(Flag::Placement));
        assert!(!s.toggle_placement().unwrap());
        assert!(!t.is_raised(Flag::Placement));
    }

    #[test]
    fn test_mode7_placement_needs_mode7() {
        let t = engine();
        let mut s = session(&t);
        assert!(s.place_mode7(0.5, 0.5).is_err());
        s.toggle_mode().unwrap();
        s.place_mode7(0.5, 0.5).unwrap();
        assert_eq!(t.load(Payload::TempObject).unwrap()["position"], json!({"x": 0.5, "y": 0.5}));
    }

    #[test]
    fn test_refresh_nodes_publishes() {
        let t = engine();
        let s = session(&t);
        assert_eq!(s.refresh_nodes(), vec!["root"]);
        assert_eq!(s.events().poll(), vec![EditorEvent::NodesRefreshed(vec!["root".into()])]);
        assert_eq!(s.refresh_scenes(), None);
    }

    #[test]
    fn test_run_exits_on_shutdown_and_cleans_up() {
        let t = engine();
        let mut s = session(&t);
        s.toggle_colliders().unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.send(()).unwrap();
        s.run(&rx).unwrap();
        assert!(!t.is_raised(Flag::Running));
        assert!(!t.is_raised(Flag::ShowColliders));
    }

    #[test]
    fn test_shutdown_mid_loop_lowers_latched_flags() {
        let t = engine();
        let mut s = session(&t);
        s.toggle_placement().unwrap();
        s.toggle_colliders().unwrap();

        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        let runner = std::thread::spawn(move || s.run(&rx));
        while !t.is_raised(Flag::Running) {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(10));
        assert!(!runner.is_finished());

        tx.send(()).unwrap();
        runner.join().unwrap().unwrap();
        for flag in [Flag::Running, Flag::Placement, Flag::ShowColliders] {
            assert!(!t.is_raised(flag), "{} left raised", flag.file_name());
        }
    }

    #[test]
    fn test_run_exits_when_running_flag_removed() {
        let t = engine();
        let mut s = session(&t);
        let (_tx, rx) = crossbeam_channel::bounded::<()>(1);
        let remover = {
            let t = t.clone();
            std::thread::spawn(move || {
                while !t.is_raised(Flag::Running) {
                    std::thread::sleep(Duration::from_millis(1));
                }
                std::thread::sleep(Duration::from_millis(20));
                t.clear(Flag::Running).unwrap();
            })
        };
        s.run(&rx).unwrap();
        remover.join().unwrap();
        assert!(!t.is_raised(Flag::Running));
    }
}
