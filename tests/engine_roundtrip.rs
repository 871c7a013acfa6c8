//! End-to-end exchanges against a fake engine polling a real directory.

use scene_link::core::{EditorEvent, EditorSession};
use scene_link::settings::WaitStyle;
use scene_link::{Ack, EditorClient, EditorError, EditorSettings, FileTransport, ObjectDraft, ValidationError};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Minimal engine: polls for flags, answers, and removes each flag after
/// writing its results.
struct FakeEngine {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeEngine {
    fn start(dir: &Path) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let dir = dir.to_path_buf();
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut nodes: Vec<String> = Vec::new();
            let mut scenes = vec!["main".to_string()];
            while !flag.load(Ordering::SeqCst) {
                step(&dir, &mut nodes, &mut scenes);
                thread::sleep(Duration::from_millis(2));
            }
        });
        Self { stop, handle: Some(handle) }
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read(dir: &Path, name: &str) -> Value {
    fs::read_to_string(dir.join(name))
        .ok()
        .and_then(|t| serde_json::from_str(&t).ok())
        .unwrap_or(Value::Null)
}

fn write(dir: &Path, name: &str, doc: Value) {
    fs::write(dir.join(name), doc.to_string()).unwrap();
}

fn take_flag(dir: &Path, name: &str) -> bool {
    fs::remove_file(dir.join(name)).is_ok()
}

fn step(dir: &Path, nodes: &mut Vec<String>, scenes: &mut Vec<String>) {
    if dir.join("request_nodes.flag").exists() {
        let children: Vec<Value> = nodes.iter().map(|n| json!({"name": n, "children": []})).collect();
        write(dir, "available_nodes.json", json!([{"name": "root", "children": children}]));
        take_flag(dir, "request_nodes.flag");
    }
    if dir.join("node_operation.flag").exists() {
        let op = read(dir, "node_operation.json");
        let name = op["name"].as_str().unwrap_or_default().to_string();
        match op["action"].as_str() {
            Some("add_node") => nodes.push(name),
            Some("remove_node") => nodes.retain(|n| *n != name),
            _ => {}
        }
        take_flag(dir, "node_operation.flag");
    }
    if dir.join("spawn_object.flag").exists() {
        let obj = read(dir, "temp_object.json");
        if obj["texture_path"] == "missing.bmp" {
            write(dir, "spawn_error.json", json!({"error": "Texture not found"}));
        } else if let Some(name) = obj["name"].as_str() {
            nodes.push(name.to_string());
        }
        take_flag(dir, "spawn_object.flag");
    }
    if dir.join("request_scenes.flag").exists() {
        write(dir, "available_scenes.json", json!({"scenes": scenes}));
        take_flag(dir, "request_scenes.flag");
    }
    if dir.join("scene_operation.flag").exists() {
        let op = read(dir, "scene_operation.json");
        let name = op["name"].as_str().unwrap_or_default().to_string();
        match op["action"].as_str() {
            Some("create") => scenes.push(name),
            Some("delete") => scenes.retain(|s| *s != name),
            _ => {}
        }
        take_flag(dir, "scene_operation.flag");
    }
    if dir.join("switch_scene.flag").exists() {
        let doc = read(dir, "switch_scene.json");
        write(dir, "active_scene.json", json!({"activeName": doc["scene"]}));
        take_flag(dir, "switch_scene.flag");
    }
    take_flag(dir, "mode_switch.flag");
}

fn settings(timeout_ms: u64) -> EditorSettings {
    EditorSettings {
        wait_mode: WaitStyle::UntilCleared,
        timeout_ms,
        poll_ms: 2,
        ..EditorSettings::default()
    }
}

fn client(dir: &Path, timeout_ms: u64) -> EditorClient {
    EditorClient::new(Arc::new(FileTransport::new(dir)), settings(timeout_ms))
}

fn flags_left(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "flag"))
        .collect()
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < Duration::from_secs(5) {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_node_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let _engine = FakeEngine::start(dir.path());
    let c = client(dir.path(), 2000);

    assert_eq!(c.node_names().unwrap(), vec!["root"]);
    assert_eq!(c.add_node("player", "root").unwrap(), Ack::Consumed);
    assert_eq!(c.node_names().unwrap(), vec!["root", "player"]);

    let err = c.add_node("player", "root").unwrap_err();
    assert!(matches!(err, EditorError::Validation(ValidationError::DuplicateName(_))));

    c.remove_node("player").unwrap();
    assert_eq!(c.node_names().unwrap(), vec!["root"]);
    assert!(flags_left(dir.path()).is_empty());
}

#[test]
fn test_spawn_error_is_consumed() {
    let dir = tempfile::tempdir().unwrap();
    let _engine = FakeEngine::start(dir.path());
    let c = client(dir.path(), 2000);

    let draft = ObjectDraft { name: "Ghost".into(), texture_path: "missing.bmp".into(), ..ObjectDraft::default() };
    let err = c.spawn_object(&draft, scene_link::Position::Pixel { x: 5, y: 5 }).unwrap_err();
    assert!(matches!(err, EditorError::Engine(ref msg) if msg == "Texture not found"));
    assert!(!dir.path().join("spawn_error.json").exists());
    assert_eq!(read(dir.path(), "temp_object.json")["position"], json!({"x": 5, "y": 5}));
}

#[test]
fn test_scene_switch_updates_active() {
    let dir = tempfile::tempdir().unwrap();
    let _engine = FakeEngine::start(dir.path());
    let c = client(dir.path(), 2000);

    c.create_scene("cave").unwrap();
    assert_eq!(c.scenes().unwrap(), Some(vec!["main".to_string(), "cave".to_string()]));
    c.switch_scene("cave").unwrap();
    assert_eq!(c.active_scene().as_deref(), Some("cave"));

    assert!(matches!(c.delete_scene("main"), Err(EditorError::Validation(ValidationError::MainScene))));
    assert!(!dir.path().join("scene_operation.flag").exists());
}

#[test]
fn test_absent_engine_times_out_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let c = client(dir.path(), 30);

    assert_eq!(c.scenes().unwrap(), None);
    assert_eq!(c.set_mode(true).unwrap(), Ack::Unconfirmed);
    assert_eq!(read(dir.path(), "mode_switch.json"), json!({"mode7": true}));
    assert!(flags_left(dir.path()).is_empty());
}

#[test]
fn test_watch_loop_places_clicked_object() {
    let dir = tempfile::tempdir().unwrap();
    let _engine = FakeEngine::start(dir.path());

    let mut session = EditorSession::new(client(dir.path(), 2000));
    session.set_draft(ObjectDraft { name: "Coin".into(), texture_path: "coin.bmp".into(), ..ObjectDraft::default() });
    session.toggle_placement().unwrap();
    let events = session.events().clone();

    let (_tx, rx) = crossbeam_channel::bounded::<()>(1);
    let runner = thread::spawn(move || session.run(&rx));

    assert!(wait_for(|| dir.path().join("running.flag").exists()));
    write(dir.path(), "click_event.json", json!({"x": 40, "y": 24}));
    fs::write(dir.path().join("click_event.flag"), "1").unwrap();

    assert!(wait_for(|| read(dir.path(), "temp_object.json")["name"] == "Coin"));
    assert!(wait_for(|| !dir.path().join("click_event.flag").exists()));
    fs::remove_file(dir.path().join("running.flag")).unwrap();

    runner.join().unwrap().unwrap();
    assert!(!dir.path().join("placement_mode.flag").exists());
    assert!(!dir.path().join("click_event.json").exists());
    assert!(events.poll().iter().any(|e| matches!(e, EditorEvent::ObjectSpawned { name, .. } if name == "Coin")));
}
