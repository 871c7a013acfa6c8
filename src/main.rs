use scene_link::cli::{Args, Command, RenderMode, Toggle};
use scene_link::client::EditorClient;
use scene_link::core::{EditorEvent, EditorSession};
use scene_link::draft::{BitmapTextDraft, ObjectDraft, parse_int, parse_world_coords};
use scene_link::error::EditorError;
use scene_link::paths::{self, PathConfig};
use scene_link::protocol::Position;
use scene_link::settings::{EditorSettings, WaitStyle};
use scene_link::transport::{Ack, FileTransport};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone(), args.exchange_dir.clone());

    // Ensure directories exist
    if let Err(e) = paths::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);

    let settings_path = paths::config_file(paths::SETTINGS_FILE, &path_config);
    info!("Config path: {}", settings_path.display());
    let settings = apply_overrides(EditorSettings::load_or_default(&settings_path), &args);

    let exchange_dir = path_config.exchange_dir();
    info!("Exchange dir: {}", exchange_dir.display());
    let transport = Arc::new(FileTransport::new(exchange_dir));
    let client = EditorClient::new(transport, settings);

    if let Err(e) = run_command(args.command, client) {
        // Validation and engine errors are notices for the user, not crashes
        if let Some(err) = e.downcast_ref::<EditorError>().filter(|err| err.is_user_facing()) {
            eprintln!("{}", err);
            std::process::exit(2);
        }
        return Err(e);
    }
    Ok(())
}

/// Log level from `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| paths::data_file(paths::LOG_FILE, path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// CLI timing flags win over the settings file.
fn apply_overrides(mut settings: EditorSettings, args: &Args) -> EditorSettings {
    if let Some(ms) = args.wait_ms {
        settings.wait_ms = ms;
    }
    if args.until_cleared {
        settings.wait_mode = WaitStyle::UntilCleared;
    }
    if let Some(retries) = args.retries {
        settings.retries = retries;
    }
    settings
}

fn report_ack(what: &str, ack: Ack) {
    match ack {
        Ack::Consumed => println!("{}", what),
        Ack::Unconfirmed => {
            warn!("Engine did not confirm: {}", what);
            println!("{} (not confirmed by engine)", what);
        }
    }
}

fn run_command(command: Command, client: EditorClient) -> Result<()> {
    match command {
        Command::Nodes => {
            let Some(hierarchy) = client.hierarchy()? else {
                eprintln!("No hierarchy reported by engine");
                return Ok(());
            };
            for name in hierarchy.names() {
                println!("{}", name);
            }
        }
        Command::AddNode { name, parent } => {
            let ack = client.add_node(&name, &parent)?;
            report_ack(&format!("Added node '{}' under '{}'", name.trim(), parent.trim()), ack);
        }
        Command::RemoveNode { name } => {
            let ack = client.remove_node(&name)?;
            report_ack(&format!("Removed node '{}'", name.trim()), ack);
        }
        Command::Spawn { object, x, y } => {
            let draft: ObjectDraft = object.into();
            let ack = client.spawn_object(&draft, Position::Pixel { x, y })?;
            report_ack(&format!("Created object '{}' at ({}, {})", draft.name.trim(), x, y), ack);
        }
        Command::PlaceMode7 { object, x, y } => {
            let draft: ObjectDraft = object.into();
            let (x, y) = parse_world_coords(&x, &y).map_err(EditorError::from)?;
            let ack = client.place_mode7(&draft, x, y)?;
            report_ack(&format!("Created Mode7 object at ({}, {})", x, y), ack);
        }
        Command::BitmapText { name, parent, x, y, score } => {
            let draft = BitmapTextDraft {
                name,
                parent_node: Some(parent),
                x: parse_int("x", &x).map_err(EditorError::from)?,
                y: parse_int("y", &y).map_err(EditorError::from)?,
                initial_score: parse_int("score", &score).map_err(EditorError::from)?,
            };
            let ack = client.spawn_bitmap_text(&draft)?;
            report_ack(&format!("Created bitmap text '{}'", draft.name.trim()), ack);
        }
        Command::Scenes => match client.scenes()? {
            Some(scenes) => scenes.iter().for_each(|s| println!("{}", s)),
            None => eprintln!("No scene list reported by engine"),
        },
        Command::CreateScene { name } => {
            let ack = client.create_scene(&name)?;
            report_ack(&format!("Created scene '{}'", name.trim()), ack);
        }
        Command::DeleteScene { name } => {
            let ack = client.delete_scene(&name)?;
            report_ack(&format!("Deleted scene '{}'", name.trim()), ack);
        }
        Command::SwitchScene { name } => {
            let ack = client.switch_scene(&name)?;
            report_ack(&format!("Switched to scene '{}'", name.trim()), ack);
        }
        Command::ActiveScene => {
            let active = client.active_scene().ok_or(EditorError::NoActiveScene)?;
            println!("{}", active);
        }
        Command::SaveScene { path } => {
            let saved = client.save_scene(path.as_deref())?;
            println!("Scene saved as {}", saved.display());
        }
        Command::LoadScene { path } => {
            let ack = client.load_scene(&path)?;
            report_ack(&format!("Scene loaded from {}", path.display()), ack);
        }
        Command::Mode { mode } => {
            let ack = client.set_mode(mode == RenderMode::Mode7)?;
            let label = if mode == RenderMode::Mode7 { "Mode7" } else { "2D" };
            report_ack(&format!("Switched to {} mode", label), ack);
        }
        Command::Mode7Textures { ground, sky } => {
            let ack = client.apply_mode7_textures(Some(&ground), Some(&sky))?;
            report_ack("Mode7 textures updated", ack);
        }
        Command::Colliders { state } => {
            client.set_show_colliders(state == Toggle::On)?;
        }
        Command::Watch { object, place } => watch(client, object.into(), place)?,
        Command::Cleanup => client.cleanup(),
    }
    Ok(())
}

/// Interactive update loop. Ends on Ctrl+C or when the engine (or the
/// user) removes `running.flag`.
fn watch(client: EditorClient, draft: ObjectDraft, place: bool) -> Result<()> {
    let mut session = EditorSession::new(client);
    session.set_draft(draft);
    session.events().subscribe(|event| match event {
        EditorEvent::Notice(text) => eprintln!("{}", text),
        EditorEvent::Status(text) if !text.is_empty() => println!("{}", text),
        _ => {}
    });

    session.refresh_nodes();
    if place {
        session.toggle_placement().context("Cannot enable placement")?;
    }

    // Ctrl+C leaves through run()'s cleanup so no latched flag stays behind
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    }) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }
    session.run(&shutdown_rx).context("Editor loop failed")?;
    Ok(())
}
