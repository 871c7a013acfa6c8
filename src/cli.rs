use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Build version with protocol info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Protocol: flag + JSON files (engine working directory)\n",
    "Target:   ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Scene editor front-end for the file-polling game engine
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory shared with the engine (default: current directory)
    #[arg(short = 'x', long = "exchange-dir", value_name = "DIR", global = true)]
    pub exchange_dir: Option<PathBuf>,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Fixed wait after raising a flag, in milliseconds (overrides settings)
    #[arg(long = "wait-ms", value_name = "MS", global = true)]
    pub wait_ms: Option<u64>,

    /// Wait until the engine removes the flag instead of a fixed delay
    #[arg(long = "until-cleared", global = true)]
    pub until_cleared: bool,

    /// Extra result re-reads when a request comes back empty
    #[arg(long = "retries", value_name = "N", global = true)]
    pub retries: Option<u32>,

    /// Enable debug logging to file (default: scene_link.log in data dir)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the scene hierarchy, one node per line (pre-order)
    Nodes,

    /// Add an empty node under a parent
    AddNode {
        name: String,
        #[arg(short, long, default_value = "root")]
        parent: String,
    },

    /// Remove a node (children are re-parented)
    RemoveNode { name: String },

    /// Spawn a sprite object at pixel coordinates
    Spawn {
        #[command(flatten)]
        object: ObjectArgs,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },

    /// Place a sprite object at Mode7 world coordinates in [0, 1]
    PlaceMode7 {
        #[command(flatten)]
        object: ObjectArgs,
        /// World X (0..1)
        #[arg(allow_negative_numbers = true)]
        x: String,
        /// World Y (0..1)
        #[arg(allow_negative_numbers = true)]
        y: String,
    },

    /// Spawn a bitmap score text
    BitmapText {
        name: String,
        #[arg(short, long)]
        parent: String,
        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        x: String,
        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        y: String,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        score: String,
    },

    /// List scenes
    Scenes,

    CreateScene { name: String },

    /// Delete a scene (the main scene is protected)
    DeleteScene { name: String },

    SwitchScene { name: String },

    /// Print the engine's active scene
    ActiveScene,

    /// Save the active scene (default: <saves_dir>/<scene>.json)
    SaveScene { path: Option<PathBuf> },

    LoadScene { path: PathBuf },

    /// Switch render mode
    Mode {
        #[arg(value_enum)]
        mode: RenderMode,
    },

    /// Set Mode7 ground and sky textures
    Mode7Textures {
        #[arg(long)]
        ground: String,
        #[arg(long)]
        sky: String,
    },

    /// Show or hide collider overlays
    Colliders {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Run the editor update loop: click-to-place until running.flag disappears
    Watch {
        #[command(flatten)]
        object: ObjectArgs,
        /// Enable click-to-place immediately
        #[arg(long)]
        place: bool,
    },

    /// Remove the editor's latched flags (running, placement, colliders)
    Cleanup,
}

/// Object form fields shared by spawn, place-mode7 and watch
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ObjectArgs {
    /// Object name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Texture path (BMP)
    #[arg(short, long, default_value = "")]
    pub texture: String,

    #[arg(short = 'P', long, default_value = "root")]
    pub parent: String,

    #[arg(long)]
    pub collision: bool,

    /// Script attached to the object
    #[arg(short, long)]
    pub script: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    #[value(name = "2d")]
    Flat,
    #[value(name = "mode7")]
    Mode7,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl From<ObjectArgs> for crate::draft::ObjectDraft {
    fn from(args: ObjectArgs) -> Self {
        Self {
            name: args.name,
            texture_path: args.texture,
            has_collision: args.collision,
            script_path: args.script,
            parent_node: args.parent,
        }
    }
}
