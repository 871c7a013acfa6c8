use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Env override for the settings/log directory
pub const CONFIG_DIR_ENV: &str = "SCENE_LINK_CONFIG_DIR";
/// Env override for the directory shared with the engine
pub const EXCHANGE_DIR_ENV: &str = "SCENE_LINK_EXCHANGE_DIR";

/// Settings file name
pub const SETTINGS_FILE: &str = "scene_link.json";
/// Default log file name
pub const LOG_FILE: &str = "scene_link.log";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
    /// Directory holding flag/payload files (from CLI or ENV)
    pub exchange_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV vars → None (use defaults)
    pub fn from_env_and_cli(cli_config: Option<PathBuf>, cli_exchange: Option<PathBuf>) -> Self {
        let config_dir = cli_config.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        let exchange_dir =
            cli_exchange.or_else(|| std::env::var(EXCHANGE_DIR_ENV).ok().map(PathBuf::from));

        Self { config_dir, exchange_dir }
    }

    /// Directory shared with the engine.
    ///
    /// The engine reads and writes relative to its own working directory, so
    /// without an override the editor does the same.
    pub fn exchange_dir(&self) -> PathBuf {
        if let Some(dir) = &self.exchange_dir {
            return dir.clone();
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. SCENE_LINK_CONFIG_DIR environment variable
/// 3. Local folder IF scene_link.json exists there
/// 4. Platform-specific config directory from dirs-next (default)
///
/// Platform paths:
/// - Linux: ~/.config/scene-link/{name}
/// - macOS: ~/Library/Application Support/scene-link/{name}
/// - Windows: %APPDATA%\scene-link\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get path to a data file (logs)
///
/// Same priority as [`config_file`], falling back to the platform data dir.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Ensure that configuration and data directories exist
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = get_config_dir(config);
    let data_dir = get_data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }

    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn has_local_settings(dir: &Path) -> bool {
    dir.join(SETTINGS_FILE).exists()
}

fn local_dir_override(config: &PathConfig) -> Option<PathBuf> {
    if let Some(dir) = &config.config_dir {
        return Some(dir.clone());
    }
    std::env::current_dir().ok().filter(|dir| has_local_settings(dir))
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = local_dir_override(config) {
        return dir;
    }
    match dirs_next::config_dir() {
        Some(dir) => dir.join("scene-link"),
        None => PathBuf::from("."),
    }
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = local_dir_override(config) {
        return dir;
    }
    match dirs_next::data_dir() {
        Some(dir) => dir.join("scene-link"),
        None => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
            exchange_dir: None,
        };

        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file(LOG_FILE, &config), PathBuf::from("/custom/scene_link.log"));
    }

    #[test]
    fn test_cli_wins_over_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/cfg")), Some(PathBuf::from("/xchg")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/cfg")));
        assert_eq!(config.exchange_dir(), PathBuf::from("/xchg"));
    }

    #[test]
    fn test_exchange_defaults_to_cwd() {
        let config = PathConfig::default();
        assert_eq!(config.exchange_dir(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_ensure_dirs_creates_custom_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("cfg");
        let config = PathConfig { config_dir: Some(dir.clone()), exchange_dir: None };
        ensure_dirs(&config).unwrap();
        assert!(dir.is_dir());
    }
}
