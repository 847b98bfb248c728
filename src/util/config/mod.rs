//! AgentLab configuration system
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Project-level (./agentlab.toml)
//! 3. User-level (~/.config/agentlab/config.toml)
//! 4. Default values
//! ```
//!
//! # Example
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [fmt]
//! use_tabs = false
//! indent_width = 2
//!
//! [symbols]
//! path = "symbols.toml"
//! ```

use crate::frontend::printer::PrintOptions;
use crate::middle::resolve::ResolverSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Project-level config file name
pub const PROJECT_CONFIG: &str = "agentlab.toml";

/// User-level configuration for AgentLab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
    /// Format settings
    #[serde(default)]
    pub fmt: FmtConfig,
    /// Symbol table settings
    #[serde(default)]
    pub symbols: SymbolsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `debug`, `info`, `warn` or `error`
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

/// Format configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmtConfig {
    /// Use tabs for indentation
    #[serde(default = "default_use_tabs")]
    pub use_tabs: bool,
    /// Indent width when not using tabs
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
}

fn default_use_tabs() -> bool {
    true
}

fn default_indent_width() -> usize {
    4
}

impl Default for FmtConfig {
    fn default() -> Self {
        Self {
            use_tabs: true,
            indent_width: 4,
        }
    }
}

impl From<&FmtConfig> for PrintOptions {
    fn from(config: &FmtConfig) -> Self {
        PrintOptions {
            use_tabs: config.use_tabs,
            indent_width: config.indent_width,
        }
    }
}

/// Symbol table configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SymbolsConfig {
    /// TOML file with `[graphs]`, `[state_graphs]` and `[objects]` tables
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("agentlab"));
    }

    // Fallback to ~/.config/agentlab
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("agentlab"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("agentlab"));
    }

    None
}

/// Get the user config file path (~/.config/agentlab/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// First existing config file: project-level in `dir`, then user-level
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let project = dir.join(PROJECT_CONFIG);
    if project.is_file() {
        return Some(project);
    }
    get_config_path().filter(|p| p.is_file())
}

/// Load configuration for a working directory
/// Returns default config if no file exists
pub fn load_config(dir: &Path) -> Result<UserConfig, ConfigError> {
    match find_config(dir) {
        Some(path) => load_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load configuration from a specific file
pub fn load_config_from(path: &Path) -> Result<UserConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save user-level configuration
pub fn save_user_config(config: &UserConfig) -> Result<(), ConfigError> {
    let dir = get_config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_config_to(config, &dir.join("config.toml"))
}

/// Save configuration to a specific file, creating parent directories
pub fn save_config_to(
    config: &UserConfig,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::IoError)?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    fs::write(path, content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Load a symbols file into resolver tables
pub fn load_symbols(path: &Path) -> Result<ResolverSet, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    ResolverSet::from_toml_str(&content).map_err(ConfigError::ParseError)
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(toml::de::Error),
    SerializeError(toml::ser::Error),
    NoConfigDir,
}

impl std::fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Config parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Config serialize error: {}", e),
            ConfigError::NoConfigDir => write!(f, "Cannot determine config directory"),
        }
    }
}

impl std::error::Error for ConfigError {}
