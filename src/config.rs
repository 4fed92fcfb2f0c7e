//! Configuration file support for pimenu.
//!
//! The configuration lists the game sets shown as cards, the emulators that
//! launch them, loader tuning and the control bindings. It is read once at
//! startup and never changes while the launcher runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_FILE, DEFAULT_AXIS_DEADZONE, DEFAULT_FRAME_TEMPLATE, DEFAULT_MAX_FRAMES,
    DEFAULT_PRELOAD_MARGIN, DEFAULT_SCREENSHOT_TEMPLATE, DEFAULT_WORKER_COUNT,
};
use crate::controls::{Binding, ControlBindings};
use crate::model::{Emulator, EmulatorStore};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Launcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Loader and logging preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Emulator profiles by name
    #[serde(default)]
    pub emulators: BTreeMap<String, EmulatorConfig>,

    /// Game sets, one card each
    #[serde(default)]
    pub sets: Vec<SetConfig>,

    /// Control bindings
    #[serde(default)]
    pub controls: ControlsConfig,
}

/// Loader and logging preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Number of cards to preload on each side of the selection
    #[serde(default = "default_preload_margin")]
    pub preload_margin: usize,

    /// Maximum number of loader threads
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Maximum number of animation frames per card
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,

    /// Title screenshot path template (`{archive}` is substituted)
    #[serde(default = "default_screenshot_template")]
    pub screenshot_template: String,

    /// Animation frame path template (`{archive}` and `{frame}` are substituted)
    #[serde(default = "default_frame_template")]
    pub frame_template: String,

    /// Store decoded rows bottom-up for GL upload
    #[serde(default = "default_flip_vertical")]
    pub flip_vertical: bool,
}

fn default_preload_margin() -> usize {
    DEFAULT_PRELOAD_MARGIN
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_max_frames() -> usize {
    DEFAULT_MAX_FRAMES
}

fn default_screenshot_template() -> String {
    DEFAULT_SCREENSHOT_TEMPLATE.to_string()
}

fn default_frame_template() -> String {
    DEFAULT_FRAME_TEMPLATE.to_string()
}

fn default_flip_vertical() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            preload_margin: default_preload_margin(),
            worker_count: default_worker_count(),
            max_frames: default_max_frames(),
            screenshot_template: default_screenshot_template(),
            frame_template: default_frame_template(),
            flip_vertical: default_flip_vertical(),
        }
    }
}

/// Emulator profile as written in the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Directory containing the executable
    pub path: String,
    /// Executable file name
    pub exe: String,
    /// Default arguments
    #[serde(default)]
    pub args: String,
}

impl EmulatorConfig {
    /// Convert to a named emulator profile.
    pub fn to_emulator(&self, name: &str) -> Emulator {
        Emulator {
            name: name.to_string(),
            path: PathBuf::from(&self.path),
            exe: self.exe.clone(),
            args: self.args.clone(),
        }
    }
}

/// One game set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfig {
    /// ROM archive name
    pub archive: String,
    /// Display title, defaults to the archive name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Emulator profile name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emulator: Option<String>,
    /// Extra launch arguments
    #[serde(default)]
    pub args: String,
}

impl SetConfig {
    /// Title shown for the set.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.archive)
    }
}

/// Control binding configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsConfig {
    /// Bindings that move to the previous card
    #[serde(default = "default_previous")]
    pub previous: Binding,
    /// Bindings that move to the next card
    #[serde(default = "default_next")]
    pub next: Binding,
    /// Bindings that launch the selected card
    #[serde(default = "default_launch")]
    pub launch: Binding,
    /// Bindings that quit the launcher
    #[serde(default = "default_quit")]
    pub quit: Binding,
    /// Joystick axis deadzone
    #[serde(default = "default_axis_deadzone")]
    pub axis_deadzone: i32,
}

fn default_previous() -> Binding {
    Binding::keys(&["Left"])
}

fn default_next() -> Binding {
    Binding::keys(&["Right"])
}

fn default_launch() -> Binding {
    Binding::keys(&["Space", "Return"]).with_buttons(&[0])
}

fn default_quit() -> Binding {
    Binding::keys(&["Escape"]).with_buttons(&[1])
}

fn default_axis_deadzone() -> i32 {
    DEFAULT_AXIS_DEADZONE
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            previous: default_previous(),
            next: default_next(),
            launch: default_launch(),
            quit: default_quit(),
            axis_deadzone: default_axis_deadzone(),
        }
    }
}

impl ControlsConfig {
    /// Convert to runtime control bindings.
    pub fn to_bindings(&self) -> ControlBindings {
        ControlBindings {
            previous: self.previous.clone(),
            next: self.next.clone(),
            launch: self.launch.clone(),
            quit: self.quit.clone(),
            axis_deadzone: self.axis_deadzone.saturating_abs(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values and no sets.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
            emulators: BTreeMap::new(),
            sets: Vec::new(),
            controls: ControlsConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        if config.preferences.worker_count == 0 {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded configuration from {:?}: {} sets, {} emulators",
            path,
            config.sets.len(),
            config.emulators.len()
        );
        Ok(config)
    }

    /// Build the emulator store from the configured profiles.
    pub fn emulator_store(&self) -> EmulatorStore {
        let mut store = EmulatorStore::new();
        for (name, emulator) in &self.emulators {
            store.insert(emulator.to_emulator(name));
        }
        store
    }

    /// Get the per-user config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("pimenu").join(CONFIG_FILE))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("pimenu")
                    .join(CONFIG_FILE)
            })
        }
    }

    /// Pick the configuration file to load.
    ///
    /// An explicit path always wins. Otherwise `config.json` in the working
    /// directory, then the per-user config file.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path);
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Ok(path),
            _ => Err(ConfigError::NotFound),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No configuration file could be located
    #[error("No config.json found in the working directory or the user config directory")]
    NotFound,

    /// A set refers to an emulator that is not defined
    #[error("Set {archive:?} uses undefined emulator {emulator:?}")]
    UnknownEmulator { archive: String, emulator: String },

    /// A value is out of range or malformed
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
