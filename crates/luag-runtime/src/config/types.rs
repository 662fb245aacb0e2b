//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use crate::cartridge::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
///
/// # Example
///
/// ```
/// use luag_runtime::config::{ConsoleConfig, ConsoleMode};
///
/// let config = ConsoleConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.console.mode, ConsoleMode::Developer);
/// assert_eq!(config.engine.max_probe, 100);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Enable debug mode (verbose logging, diagnostics).
    pub debug: bool,

    /// Path configuration.
    pub paths: PathsConfig,

    /// Script host configuration.
    pub engine: EngineConfig,

    /// Terminal geometry and buffer sizes.
    pub terminal: TerminalConfig,

    /// Console behaviour.
    pub console: ShellConfig,
}

impl ConsoleConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Checks values that deserialize fine but cannot drive the console.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.tps == 0 {
            return Err(ConfigError::invalid_value("engine.tps", "must be positive"));
        }
        if self.engine.max_probe == 0 {
            return Err(ConfigError::invalid_value(
                "engine.max_probe",
                "must be positive",
            ));
        }
        self.engine.default_version()?;
        if self.terminal.chars_in_row == 0 || self.terminal.visible_rows == 0 {
            return Err(ConfigError::invalid_value(
                "terminal",
                "chars_in_row and visible_rows must be positive",
            ));
        }
        Ok(())
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default. This enables layered configuration.
    pub fn merge(&mut self, other: &Self) {
        if other.debug {
            self.debug = true;
        }

        self.paths.merge(&other.paths);
        self.engine.merge(&other.engine);
        self.terminal.merge(&other.terminal);
        self.console.merge(&other.console);
    }
}

/// Path configuration.
///
/// Every path is optional; unset paths resolve under [`userdata_dir`]
/// (see the `resolved_*` accessors).
///
/// [`userdata_dir`]: PathsConfig::userdata_dir
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of all console data. Default: `~/.luag`.
    pub userdata_dir: Option<PathBuf>,

    /// Where `.luag` archives are read from and packed into.
    /// Default: `<userdata>/cartridges`.
    pub cartridges_dir: Option<PathBuf>,

    /// Folder holding the native `luag-lib-*` extensions.
    /// Default: `<userdata>/luag-lib`.
    pub lib_dir: Option<PathBuf>,

    /// Log file. Default: `<userdata>/logs/luag.log`.
    pub log_file: Option<PathBuf>,
}

impl PathsConfig {
    fn merge(&mut self, other: &Self) {
        if other.userdata_dir.is_some() {
            self.userdata_dir.clone_from(&other.userdata_dir);
        }
        if other.cartridges_dir.is_some() {
            self.cartridges_dir.clone_from(&other.cartridges_dir);
        }
        if other.lib_dir.is_some() {
            self.lib_dir.clone_from(&other.lib_dir);
        }
        if other.log_file.is_some() {
            self.log_file.clone_from(&other.log_file);
        }
    }

    #[must_use]
    pub fn resolved_userdata_dir(&self) -> PathBuf {
        self.userdata_dir
            .clone()
            .unwrap_or_else(super::default_config_dir)
    }

    #[must_use]
    pub fn resolved_cartridges_dir(&self) -> PathBuf {
        self.cartridges_dir
            .clone()
            .unwrap_or_else(|| self.resolved_userdata_dir().join("cartridges"))
    }

    #[must_use]
    pub fn resolved_lib_dir(&self) -> PathBuf {
        self.lib_dir
            .clone()
            .unwrap_or_else(|| self.resolved_userdata_dir().join("luag-lib"))
    }

    #[must_use]
    pub fn resolved_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.resolved_userdata_dir().join("logs").join("luag.log"))
    }

    /// Development folder the `edit`, `setup`, `pack` and `files` commands
    /// work on.
    #[must_use]
    pub fn dev_dir(&self) -> PathBuf {
        self.resolved_userdata_dir().join("game")
    }
}

/// Script host configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// How many minor versions at or above the requested one the plugin
    /// resolver probes.
    pub max_probe: u32,

    /// Ticks per second of the console loop.
    pub tps: u32,

    /// Version assumed for cartridges without `cartridge-info`, as `M.m`.
    pub default_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_probe: 100,
            tps: 60,
            default_version: "1.3".into(),
        }
    }
}

impl EngineConfig {
    /// Parses the `default_version` field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if it is not `M.m`.
    pub fn default_version(&self) -> Result<Version, ConfigError> {
        Version::parse(&self.default_version).ok_or_else(|| {
            ConfigError::invalid_value(
                "engine.default_version",
                format!("'{}' is not <major>.<minor>", self.default_version),
            )
        })
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.max_probe != default.max_probe {
            self.max_probe = other.max_probe;
        }
        if other.tps != default.tps {
            self.tps = other.tps;
        }
        if other.default_version != default.default_version {
            self.default_version.clone_from(&other.default_version);
        }
    }
}

/// Terminal geometry and buffer capacities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TerminalConfig {
    pub chars_in_row: usize,
    pub visible_rows: usize,
    /// Scrollback capacity in rows.
    pub scrollback: usize,
    /// History capacity in commands.
    pub history: usize,
    /// Capacity of each input/output byte queue.
    pub buffer: usize,
    /// Ticks per cursor blink half-period.
    pub blink_period: u32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            chars_in_row: 26,
            visible_rows: 17,
            scrollback: 2048,
            history: 1024,
            buffer: 4096,
            blink_period: 25,
        }
    }
}

impl TerminalConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.chars_in_row != default.chars_in_row {
            self.chars_in_row = other.chars_in_row;
        }
        if other.visible_rows != default.visible_rows {
            self.visible_rows = other.visible_rows;
        }
        if other.scrollback != default.scrollback {
            self.scrollback = other.scrollback;
        }
        if other.history != default.history {
            self.history = other.history;
        }
        if other.buffer != default.buffer {
            self.buffer = other.buffer;
        }
        if other.blink_period != default.blink_period {
            self.blink_period = other.blink_period;
        }
    }
}

/// Console mode.
///
/// Developer mode serves the development folder; user mode serves packed
/// cartridges.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMode {
    #[default]
    Developer,
    User,
}

impl ConsoleMode {
    /// Parses the short or long form (`d`/`developer`, `u`/`user`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "d" | "developer" => Some(Self::Developer),
            "u" | "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for ConsoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Developer => f.write_str("developer"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Console behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    pub mode: ConsoleMode,
}

impl ShellConfig {
    fn merge(&mut self, other: &Self) {
        if other.mode != ConsoleMode::default() {
            self.mode = other.mode;
        }
    }
}
