//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.luag/config.toml`)
//! 3. Project config (`.luag/config.toml` under the working directory)
//! 4. Environment variables (`LUAG_*`)
//!
//! Each layer overrides the previous. CLI flags are applied afterwards by a
//! [`ConfigResolver`](super::ConfigResolver).

use super::{
    default_config_path, ConfigError, ConsoleConfig, ConsoleMode, PROJECT_CONFIG_DIR,
    PROJECT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use luag_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root(".")
///     .skip_env_vars()
///     .load()
///     .expect("config should load");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.luag/config.toml).
    global_config_path: Option<PathBuf>,
    project_root: Option<PathBuf>,
    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the project root directory.
    ///
    /// Project config will be loaded from `<project_root>/.luag/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any config file exists but cannot be
    /// parsed, or an environment variable holds an invalid value. Missing
    /// config files are silently ignored.
    pub fn load(&self) -> Result<ConsoleConfig, ConfigError> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load), reading environment variables through
    /// `env` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_env(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ConsoleConfig, ConfigError> {
        let mut config = ConsoleConfig::default();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);
            if let Some(global_config) = load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root
                    .join(PROJECT_CONFIG_DIR)
                    .join(PROJECT_CONFIG_FILE);
                if let Some(project_config) = load_file(&project_config_path)? {
                    debug!(
                        path = %project_config_path.display(),
                        project = %project_root.display(),
                        "Loaded project config"
                    );
                    config.merge(&project_config);
                }
            }
        }

        if !self.skip_env {
            apply_env_vars(&mut config, env)?;
        }

        Ok(config)
    }
}

/// Loads a config file, returning None if it doesn't exist.
fn load_file(path: &Path) -> Result<Option<ConsoleConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config =
        ConsoleConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
    Ok(Some(config))
}

fn apply_env_vars(
    config: &mut ConsoleConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = env("LUAG_DEBUG") {
        config.debug = parse_bool(&val)
            .ok_or_else(|| ConfigError::invalid_env_var("LUAG_DEBUG", "expected bool"))?;
    }

    if let Some(val) = env("LUAG_MODE") {
        config.console.mode = ConsoleMode::parse(&val)
            .ok_or_else(|| ConfigError::invalid_env_var("LUAG_MODE", "expected 'd' or 'u'"))?;
    }

    if let Some(val) = env("LUAG_MAX_PROBE") {
        config.engine.max_probe = val
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid_env_var("LUAG_MAX_PROBE", "expected integer"))?;
    }

    if let Some(val) = env("LUAG_USERDATA_DIR") {
        config.paths.userdata_dir = Some(PathBuf::from(val));
    }
    if let Some(val) = env("LUAG_LIB_DIR") {
        config.paths.lib_dir = Some(PathBuf::from(val));
    }
    if let Some(val) = env("LUAG_LOG_FILE") {
        config.paths.log_file = Some(PathBuf::from(val));
    }

    Ok(())
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
