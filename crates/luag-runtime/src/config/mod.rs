//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. CLI flags (ConfigResolver)          │  Invocation override
//! ├─────────────────────────────────────────┤
//! │  2. Environment Variables (LUAG_*)      │  Runtime override
//! ├─────────────────────────────────────────┤
//! │  3. Project Config (.luag/config.toml)  │  Project-specific
//! ├─────────────────────────────────────────┤
//! │  4. Global Config (~/.luag/config.toml) │  User defaults
//! ├─────────────────────────────────────────┤
//! │  5. Default Values (compile-time)       │  Fallback
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Directory Structure
//!
//! ```text
//! ~/.luag/                     # User data root
//! ├── config.toml              # Global configuration
//! ├── game/                    # Development folder (`setup`, `edit`, `pack`)
//! ├── cartridges/              # Packed `.luag` archives
//! ├── luag-lib/                # Native extensions (luag-lib-M.m.so, ...)
//! └── logs/luag.log            # Log file
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `LUAG_DEBUG` | `debug` | bool |
//! | `LUAG_MODE` | `console.mode` | `d`/`u` |
//! | `LUAG_MAX_PROBE` | `engine.max_probe` | u32 |
//! | `LUAG_USERDATA_DIR` | `paths.userdata_dir` | PathBuf |
//! | `LUAG_LIB_DIR` | `paths.lib_dir` | PathBuf |
//! | `LUAG_LOG_FILE` | `paths.log_file` | PathBuf |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.luag/config.toml
//! debug = false
//!
//! [paths]
//! lib_dir = "/usr/lib/luag/luag-lib"
//!
//! [engine]
//! max_probe = 100
//! tps = 60
//! default_version = "1.3"
//!
//! [terminal]
//! visible_rows = 17
//!
//! [console]
//! mode = "developer"
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{
    ConsoleConfig, ConsoleMode, EngineConfig, PathsConfig, ShellConfig, TerminalConfig,
};

/// Default global config directory, also the default user data root.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".luag")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".luag";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
