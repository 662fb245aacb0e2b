//! Error types for the script host and its plugins.

use luag_runtime::{CartridgeError, ErrorCode, SandboxError, Version};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, activating or releasing a native plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No library of the requested major with a minor at or above the
    /// requested one exists within the probe window.
    #[error("could not find a version of LuaG Library compatible with {major}.{minor}")]
    Incompatible { major: u32, minor: u32 },

    /// The module exists but could not be opened.
    #[error("cannot open '{}': {message}", path.display())]
    Open { path: PathBuf, message: String },

    /// The module lacks a required exported hook.
    #[error("the LuaG Library object does not contain the function '{hook}'")]
    MissingHook { hook: &'static str },

    /// A hook returned a nonzero status.
    #[error("'{hook}' returned {status}")]
    HookFailed { hook: &'static str, status: i32 },

    /// The editor library is not installed.
    #[error("could not find the LuaG Editor Library")]
    EditorMissing,
}

impl PluginError {
    /// The requested version that failed compatibility search.
    pub(crate) fn incompatible(requested: Version) -> Self {
        Self::Incompatible {
            major: requested.major,
            minor: requested.minor,
        }
    }
}

impl ErrorCode for PluginError {
    fn code(&self) -> &'static str {
        match self {
            Self::Incompatible { .. } => "PLUGIN_INCOMPATIBLE",
            Self::Open { .. } => "PLUGIN_OPEN_FAILED",
            Self::MissingHook { .. } => "PLUGIN_MISSING_HOOK",
            Self::HookFailed { .. } => "PLUGIN_HOOK_FAILED",
            Self::EditorMissing => "PLUGIN_EDITOR_MISSING",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Errors from the script host lifecycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The interpreter reported a runtime fault.
    #[error("{0}")]
    Script(#[source] mlua::Error),

    /// A required global function is not defined.
    #[error("{}", missing_entry_point_message(.0))]
    MissingEntryPoint(&'static str),

    /// The cartridge asked to exit.
    #[error("{}", exit_message(.code, .message))]
    RequestedExit { code: i8, message: Option<String> },

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    /// `load` was called before any cartridge was selected.
    #[error("no cartridge selected")]
    NoCartridge,

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The interpreter itself could not be set up.
    #[error("interpreter setup failed: {0}")]
    Interpreter(String),
}

fn missing_entry_point_message(name: &str) -> String {
    match name {
        "init" => "'main.lua' must contain a function 'init()'".to_string(),
        other => format!("a function '{other}()' must be defined"),
    }
}

fn exit_message(code: &i8, message: &Option<String>) -> String {
    match message.as_deref().filter(|m| !m.is_empty()) {
        Some(m) => format!("exit code {code}\n{m}"),
        None => format!("exit code {code}"),
    }
}

impl EngineError {
    /// Whether the terminal should show this as an error line.
    ///
    /// A requested exit with code 0 is a normal termination.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::RequestedExit { code: 0, .. })
    }
}

impl From<mlua::Error> for EngineError {
    fn from(err: mlua::Error) -> Self {
        Self::Script(err)
    }
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Script(_) => "ENGINE_SCRIPT_ERROR",
            Self::MissingEntryPoint(_) => "ENGINE_MISSING_ENTRY_POINT",
            Self::RequestedExit { .. } => "ENGINE_REQUESTED_EXIT",
            Self::AlreadyRunning => "ENGINE_ALREADY_RUNNING",
            Self::NotRunning => "ENGINE_NOT_RUNNING",
            Self::NoCartridge => "ENGINE_NO_CARTRIDGE",
            Self::Plugin(e) => e.code(),
            Self::Cartridge(e) => e.code(),
            Self::Sandbox(e) => e.code(),
            Self::Interpreter(_) => "ENGINE_INTERPRETER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Plugin(e) => e.is_recoverable(),
            Self::Cartridge(e) => e.is_recoverable(),
            Self::Sandbox(e) => e.is_recoverable(),
            Self::Interpreter(_) => false,
            _ => true,
        }
    }
}
