//! Script host lifecycle.
//!
//! # State Machine
//!
//! ```text
//!            load(editor_mode) ok
//!   ┌──────┐ ───────────────────► ┌─────────┐
//!   │ Idle │                      │ Running │── tick()/render()
//!   └──────┘ ◄─────────────────── └─────────┘
//!      ▲      stop(), script error,      │
//!      │      pending exit at tick()     │
//!      └──── load() failure ─────────────┘ (never entered)
//! ```
//!
//! A session owns the interpreter and the plugin handles, and exists
//! only while running. Teardown always destroys the interpreter before the
//! plugins that installed functions into it; the cartridge's temporary
//! directory goes when the next cartridge is opened or the host is dropped.
//!
//! # Example
//!
//! ```no_run
//! use luag_lua::{HostOptions, ScriptHost};
//! use luag_runtime::CartridgeSource;
//!
//! let mut host = ScriptHost::new(HostOptions::new("/usr/share/luag/luag-lib"));
//! host.select_cartridge(CartridgeSource::Folder("game".into()));
//! host.load(false)?;
//! for _ in 0..60 {
//!     host.tick()?;
//!     host.render()?;
//! }
//! # Ok::<(), luag_lua::EngineError>(())
//! ```

use crate::error::EngineError;
use crate::exit::{ExitMailbox, ExitRequest};
use crate::lua_env::{self, LuaEnv};
use crate::plugin::{
    NativeLoader, PluginHandle, PluginLoader, PluginResolver, DEFAULT_MAX_PROBE,
};
use luag_runtime::cartridge::DEFAULT_VERSION;
use luag_runtime::{CartridgeSandbox, CartridgeSource, CartridgeWorkspace, ErrorCode, Version};
use mlua::{Function, Lua, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// First plugin major whose cartridges draw through a script `render()`.
pub const SCRIPTED_RENDER_MAJOR: u32 = 2;

/// Sound output.
pub trait AudioSink: Send {
    /// Called with the cartridge's sound bank when a session starts.
    fn load_bank(&mut self, _bank: &BTreeMap<String, PathBuf>) {}

    /// Stops every playing sound.
    fn halt(&mut self);
}

/// Audio sink that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn halt(&mut self) {}
}

/// Construction parameters for a [`ScriptHost`].
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Directory holding `luag-lib-*` plugins.
    pub lib_dir: PathBuf,
    /// Minors probed during plugin resolution.
    pub max_probe: u32,
    /// Version assumed for cartridges without `cartridge-info`.
    pub default_version: Version,
}

impl HostOptions {
    #[must_use]
    pub fn new(lib_dir: impl Into<PathBuf>) -> Self {
        Self {
            lib_dir: lib_dir.into(),
            max_probe: DEFAULT_MAX_PROBE,
            default_version: DEFAULT_VERSION,
        }
    }
}

/// Resources of one running cartridge.
///
/// Field order is drop order: interpreter first, then plugins.
struct Session {
    lua: Lua,
    core: PluginHandle,
    editor: Option<PluginHandle>,
    editor_mode: bool,
}

impl Session {
    fn teardown(self) {
        let Self {
            lua, core, editor, ..
        } = self;
        drop(lua);
        core.release();
        if let Some(editor) = editor {
            editor.release();
        }
    }

    fn core_version(&self) -> Version {
        self.core.version().unwrap_or(DEFAULT_VERSION)
    }
}

enum HostState {
    Idle,
    Running(Session),
}

/// Runs cartridges.
pub struct ScriptHost {
    state: HostState,
    resolver: PluginResolver,
    default_version: Version,
    source: Option<CartridgeSource>,
    workspace: Option<CartridgeWorkspace>,
    mailbox: ExitMailbox,
    audio: Box<dyn AudioSink>,
    last_editor_mode: bool,
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("running", &self.is_running())
            .field("resolver", &self.resolver)
            .field("source", &self.source)
            .field("pending_exit", &self.mailbox.is_pending())
            .finish_non_exhaustive()
    }
}

impl ScriptHost {
    /// Creates a host that loads plugins as native libraries.
    #[must_use]
    pub fn new(options: HostOptions) -> Self {
        Self::with_loader(options, Arc::new(NativeLoader))
    }

    /// Creates a host with a custom plugin loader.
    #[must_use]
    pub fn with_loader(options: HostOptions, loader: Arc<dyn PluginLoader>) -> Self {
        let resolver =
            PluginResolver::new(options.lib_dir, loader).with_max_probe(options.max_probe);
        Self {
            state: HostState::Idle,
            resolver,
            default_version: options.default_version,
            source: None,
            workspace: None,
            mailbox: ExitMailbox::new(),
            audio: Box::new(NullAudio),
            last_editor_mode: false,
        }
    }

    /// Replaces the audio sink.
    #[must_use]
    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    /// Chooses the cartridge the next `load` opens.
    pub fn select_cartridge(&mut self, source: CartridgeSource) {
        tracing::debug!(path = %source.path().display(), "Cartridge selected");
        self.source = Some(source);
    }

    #[must_use]
    pub fn selected_cartridge(&self) -> Option<&CartridgeSource> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, HostState::Running(_))
    }

    /// Version of the active core plugin.
    #[must_use]
    pub fn plugin_version(&self) -> Option<Version> {
        match &self.state {
            HostState::Running(session) => session.core.version(),
            HostState::Idle => None,
        }
    }

    /// Whether the running session has the editor plugin.
    #[must_use]
    pub fn editor_active(&self) -> bool {
        match &self.state {
            HostState::Running(session) => session.editor.is_some(),
            HostState::Idle => false,
        }
    }

    /// Runs `f` against the live interpreter.
    ///
    /// Returns `None` when idle.
    pub fn with_lua<R>(&self, f: impl FnOnce(&Lua) -> R) -> Option<R> {
        match &self.state {
            HostState::Running(session) => Some(f(&session.lua)),
            HostState::Idle => None,
        }
    }

    /// The most recently opened cartridge.
    #[must_use]
    pub fn workspace(&self) -> Option<&CartridgeWorkspace> {
        self.workspace.as_ref()
    }

    #[must_use]
    pub fn resolver(&self) -> &PluginResolver {
        &self.resolver
    }

    /// Handle to the exit mailbox shared with the interpreter.
    #[must_use]
    pub fn mailbox(&self) -> ExitMailbox {
        self.mailbox.clone()
    }

    /// Starts the selected cartridge.
    ///
    /// On failure everything acquired by the attempt is released and the
    /// host stays idle.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyRunning`] if a session is active (no change)
    /// - [`EngineError::NoCartridge`] if nothing is selected
    /// - cartridge, plugin or script errors from the startup steps
    /// - [`EngineError::RequestedExit`] if `init` asked to exit
    pub fn load(&mut self, editor_mode: bool) -> Result<(), EngineError> {
        if self.is_running() {
            tracing::warn!("load refused: engine is already running");
            return Err(EngineError::AlreadyRunning);
        }
        self.last_editor_mode = editor_mode;
        if let Some(stale) = self.mailbox.take() {
            tracing::debug!(code = stale.code, "Stale exit request discarded");
        }

        match self.start_session(editor_mode) {
            Ok(session) => {
                tracing::info!(
                    version = %session.core_version(),
                    editor = editor_mode,
                    "Engine started"
                );
                self.state = HostState::Running(session);
                Ok(())
            }
            Err(e) => {
                self.audio.halt();
                tracing::error!(code = e.code(), error = %e, "Engine load failed");
                Err(e)
            }
        }
    }

    fn start_session(&mut self, editor_mode: bool) -> Result<Session, EngineError> {
        let source = self.source.clone().ok_or(EngineError::NoCartridge)?;

        let lua = lua_env::new_interpreter()?;

        // The previous temporary directory goes before the new one is made.
        self.workspace = None;
        let workspace = self
            .workspace
            .insert(CartridgeWorkspace::open(&source, self.default_version)?);

        let sandbox = CartridgeSandbox::new(workspace.root())?;
        LuaEnv::new(sandbox, workspace.scripts_dir(), self.mailbox.clone()).install(&lua)?;
        self.audio.load_bank(workspace.sound_bank());

        let core = self.resolver.resolve(&lua, workspace.version())?;
        let mut session = Session {
            lua,
            core,
            editor: None,
            editor_mode,
        };
        if editor_mode {
            session.editor = Some(self.resolver.resolve_editor(&session.lua)?);
        }

        lua_env::run_file(&session.lua, &workspace.main_script())?;
        call_entry_point(&session.lua, "init")?;

        if let Some(request) = self.mailbox.take() {
            session.teardown();
            return Err(exit_error(request));
        }
        Ok(session)
    }

    /// Advances the running cartridge by one step.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotRunning`] when idle
    /// - [`EngineError::RequestedExit`] if the script asked to exit (the
    ///   session has been stopped)
    /// - script errors, including a missing `tick` (the session has been
    ///   stopped)
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let HostState::Running(session) = &self.state else {
            return Err(EngineError::NotRunning);
        };

        if let Some(request) = self.mailbox.take() {
            tracing::info!(code = request.code, "Cartridge requested exit");
            self.halt();
            return Err(exit_error(request));
        }

        let result = call_entry_point(&session.lua, "tick");
        if let Err(e) = result {
            tracing::error!(error = %e, "Script tick failed");
            self.halt();
            return Err(e);
        }
        Ok(())
    }

    /// Lets the cartridge draw.
    ///
    /// A no-op for plugins older than [`SCRIPTED_RENDER_MAJOR`]. From that
    /// major on the script must define `render`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotRunning`] when idle
    /// - [`EngineError::MissingEntryPoint`] when `render` is not defined
    /// - script errors
    ///
    /// Both failures stop the session.
    pub fn render(&mut self) -> Result<(), EngineError> {
        let HostState::Running(session) = &self.state else {
            return Err(EngineError::NotRunning);
        };
        if session.core_version().major < SCRIPTED_RENDER_MAJOR {
            return Ok(());
        }

        if let Err(e) = call_entry_point(&session.lua, "render") {
            tracing::error!(error = %e, "Script render failed");
            self.halt();
            return Err(e);
        }
        Ok(())
    }

    /// Stops the running cartridge.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] when already idle; nothing is
    /// torn down twice.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if !self.is_running() {
            tracing::warn!("stop ignored: engine is not running");
            return Err(EngineError::NotRunning);
        }
        self.halt();
        Ok(())
    }

    /// Stops and loads again with the same editor setting.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotRunning`] when idle, otherwise as [`load`](Self::load).
    pub fn reload(&mut self) -> Result<(), EngineError> {
        let HostState::Running(session) = &self.state else {
            return Err(EngineError::NotRunning);
        };
        let editor_mode = session.editor_mode;
        self.stop()?;
        self.load(editor_mode)
    }

    /// Asks the running cartridge to stop at the next checkpoint.
    pub fn ask_exit(&self, code: i8, message: Option<String>) {
        self.mailbox.post(ExitRequest { code, message });
    }

    /// Editor setting of the last `load`.
    #[must_use]
    pub fn last_editor_mode(&self) -> bool {
        self.last_editor_mode
    }

    /// Tears down the session, if any.
    fn halt(&mut self) {
        if let HostState::Running(session) = std::mem::replace(&mut self.state, HostState::Idle) {
            session.teardown();
            self.audio.halt();
            tracing::info!("Engine stopped");
        }
    }

    /// Path of the plugin directory.
    #[must_use]
    pub fn lib_dir(&self) -> &Path {
        self.resolver.dir()
    }
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        self.halt();
    }
}

fn exit_error(request: ExitRequest) -> EngineError {
    EngineError::RequestedExit {
        code: request.code,
        message: request.message,
    }
}

/// The global function `name`, if the script defines one.
fn entry_point(lua: &Lua, name: &'static str) -> Result<Option<Function>, EngineError> {
    match lua.globals().get::<Value>(name)? {
        Value::Function(f) => Ok(Some(f)),
        _ => Ok(None),
    }
}

fn call_entry_point(lua: &Lua, name: &'static str) -> Result<(), EngineError> {
    let function = entry_point(lua, name)?.ok_or(EngineError::MissingEntryPoint(name))?;
    function.call::<()>(())?;
    Ok(())
}
