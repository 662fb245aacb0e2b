//! Console state shared by the tick loop and the shell commands.
//!
//! While a cartridge runs the script host owns the tick: terminal input is
//! not processed and the only key the console reacts to is [`STOP_KEY`].
//! Otherwise the terminal is ticked and submitted lines are dispatched to
//! the command table.

use crate::commands;
use luag_lua::{EngineError, HostOptions, ScriptHost};
use luag_runtime::config::{ConfigError, ConsoleConfig, ConsoleMode, PathsConfig};
use luag_runtime::terminal::Clipboard;
use luag_runtime::{Terminal, Version};

/// Key that stops a running cartridge (ESC).
pub const STOP_KEY: char = '\u{1b}';

/// Builds the script host parameters from the configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if `engine.default_version` is not
/// `M.m`.
pub fn host_options(config: &ConsoleConfig) -> Result<HostOptions, ConfigError> {
    Ok(HostOptions {
        lib_dir: config.paths.resolved_lib_dir(),
        max_probe: config.engine.max_probe,
        default_version: config.engine.default_version()?,
    })
}

pub struct Console {
    pub(crate) terminal: Terminal,
    pub(crate) host: ScriptHost,
    pub(crate) paths: PathsConfig,
    pub(crate) mode: ConsoleMode,
    pub(crate) default_version: Version,
    quit: bool,
}

impl Console {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configured default version is invalid.
    pub fn new(config: &ConsoleConfig, host: ScriptHost) -> Result<Self, ConfigError> {
        Ok(Self {
            terminal: Terminal::with_config(&config.terminal),
            host,
            paths: config.paths.clone(),
            mode: config.console.mode,
            default_version: config.engine.default_version()?,
            quit: false,
        })
    }

    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard + Send>) -> Self {
        self.terminal = self.terminal.with_clipboard(clipboard);
        self
    }

    /// One step of the console loop.
    pub fn tick(&mut self) {
        if self.host.is_running() {
            if let Err(e) = self.host.tick() {
                self.report(&e);
            }
            return;
        }

        if let Some(line) = self.terminal.tick() {
            tracing::debug!(command = %line.command, args = ?line.args, "Dispatching");
            commands::execute(self, &line);
        }
    }

    /// Draws the running cartridge, if any.
    pub fn render(&mut self) {
        if !self.host.is_running() {
            return;
        }
        if let Err(e) = self.host.render() {
            self.report(&e);
        }
    }

    /// Routes user input to the terminal, or to the script host while a
    /// cartridge runs.
    pub fn receive_input(&mut self, text: &str) {
        if !self.host.is_running() {
            self.terminal.receive_input(text);
            return;
        }

        if text.contains(STOP_KEY) {
            tracing::info!("Stop key pressed");
            if let Err(e) = self.host.stop() {
                self.report(&e);
            }
        }
    }

    /// Stops a running cartridge before the console exits.
    pub fn shutdown(&mut self) {
        if self.host.is_running() {
            if let Err(e) = self.host.stop() {
                tracing::warn!(error = %e, "Stopping engine on shutdown failed");
            }
        }
    }

    /// Writes an engine error to the terminal.
    ///
    /// A clean `exit(0)` from the cartridge is shown as normal output.
    pub(crate) fn report(&mut self, err: &EngineError) {
        if err.is_failure() {
            self.terminal.write(&format!("Error:\n{err}"), true);
        } else {
            self.terminal.write(&err.to_string(), false);
        }
        self.terminal.write("\n", false);
    }

    pub(crate) fn request_quit(&mut self) {
        self.quit = true;
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// No cartridge is running and the terminal has nothing left to process.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.host.is_running() && self.terminal.is_idle()
    }

    #[must_use]
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    #[must_use]
    pub fn host(&self) -> &ScriptHost {
        &self.host
    }

    #[must_use]
    pub fn mode(&self) -> ConsoleMode {
        self.mode
    }
}
