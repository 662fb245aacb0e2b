//! Native API plugins.
//!
//! A plugin is a native library that installs the console's scripting API
//! (graphics, input, sound) into an interpreter. Plugins are versioned
//! `major.minor`: minors within a major are additive, majors break.
//!
//! ```text
//! PluginResolver::resolve(lua, 1.3)
//!   probe luag-lib-1.3.so  ✗
//!   probe luag-lib-1.4.so  ✓ ──► PluginLoader::open ──► Plugin
//!                                                        │ activate(lua)
//!                                                        ▼
//!                                                   PluginHandle
//!                                                        │ release() / Drop
//!                                                        ▼
//!                                                   deactivate() (once)
//! ```
//!
//! The [`PluginLoader`] trait is the seam between version resolution and the
//! platform loader; [`NativeLoader`] is the `libloading` implementation.

mod native;
mod resolver;

pub use native::{NativeLoader, LOAD_HOOK, UNLOAD_HOOK};
pub use resolver::{
    editor_file_name, find_core, library_file_name, PluginResolver, DEFAULT_MAX_PROBE,
};

use crate::error::PluginError;
use luag_runtime::Version;
use mlua::Lua;
use std::path::{Path, PathBuf};

/// An opened plugin module.
pub trait Plugin: Send {
    /// Installs the plugin's API into `lua`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hook is missing or reports failure.
    fn activate(&mut self, lua: &Lua) -> Result<(), PluginError>;

    /// Releases whatever `activate` set up.
    ///
    /// # Errors
    ///
    /// Returns an error if the hook is missing or reports failure.
    fn deactivate(&mut self) -> Result<(), PluginError>;
}

/// Opens plugin modules from disk.
pub trait PluginLoader: Send + Sync {
    /// Opens the module at `path` without activating it.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Open`] if the module cannot be opened.
    fn open(&self, path: &Path) -> Result<Box<dyn Plugin>, PluginError>;
}

/// An activated plugin.
///
/// Deactivation runs at most once: on [`release`](Self::release) or on
/// drop, whichever comes first. Failures are logged and never propagated.
pub struct PluginHandle {
    plugin: Option<Box<dyn Plugin>>,
    version: Option<Version>,
    path: PathBuf,
}

impl std::fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandle")
            .field("version", &self.version)
            .field("path", &self.path)
            .field("active", &self.plugin.is_some())
            .finish()
    }
}

impl PluginHandle {
    /// Activates `plugin` against `lua`.
    ///
    /// On failure the module is released immediately, without calling
    /// `deactivate`.
    ///
    /// # Errors
    ///
    /// Propagates the activation error.
    pub fn activate(
        mut plugin: Box<dyn Plugin>,
        lua: &Lua,
        path: impl Into<PathBuf>,
        version: Option<Version>,
    ) -> Result<Self, PluginError> {
        let path = path.into();
        if let Err(e) = plugin.activate(lua) {
            tracing::debug!(path = %path.display(), error = %e, "Plugin activation failed");
            return Err(e);
        }
        tracing::info!(path = %path.display(), "Plugin activated");
        Ok(Self {
            plugin: Some(plugin),
            version,
            path,
        })
    }

    /// Resolved version, `None` for the unversioned editor plugin.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deactivates and releases the plugin now.
    pub fn release(mut self) {
        self.deactivate_once();
    }

    fn deactivate_once(&mut self) {
        let Some(mut plugin) = self.plugin.take() else {
            return;
        };
        match plugin.deactivate() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Plugin deactivated"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Plugin deactivation failed"
            ),
        }
    }
}

impl Drop for PluginHandle {
    fn drop(&mut self) {
        self.deactivate_once();
    }
}
