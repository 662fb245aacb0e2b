//! `libloading` plugin loader.
//!
//! A native plugin exports two C symbols:
//!
//! ```c
//! int luag_lib_load(lua_State *L);   // install the API into L
//! int luag_lib_destroy(void);        // release plugin resources
//! ```
//!
//! Both return 0 on success.
//!
//! # Linking against Lua
//!
//! The host embeds its own statically built Lua 5.4 (`mlua`'s `vendored`
//! feature) and does not export the Lua C API. A plugin linked with
//! `-llua5.4` resolves `lua_*` against the system library instead, so it
//! runs a second interpreter copy on the host's `lua_State`. Such plugins
//! need a host built without `vendored`, linked against the same system
//! Lua.

use super::{Plugin, PluginLoader};
use crate::error::PluginError;
use libloading::Library;
use mlua::Lua;
use std::ffi::c_int;
use std::path::{Path, PathBuf};

/// Exported activation hook.
pub const LOAD_HOOK: &str = "luag_lib_load";
/// Exported deactivation hook.
pub const UNLOAD_HOOK: &str = "luag_lib_destroy";

type LoadFn = unsafe extern "C" fn(*mut mlua::ffi::lua_State) -> c_int;
type UnloadFn = unsafe extern "C" fn() -> c_int;

/// Opens plugins as shared libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoader;

impl PluginLoader for NativeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn Plugin>, PluginError> {
        // SAFETY: loading runs the library's initializers. Plugins come from
        // the console's own library directory and are trusted like the
        // console binary itself.
        let library = unsafe { Library::new(path) }.map_err(|e| PluginError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Box::new(NativePlugin {
            library,
            path: path.to_path_buf(),
        }))
    }
}

/// A plugin backed by an opened shared library.
///
/// Dropping it unloads the library.
#[derive(Debug)]
struct NativePlugin {
    library: Library,
    path: PathBuf,
}

impl NativePlugin {
    fn symbol<T: Copy>(&self, name: &'static str) -> Result<T, PluginError> {
        // SAFETY: `T` matches the documented hook signatures, and the copied
        // function pointer is only called while `self.library` is loaded.
        let symbol = unsafe { self.library.get::<T>(name.as_bytes()) }
            .map_err(|_| PluginError::MissingHook { hook: name })?;
        Ok(*symbol)
    }
}

impl Plugin for NativePlugin {
    fn activate(&mut self, lua: &Lua) -> Result<(), PluginError> {
        let load: LoadFn = self.symbol(LOAD_HOOK)?;

        let mut status: c_int = 0;
        // SAFETY: the hook only registers functions through the Lua C API
        // and leaves the stack balanced.
        unsafe {
            lua.exec_raw::<()>((), |state| {
                status = load(state);
            })
        }
        .map_err(|e| PluginError::Open {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if status != 0 {
            return Err(PluginError::HookFailed {
                hook: LOAD_HOOK,
                status,
            });
        }
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), PluginError> {
        let unload: UnloadFn = self.symbol(UNLOAD_HOOK)?;
        // SAFETY: the hook takes no arguments and touches only plugin state.
        let status = unsafe { unload() };
        if status != 0 {
            return Err(PluginError::HookFailed {
                hook: UNLOAD_HOOK,
                status,
            });
        }
        Ok(())
    }
}
