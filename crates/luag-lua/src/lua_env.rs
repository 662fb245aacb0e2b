//! Sandboxed Lua environment.
//!
//! Every interpreter the host creates gets:
//! - only the base, `string`, `table` and `math` libraries
//! - no `dofile`/`loadfile` (no way to read host files directly)
//! - host functions `loadscript`, `exit` and `log`
//!
//! # Host Functions
//!
//! | Lua | Effect |
//! |-----|--------|
//! | `loadscript(name)` | runs `scripts/<name>`, confined to the cartridge |
//! | `exit([code], [message])` | posts an exit request, returns immediately |
//! | `log(...)` | writes to the `luag::script` tracing target |

use crate::error::EngineError;
use crate::exit::{ExitMailbox, ExitRequest};
use luag_runtime::CartridgeSandbox;
use mlua::{Lua, LuaOptions, MultiValue, StdLib, Value, Variadic};
use std::path::{Path, PathBuf};

/// Factory for sandboxed interpreters bound to one cartridge.
#[derive(Debug, Clone)]
pub struct LuaEnv {
    sandbox: CartridgeSandbox,
    scripts_dir: PathBuf,
    mailbox: ExitMailbox,
}

impl LuaEnv {
    /// `scripts_dir` is where `loadscript` names are resolved; files are
    /// still only accepted inside the sandbox root.
    #[must_use]
    pub fn new(
        sandbox: CartridgeSandbox,
        scripts_dir: impl Into<PathBuf>,
        mailbox: ExitMailbox,
    ) -> Self {
        Self {
            sandbox,
            scripts_dir: scripts_dir.into(),
            mailbox,
        }
    }

    /// Creates a fresh interpreter with the host functions installed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Interpreter`] if VM setup fails.
    pub fn create_lua(&self) -> Result<Lua, EngineError> {
        let lua = new_interpreter()?;
        self.install(&lua)?;
        Ok(lua)
    }

    /// Installs the host functions into `lua`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Interpreter`] if a global cannot be set.
    pub fn install(&self, lua: &Lua) -> Result<(), EngineError> {
        self.register(lua)
            .map_err(|e| EngineError::Interpreter(e.to_string()))
    }

    fn register(&self, lua: &Lua) -> mlua::Result<()> {
        let globals = lua.globals();

        let sandbox = self.sandbox.clone();
        let scripts_dir = self.scripts_dir.clone();
        let loadscript = lua.create_function(move |lua, name: String| {
            let path = sandbox
                .validate_read_in(&scripts_dir, &name)
                .map_err(mlua::Error::external)?;
            run_file(lua, &path)
        })?;
        globals.set("loadscript", loadscript)?;

        let mailbox = self.mailbox.clone();
        let exit = lua.create_function(
            move |_, (code, message): (Option<i64>, Option<String>)| {
                let code = code.unwrap_or(0);
                let code = i8::try_from(code).unwrap_or(if code < 0 { i8::MIN } else { i8::MAX });
                mailbox.post(ExitRequest { code, message });
                Ok(())
            },
        )?;
        globals.set("exit", exit)?;

        let log = lua.create_function(|_, args: Variadic<Value>| {
            let parts = args
                .iter()
                .map(Value::to_string)
                .collect::<mlua::Result<Vec<_>>>()?;
            tracing::info!(target: "luag::script", "{}", parts.join("\t"));
            Ok(())
        })?;
        globals.set("log", log)?;

        Ok(())
    }
}

/// Creates an interpreter with the safe library subset and without file
/// loaders, but no host functions yet.
///
/// # Errors
///
/// Returns [`EngineError::Interpreter`] if VM setup fails.
pub fn new_interpreter() -> Result<Lua, EngineError> {
    let setup = || -> mlua::Result<Lua> {
        let lua = Lua::new_with(
            StdLib::STRING | StdLib::TABLE | StdLib::MATH,
            LuaOptions::default(),
        )?;
        let globals = lua.globals();
        globals.set("dofile", Value::Nil)?;
        globals.set("loadfile", Value::Nil)?;
        Ok(lua)
    };
    setup().map_err(|e| EngineError::Interpreter(e.to_string()))
}

/// Runs the Lua file at `path` and returns its results.
///
/// The caller is responsible for confinement.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the chunk fails.
pub fn run_file(lua: &Lua, path: &Path) -> mlua::Result<MultiValue> {
    let source = std::fs::read_to_string(path).map_err(mlua::Error::external)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    lua.load(source).set_name(format!("@{name}")).call(())
}
