//! Integration tests for the script host lifecycle.
//!
//! Plugins are simulated by `FakeLoader`: the resolver probes real files
//! (empty placeholders named like native libraries) and the loader turns
//! each into a `FakePlugin` that records its activation and sets a global
//! naming the library it came from.

use luag_lua::plugin::{editor_file_name, library_file_name};
use luag_lua::{EngineError, HostOptions, Plugin, PluginError, PluginLoader, ScriptHost};
use luag_runtime::cartridge::archive;
use luag_runtime::{CartridgeError, CartridgeSource, ErrorCode, Version};
use mlua::Lua;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// Fake plugins
// =============================================================================

type EventLog = Arc<Mutex<Vec<String>>>;

/// Dropped when the interpreter holding it closes.
struct Sentinel(EventLog);

impl mlua::UserData for Sentinel {}

impl Drop for Sentinel {
    fn drop(&mut self) {
        self.0.lock().push("lua closed".into());
    }
}

struct FakePlugin {
    name: String,
    events: EventLog,
    fail_activate: bool,
}

impl Plugin for FakePlugin {
    fn activate(&mut self, lua: &Lua) -> Result<(), PluginError> {
        if self.fail_activate {
            return Err(PluginError::HookFailed {
                hook: luag_lua::plugin::LOAD_HOOK,
                status: 1,
            });
        }
        let globals = lua.globals();
        let key = if self.name.contains("editor") {
            "EDITOR_LIB"
        } else {
            "CORE_LIB"
        };
        globals.set(key, self.name.as_str()).expect("set global");
        globals
            .set(format!("__sentinel_{key}"), Sentinel(Arc::clone(&self.events)))
            .expect("set sentinel");
        self.events.lock().push(format!("activate {}", self.name));
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), PluginError> {
        self.events.lock().push(format!("deactivate {}", self.name));
        Ok(())
    }
}

#[derive(Default)]
struct FakeLoader {
    events: EventLog,
    fail_activate: bool,
}

impl PluginLoader for FakeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn Plugin>, PluginError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Box::new(FakePlugin {
            name,
            events: Arc::clone(&self.events),
            fail_activate: self.fail_activate,
        }))
    }
}

// =============================================================================
// Fixture
// =============================================================================

struct Console {
    dir: tempfile::TempDir,
    events: EventLog,
    host: ScriptHost,
}

impl Console {
    fn new(libs: &[(u32, u32)]) -> Self {
        Self::with_loader(libs, false)
    }

    fn with_loader(libs: &[(u32, u32)], fail_activate: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let lib_dir = dir.path().join("luag-lib");
        fs::create_dir_all(&lib_dir).expect("mkdir lib");
        for &(major, minor) in libs {
            fs::write(lib_dir.join(library_file_name(Version::new(major, minor))), b"")
                .expect("write lib");
        }

        let loader = FakeLoader {
            events: EventLog::default(),
            fail_activate,
        };
        let events = Arc::clone(&loader.events);
        let mut options = HostOptions::new(lib_dir.clone());
        options.max_probe = 10;
        let host = ScriptHost::with_loader(options, Arc::new(loader));

        Self { dir, events, host }
    }

    fn install_editor(&self) {
        fs::write(self.lib_dir().join(editor_file_name()), b"").expect("write editor");
    }

    fn lib_dir(&self) -> PathBuf {
        self.dir.path().join("luag-lib")
    }

    /// Writes a development folder and selects it.
    fn game(&mut self, main: &str, info: Option<&str>) -> PathBuf {
        let root = self.dir.path().join("game");
        fs::create_dir_all(root.join("scripts")).expect("mkdir scripts");
        fs::write(root.join("scripts/main.lua"), main).expect("write main");
        if let Some(info) = info {
            fs::write(root.join("cartridge-info"), info).expect("write info");
        }
        self.host.select_cartridge(CartridgeSource::Folder(root.clone()));
        root
    }

    fn global<T: mlua::FromLua>(&self, name: &str) -> T {
        self.host
            .with_lua(|lua| lua.globals().get::<T>(name))
            .expect("running")
            .expect("global")
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

const COUNTING_GAME: &str = r#"
ticks = 0
function init() end
function tick() ticks = ticks + 1 end
"#;

// =============================================================================
// Version resolution
// =============================================================================

#[test]
fn resolves_closest_compatible_minor() {
    let mut console = Console::new(&[(1, 2), (1, 4), (1, 5)]);
    console.game(COUNTING_GAME, Some("library-version = 1.3\n"));

    console.host.load(false).expect("load");
    assert_eq!(console.host.plugin_version(), Some(Version::new(1, 4)));
    let lib: String = console.global("CORE_LIB");
    assert_eq!(lib, library_file_name(Version::new(1, 4)));
}

#[test]
fn missing_metadata_uses_default_version() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);

    console.host.load(false).expect("load");
    assert_eq!(console.host.plugin_version(), Some(Version::new(1, 3)));
    assert_eq!(
        console.host.workspace().map(|w| w.version()),
        Some(Version::new(1, 3))
    );
}

#[test]
fn malformed_metadata_fails_load() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, Some("library-version = banana\n"));

    let err = console.host.load(false).expect_err("malformed info");
    assert!(matches!(
        err,
        EngineError::Cartridge(CartridgeError::InvalidInfo(_))
    ));
    assert!(!console.host.is_running());
    assert_eq!(console.count("activate"), 0);
}

#[test]
fn other_major_is_never_used() {
    let mut console = Console::new(&[(2, 0), (2, 5)]);
    console.game(COUNTING_GAME, Some("library-version = 1.0\n"));

    let err = console.host.load(false).expect_err("no 1.x library");
    assert!(matches!(
        err,
        EngineError::Plugin(PluginError::Incompatible { major: 1, minor: 0 })
    ));
    assert_eq!(
        err.to_string(),
        "could not find a version of LuaG Library compatible with 1.0"
    );
    assert!(!console.host.is_running());
}

#[test]
fn failed_activation_leaves_host_idle() {
    let mut console = Console::with_loader(&[(1, 3)], true);
    console.game(COUNTING_GAME, None);

    let err = console.host.load(false).expect_err("activation fails");
    assert_eq!(err.code(), "PLUGIN_HOOK_FAILED");
    assert!(!console.host.is_running());
    assert_eq!(console.count("deactivate"), 0);
}

// =============================================================================
// Load
// =============================================================================

#[test]
fn load_requires_a_cartridge() {
    let mut console = Console::new(&[(1, 3)]);
    let err = console.host.load(false).expect_err("nothing selected");
    assert!(matches!(err, EngineError::NoCartridge));
}

#[test]
fn load_while_running_is_refused() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);
    console.host.load(false).expect("load");

    let err = console.host.load(true).expect_err("already running");
    assert!(matches!(err, EngineError::AlreadyRunning));
    assert!(console.host.is_running());
    assert!(!console.host.editor_active());
    assert_eq!(console.count("activate"), 1);
}

#[test]
fn missing_init_releases_everything() {
    let mut console = Console::new(&[(1, 3)]);
    console.game("function tick() end", None);

    let err = console.host.load(false).expect_err("no init");
    assert!(matches!(err, EngineError::MissingEntryPoint("init")));
    assert_eq!(err.to_string(), "'main.lua' must contain a function 'init()'");
    assert!(!console.host.is_running());
    assert_eq!(console.count("deactivate"), 1);
}

#[test]
fn syntax_error_in_main_fails_load() {
    let mut console = Console::new(&[(1, 3)]);
    console.game("function init(", None);

    let err = console.host.load(false).expect_err("syntax error");
    assert_eq!(err.code(), "ENGINE_SCRIPT_ERROR");
    assert!(!console.host.is_running());
}

#[test]
fn teardown_closes_interpreter_before_plugins() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);
    console.host.load(false).expect("load");
    console.host.stop().expect("stop");

    let events = console.events();
    let closed = events.iter().position(|e| e == "lua closed").expect("closed");
    let released = events
        .iter()
        .position(|e| e.starts_with("deactivate"))
        .expect("deactivated");
    assert!(closed < released, "{events:?}");
}

// =============================================================================
// Tick / render / stop
// =============================================================================

#[test]
fn tick_calls_script() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);
    console.host.load(false).expect("load");

    for _ in 0..3 {
        console.host.tick().expect("tick");
    }
    let ticks: i64 = console.global("ticks");
    assert_eq!(ticks, 3);
}

#[test]
fn missing_tick_stops_host() {
    let mut console = Console::new(&[(1, 3)]);
    console.game("function init() end", None);
    console.host.load(false).expect("load");

    let err = console.host.tick().expect_err("no tick");
    assert_eq!(err.to_string(), "a function 'tick()' must be defined");
    assert!(!console.host.is_running());
    assert_eq!(console.count("deactivate"), 1);
}

#[test]
fn runtime_error_stops_host() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(
        "function init() end\nfunction tick() error('kaboom') end",
        None,
    );
    console.host.load(false).expect("load");

    let err = console.host.tick().expect_err("script error");
    assert!(err.to_string().contains("kaboom"), "{err}");
    assert!(!console.host.is_running());
}

#[test]
fn stop_twice_tears_down_once() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);
    console.host.load(false).expect("load");

    console.host.stop().expect("first stop");
    let err = console.host.stop().expect_err("second stop");
    assert!(matches!(err, EngineError::NotRunning));
    assert_eq!(console.count("deactivate"), 1);
    assert_eq!(console.count("lua closed"), 1);
}

#[test]
fn operations_require_running_host() {
    let mut console = Console::new(&[(1, 3)]);
    assert!(matches!(console.host.tick(), Err(EngineError::NotRunning)));
    assert!(matches!(console.host.render(), Err(EngineError::NotRunning)));
    assert!(matches!(console.host.reload(), Err(EngineError::NotRunning)));
}

#[test]
fn render_is_skipped_before_scripted_rendering() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(
        "function init() end\nfunction tick() end\nfunction render() error('drawn') end",
        None,
    );
    console.host.load(false).expect("load");

    console.host.render().expect("major 1 never calls render");
    assert!(console.host.is_running());
}

#[test]
fn render_runs_for_scripted_major() {
    let mut console = Console::new(&[(2, 0)]);
    console.game(
        "frames = 0\nfunction init() end\nfunction tick() end\nfunction render() frames = frames + 1 end",
        Some("library-version = 2.0"),
    );
    console.host.load(false).expect("load");

    console.host.render().expect("render");
    console.host.render().expect("render");
    let frames: i64 = console.global("frames");
    assert_eq!(frames, 2);
}

#[test]
fn missing_render_stops_scripted_major() {
    let mut console = Console::new(&[(2, 0)]);
    console.game(
        "function init() end\nfunction tick() end",
        Some("library-version = 2.0"),
    );
    console.host.load(false).expect("load");
    console.host.tick().expect("tick");

    let err = console.host.render().expect_err("render is required");
    assert!(
        matches!(err, EngineError::MissingEntryPoint("render")),
        "unexpected error: {err}"
    );
    assert!(!console.host.is_running());
}

// =============================================================================
// Exit requests
// =============================================================================

#[test]
fn exit_from_tick_stops_at_next_tick() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(
        "function init() end\nfunction tick() exit(2, 'game over') end",
        None,
    );
    console.host.load(false).expect("load");

    console.host.tick().expect("exit returns normally");
    assert!(console.host.is_running());

    let err = console.host.tick().expect_err("pending exit");
    match err {
        EngineError::RequestedExit { code, message } => {
            assert_eq!(code, 2);
            assert_eq!(message.as_deref(), Some("game over"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!console.host.is_running());
}

#[test]
fn exit_from_init_aborts_load() {
    let mut console = Console::new(&[(1, 3)]);
    console.game("function init() exit() end\nfunction tick() end", None);

    let err = console.host.load(false).expect_err("exit in init");
    assert!(matches!(err, EngineError::RequestedExit { code: 0, .. }));
    assert!(!err.is_failure());
    assert!(!console.host.is_running());
    assert_eq!(console.count("deactivate"), 1);
}

#[test]
fn ask_exit_overwrites_and_is_checked_first() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);
    console.host.load(false).expect("load");

    console.host.ask_exit(1, None);
    console.host.ask_exit(5, Some("later".into()));
    let ticks_before: i64 = console.global("ticks");

    let err = console.host.tick().expect_err("pending exit");
    assert!(matches!(err, EngineError::RequestedExit { code: 5, .. }));
    assert_eq!(ticks_before, 0);
    assert!(!console.host.is_running());
}

// =============================================================================
// Editor and reload
// =============================================================================

#[test]
fn editor_mode_loads_editor_plugin() {
    let mut console = Console::new(&[(1, 3)]);
    console.install_editor();
    console.game(COUNTING_GAME, None);

    console.host.load(true).expect("load");
    assert!(console.host.editor_active());
    let editor: String = console.global("EDITOR_LIB");
    assert_eq!(editor, editor_file_name());
}

#[test]
fn missing_editor_fails_and_releases_core() {
    let mut console = Console::new(&[(1, 3)]);
    console.game(COUNTING_GAME, None);

    let err = console.host.load(true).expect_err("no editor");
    assert_eq!(err.to_string(), "could not find the LuaG Editor Library");
    assert!(!console.host.is_running());
    assert_eq!(console.count("deactivate"), 1);
}

#[test]
fn reload_preserves_editor_mode_and_rereads_scripts() {
    let mut console = Console::new(&[(1, 3)]);
    console.install_editor();
    let root = console.game("VERSION = 1\nfunction init() end\nfunction tick() end", None);
    console.host.load(true).expect("load");

    fs::write(
        root.join("scripts/main.lua"),
        "VERSION = 2\nfunction init() end\nfunction tick() end",
    )
    .expect("rewrite");
    console.host.reload().expect("reload");

    assert!(console.host.editor_active());
    let version: i64 = console.global("VERSION");
    assert_eq!(version, 2);
}

// =============================================================================
// Confinement and archives
// =============================================================================

#[test]
fn scripts_cannot_load_outside_the_cartridge() {
    let mut console = Console::new(&[(1, 3)]);
    fs::write(console.dir.path().join("outside.lua"), "ESCAPED = true").expect("write");
    let root = console.game(
        r#"
        function init()
            local ok, err = pcall(loadscript, "../../outside.lua")
            BLOCKED = not ok
            MESSAGE = tostring(err)
            helper_ok = pcall(loadscript, "helper.lua")
        end
        function tick() end
        "#,
        None,
    );
    fs::write(root.join("scripts/helper.lua"), "HELPED = true").expect("write helper");

    console.host.load(false).expect("load");
    let blocked: bool = console.global("BLOCKED");
    let escaped: Option<bool> = console.global("ESCAPED");
    let helped: bool = console.global("HELPED");
    let message: String = console.global("MESSAGE");
    assert!(blocked);
    assert_eq!(escaped, None);
    assert!(helped);
    assert!(message.contains("outside the cartridge folder"), "{message}");
}

#[cfg(unix)]
#[test]
fn symlinks_out_of_the_cartridge_are_rejected() {
    let mut console = Console::new(&[(1, 3)]);
    let secret = console.dir.path().join("secret.lua");
    fs::write(&secret, "LEAKED = true").expect("write");
    let root = console.game(
        "function init() OK = pcall(loadscript, 'link.lua') end\nfunction tick() end",
        None,
    );
    std::os::unix::fs::symlink(&secret, root.join("scripts/link.lua")).expect("symlink");

    console.host.load(false).expect("load");
    let ok: bool = console.global("OK");
    let leaked: Option<bool> = console.global("LEAKED");
    assert!(!ok);
    assert_eq!(leaked, None);
}

#[test]
fn archive_cartridge_runs_from_temporary_directory() {
    let mut console = Console::new(&[(1, 3)]);
    let root = console.game(COUNTING_GAME, None);
    let package = console.dir.path().join("game.luag");
    archive::pack(&root, &package).expect("pack");

    console.host.select_cartridge(CartridgeSource::Archive(package));
    console.host.load(false).expect("load archive");
    let extracted = console
        .host
        .workspace()
        .map(|w| (w.root().to_path_buf(), w.is_temporary()))
        .expect("workspace");
    assert!(extracted.1);
    assert!(extracted.0.join("scripts/main.lua").is_file());

    console.host.stop().expect("stop");
    assert!(extracted.0.exists(), "kept until the next open");

    console.host.select_cartridge(CartridgeSource::Folder(root));
    console.host.load(false).expect("load folder");
    assert!(!extracted.0.exists(), "removed on the next open");
}
