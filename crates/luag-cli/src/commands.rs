//! Shell command table.
//!
//! | Command | Aliases | Mode |
//! |---------|---------|------|
//! | `run [name]` | | any (name required in user mode) |
//! | `edit` | `editor` | developer |
//! | `pack <name>` | | developer |
//! | `unpack <name>` | | developer |
//! | `setup` | | developer |
//! | `cls` | `clear` | any |
//! | `ver` | `version` | any |
//! | `help [cmd]` | | any |
//! | `mode [d\|u]` | | any |
//! | `files` | | any |
//! | `log` | | any |
//! | `exit` | | any |
//!
//! Every command's output is followed by a blank line.

use crate::console::Console;
use luag_runtime::cartridge::{self, ARCHIVE_EXT, INFO_FILE, MAIN_SCRIPT, SCRIPTS_DIR, SFX_DIR};
use luag_runtime::config::ConsoleMode;
use luag_runtime::terminal::CommandLine;
use luag_runtime::CartridgeSource;
use std::path::PathBuf;

pub const VERSION_LINE: &str = concat!("LuaG ", env!("CARGO_PKG_VERSION"));
pub const COPYRIGHT_NOTICE: &str = "Copyright 2022 Vulcalien";

const MAIN_TEMPLATE: &str = "\
function init()
end

function tick()
end
";

type Handler = fn(&mut Console, &[String]);

pub(crate) struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// One-line description for the `help` list.
    pub summary: &'static str,
    /// Text for `help <name>`.
    pub help: &'static str,
    run: Handler,
}

pub(crate) static COMMANDS: &[Command] = &[
    Command {
        name: "run",
        aliases: &[],
        summary: "runs game",
        help: "'run [name]'\nruns the game folder\nor cartridges/<name>.luag\nuser mode needs a name",
        run: cmd_run,
    },
    Command {
        name: "edit",
        aliases: &["editor"],
        summary: "opens editor",
        help: "'edit'\nruns the game folder\nwith the editor",
        run: cmd_edit,
    },
    Command {
        name: "pack",
        aliases: &[],
        summary: "creates cartridge",
        help: "'pack <name>'\npacks the game folder\ninto cartridges/<name>.luag",
        run: cmd_pack,
    },
    Command {
        name: "unpack",
        aliases: &[],
        summary: "extracts cartridge",
        help: "'unpack <name>'\nextracts cartridges/<name>.luag\ninto the game folder",
        run: cmd_unpack,
    },
    Command {
        name: "setup",
        aliases: &[],
        summary: "creates game files",
        help: "'setup'\ncreates the game folder\nwith a main.lua template",
        run: cmd_setup,
    },
    Command {
        name: "cls",
        aliases: &["clear"],
        summary: "clears shell",
        help: "'cls'\nclears the shell",
        run: cmd_cls,
    },
    Command {
        name: "ver",
        aliases: &["version"],
        summary: "prints version",
        help: "'ver'\nprints the console version",
        run: cmd_ver,
    },
    Command {
        name: "help",
        aliases: &[],
        summary: "prints this list",
        help: "'help [command]'\nlists the commands or\ndescribes one of them",
        run: cmd_help,
    },
    Command {
        name: "mode",
        aliases: &[],
        summary: "changes console mode",
        help: "'mode <mode>'\nchanges the console mode\n'd' is developer\n'u' is user",
        run: cmd_mode,
    },
    Command {
        name: "files",
        aliases: &[],
        summary: "shows game folder",
        help: "'files'\nprints the path of\nthe game folder",
        run: cmd_files,
    },
    Command {
        name: "log",
        aliases: &[],
        summary: "shows log file",
        help: "'log'\nprints the path of\nthe log file",
        run: cmd_log,
    },
    Command {
        name: "exit",
        aliases: &[],
        summary: "quits console",
        help: "'exit'\nquits the console",
        run: cmd_exit,
    },
];

/// Looks a command up by name or alias. `name` must be lowercase.
pub(crate) fn find(name: &str) -> Option<&'static Command> {
    COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.contains(&name))
}

/// Runs a submitted command line against the console.
pub(crate) fn execute(console: &mut Console, line: &CommandLine) {
    match find(&line.command) {
        Some(command) => (command.run)(console, &line.args),
        None => console.terminal.write("unknown command", false),
    }
    console.terminal.write("\n", false);
}

fn error(console: &mut Console, message: &str) {
    console.terminal.write(&format!("Error:\n{message}"), true);
}

fn require_developer(console: &mut Console, command: &str) -> bool {
    if console.mode == ConsoleMode::Developer {
        return true;
    }
    error(console, &format!("'{command}' needs\ndeveloper mode"));
    false
}

/// Validates a cartridge name and returns its archive path.
fn archive_path(console: &mut Console, args: &[String]) -> Option<PathBuf> {
    let Some(name) = args.first() else {
        error(console, "missing cartridge name");
        return None;
    };
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        error(console, "invalid cartridge name");
        return None;
    }
    Some(
        console
            .paths
            .resolved_cartridges_dir()
            .join(format!("{name}.{ARCHIVE_EXT}")),
    )
}

fn start(console: &mut Console, source: CartridgeSource, editor_mode: bool) {
    tracing::info!(source = %source.path().display(), editor_mode, "Starting cartridge");
    console.host.select_cartridge(source);
    if let Err(e) = console.host.load(editor_mode) {
        console.report(&e);
    }
}

fn cmd_run(console: &mut Console, args: &[String]) {
    let source = if args.is_empty() && console.mode == ConsoleMode::Developer {
        CartridgeSource::Folder(console.paths.dev_dir())
    } else {
        let Some(path) = archive_path(console, args) else {
            return;
        };
        CartridgeSource::Archive(path)
    };
    start(console, source, false);
}

fn cmd_edit(console: &mut Console, _args: &[String]) {
    if !require_developer(console, "edit") {
        return;
    }
    let source = CartridgeSource::Folder(console.paths.dev_dir());
    start(console, source, true);
}

fn cmd_pack(console: &mut Console, args: &[String]) {
    if !require_developer(console, "pack") {
        return;
    }
    let Some(dest) = archive_path(console, args) else {
        return;
    };

    match cartridge::archive::pack(&console.paths.dev_dir(), &dest) {
        Ok(()) => {
            let name = dest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            console
                .terminal
                .write(&format!("cartridge packed:\n{name}"), false);
        }
        Err(e) => {
            tracing::error!(error = %e, "Pack failed");
            error(console, &e.to_string());
        }
    }
}

fn cmd_unpack(console: &mut Console, args: &[String]) {
    if !require_developer(console, "unpack") {
        return;
    }
    let Some(src) = archive_path(console, args) else {
        return;
    };

    match cartridge::archive::unpack(&src, &console.paths.dev_dir()) {
        Ok(()) => console
            .terminal
            .write("cartridge unpacked\ninto the game folder", false),
        Err(e) => {
            tracing::error!(error = %e, "Unpack failed");
            error(console, &e.to_string());
        }
    }
}

fn cmd_setup(console: &mut Console, _args: &[String]) {
    if !require_developer(console, "setup") {
        return;
    }

    let dev_dir = console.paths.dev_dir();
    let main = dev_dir.join(SCRIPTS_DIR).join(MAIN_SCRIPT);
    if main.exists() {
        console.terminal.write("game files\nalready exist", false);
        return;
    }

    let info = format!("library-version = {}\n", console.default_version);
    let created = std::fs::create_dir_all(dev_dir.join(SCRIPTS_DIR))
        .and_then(|()| std::fs::create_dir_all(dev_dir.join(SFX_DIR)))
        .and_then(|()| std::fs::write(&main, MAIN_TEMPLATE))
        .and_then(|()| {
            let info_path = dev_dir.join(INFO_FILE);
            if info_path.exists() {
                Ok(())
            } else {
                std::fs::write(info_path, info)
            }
        });

    match created {
        Ok(()) => {
            tracing::info!(path = %dev_dir.display(), "Game files created");
            console.terminal.write("game files created", false);
        }
        Err(e) => {
            tracing::error!(path = %dev_dir.display(), error = %e, "Setup failed");
            error(console, &format!("cannot create game files: {e}"));
        }
    }
}

fn cmd_cls(console: &mut Console, _args: &[String]) {
    console.terminal.clear();
}

fn cmd_ver(console: &mut Console, _args: &[String]) {
    console.terminal.write(VERSION_LINE, false);
    console.terminal.write(COPYRIGHT_NOTICE, false);
    console.terminal.write("This is Free software", false);
}

fn cmd_help(console: &mut Console, args: &[String]) {
    if let Some(name) = args.first() {
        match find(&name.to_lowercase()) {
            Some(command) => console.terminal.write(command.help, false),
            None => console.terminal.write("unknown command", false),
        }
        return;
    }

    for command in COMMANDS {
        console
            .terminal
            .write(&format!("{}: {}", command.name, command.summary), false);
    }
    console.terminal.write("\n", false);
}

fn cmd_mode(console: &mut Console, args: &[String]) {
    let Some(arg) = args.first() else {
        let current = format!("current mode:\n{}\n\n", console.mode);
        console.terminal.write(&current, false);
        return;
    };

    match ConsoleMode::parse(arg) {
        Some(mode) => {
            tracing::info!(%mode, "Console mode changed");
            console.mode = mode;
            console
                .terminal
                .write(&format!("switching to\n{mode} mode\n\n"), false);
        }
        None => error(console, "unrecognized mode\ntry 'd' or 'u'"),
    }
}

fn cmd_files(console: &mut Console, _args: &[String]) {
    let path = console.paths.dev_dir();
    console
        .terminal
        .write(&format!("game folder:\n{}", path.display()), false);
}

fn cmd_log(console: &mut Console, _args: &[String]) {
    let path = console.paths.resolved_log_file();
    console
        .terminal
        .write(&format!("log file:\n{}", path.display()), false);
}

fn cmd_exit(console: &mut Console, _args: &[String]) {
    console.request_quit();
}
