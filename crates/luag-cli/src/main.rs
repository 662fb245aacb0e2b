//! LuaG console.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`LUAG_*`)
//! 3. Project config (`.luag/config.toml` in current directory)
//! 4. Global config (`~/.luag/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `LUAG_DEBUG`: Enable debug mode (`true`/`false`)
//! - `LUAG_MODE`: Console mode (`d`/`u`)
//! - `LUAG_MAX_PROBE`: Minor versions probed for a library
//! - `LUAG_USERDATA_DIR`: User data root
//! - `LUAG_LIB_DIR`: Native library folder
//! - `LUAG_LOG_FILE`: Log file path
//!
//! # Modes of Operation
//!
//! Without a trailing command the console reads lines from stdin until EOF
//! or `exit`. With one (`luag -- help mode`) the line is run and the console
//! exits once its output is printed.

mod commands;
mod console;
mod frontend;
mod tracing_writer;

use anyhow::{Context, Result};
use clap::Parser;
use console::Console;
use frontend::{StdoutFrontend, SystemClipboard};
use luag_lua::ScriptHost;
use luag_runtime::config::{ConfigError, ConfigLoader, ConfigResolver, ConsoleConfig, ConsoleMode};
use luag_runtime::WorkDir;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// LuaG fantasy console
#[derive(Parser, Debug)]
#[command(name = "luag")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Run with isolated user data (game folder, cartridges, libraries, logs).
    ///
    /// Uses a temporary directory if DIR is omitted. Global config is skipped.
    #[arg(long, value_name = "DIR")]
    sandbox: Option<Option<PathBuf>>,

    /// Override the user data root (also: LUAG_USERDATA_DIR)
    #[arg(long, value_name = "DIR")]
    userdata_dir: Option<PathBuf>,

    /// Override the native library folder (also: LUAG_LIB_DIR)
    #[arg(long, value_name = "DIR")]
    lib_dir: Option<PathBuf>,

    /// Override the log file path (also: LUAG_LOG_FILE)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Console mode: d(eveloper) or u(ser) (also: LUAG_MODE)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ConsoleMode>,

    /// Minor versions probed when resolving a library (also: LUAG_MAX_PROBE)
    #[arg(long)]
    max_probe: Option<u32>,

    /// Console ticks per second
    #[arg(long)]
    tps: Option<u32>,

    /// Command to execute (optional)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn parse_mode(s: &str) -> Result<ConsoleMode, String> {
    ConsoleMode::parse(s).ok_or_else(|| format!("unrecognized mode '{s}', try 'd' or 'u'"))
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
struct CliConfigResolver {
    project_root: PathBuf,
    debug: bool,
    userdata_dir: Option<PathBuf>,
    lib_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    mode: Option<ConsoleMode>,
    max_probe: Option<u32>,
    tps: Option<u32>,
    /// Sandbox root. When set, user data lives here and global config is
    /// skipped.
    sandbox_dir: Option<PathBuf>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            project_root,
            debug: args.debug,
            userdata_dir: args.userdata_dir.clone(),
            lib_dir: args.lib_dir.clone(),
            log_file: args.log_file.clone(),
            mode: args.mode,
            max_probe: args.max_probe,
            tps: args.tps,
            sandbox_dir: None,
        }
    }

    /// Loads file/env layers, then applies the CLI overrides.
    fn resolve(&self) -> Result<ConsoleConfig, ConfigError> {
        let mut loader = ConfigLoader::new().with_project_root(&self.project_root);
        if self.sandbox_dir.is_some() {
            loader = loader.skip_global_config();
        }

        let mut config = loader.load()?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(ref sandbox) = self.sandbox_dir {
            config.paths.userdata_dir = Some(sandbox.clone());
            config.paths.cartridges_dir = None;
            config.paths.lib_dir = None;
            config.paths.log_file = None;
        }

        if self.debug {
            config.debug = true;
        }
        if let Some(ref p) = self.userdata_dir {
            config.paths.userdata_dir = Some(p.clone());
        }
        if let Some(ref p) = self.lib_dir {
            config.paths.lib_dir = Some(p.clone());
        }
        if let Some(ref p) = self.log_file {
            config.paths.log_file = Some(p.clone());
        }
        if let Some(mode) = self.mode {
            config.console.mode = mode;
        }
        if let Some(n) = self.max_probe {
            config.engine.max_probe = n;
        }
        if let Some(n) = self.tps {
            config.engine.tps = n;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Owned here so a temporary sandbox lives until exit.
    let sandbox_work_dir: Option<WorkDir> = match &args.sandbox {
        Some(Some(path)) => Some(
            WorkDir::persistent(path.clone())
                .with_context(|| format!("cannot create sandbox directory {}", path.display()))?,
        ),
        Some(None) => Some(
            WorkDir::temporary().context("cannot create temporary sandbox directory")?,
        ),
        None => None,
    };

    let mut resolver = CliConfigResolver::from_args(&args);
    if let Some(ref wd) = sandbox_work_dir {
        resolver.sandbox_dir = Some(wd.path().to_path_buf());
    }

    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    // Terminal filter: --debug > --verbose > RUST_LOG env > default "warn".
    // The file layer always records info and above.
    let terminal_filter = if args.debug || config.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_writer(tracing_writer::LogMakeWriter::stderr());

    let log_path = config.paths.resolved_log_file();
    if let Some(file) = tracing_writer::open_log_file(&log_path) {
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(tracing_writer::LogMakeWriter::file(file));

        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .with(file_layer.with_filter(EnvFilter::new("info")))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        userdata = %config.paths.resolved_userdata_dir().display(),
        lib_dir = %config.paths.resolved_lib_dir().display(),
        log = %log_path.display(),
        mode = %config.console.mode,
        "Console starting"
    );

    let host = ScriptHost::new(console::host_options(&config)?);
    let mut console =
        Console::new(&config, host)?.with_clipboard(Box::new(SystemClipboard::default()));

    let (tx, rx) = mpsc::channel(64);
    if args.command.is_empty() {
        frontend::spawn_stdin_reader(tx).context("cannot start stdin reader")?;
    } else {
        let line = args.command.join(" ");
        info!(command = %line, "Command mode");
        tx.send(format!("{line}\n")).await?;
        drop(tx);
    }

    run_loop(&mut console, StdoutFrontend::detect(), rx, config.engine.tps).await?;

    info!(mode = %console.mode(), "Console stopped");
    Ok(())
}

/// Fixed-rate console loop.
///
/// Ends on `exit`, on Ctrl+C, or when input is exhausted and the console
/// has gone idle. A running cartridge is stopped before returning.
async fn run_loop(
    console: &mut Console,
    mut frontend: StdoutFrontend,
    mut input: mpsc::Receiver<String>,
    tps: u32,
) -> Result<()> {
    let period = Duration::from_secs(1) / tps.max(1);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                console.tick();
                console.render();
                frontend.present(console.terminal())?;

                if console.should_quit() || (!input_open && console.is_idle()) {
                    break;
                }
            }
            line = input.recv(), if input_open => match line {
                Some(text) => console.receive_input(&text),
                None => {
                    tracing::debug!("Input closed");
                    input_open = false;
                }
            },
            _ = &mut ctrl_c => {
                info!(running = console.host().is_running(), "Interrupted");
                break;
            }
        }
    }

    console.shutdown();
    frontend.present(console.terminal())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: a resolver sandboxed in a WorkDir (no global config).
    fn resolver_in(wd: &WorkDir) -> CliConfigResolver {
        CliConfigResolver {
            project_root: wd.path().to_path_buf(),
            debug: false,
            userdata_dir: None,
            lib_dir: None,
            log_file: None,
            mode: None,
            max_probe: None,
            tps: None,
            sandbox_dir: Some(wd.path().to_path_buf()),
        }
    }

    #[test]
    fn resolve_defaults_under_sandbox() {
        let wd = WorkDir::temporary().expect("should create temp WorkDir for test");
        let config = resolver_in(&wd).resolve().expect("should resolve");

        assert_eq!(config.paths.resolved_userdata_dir(), wd.path());
        assert_eq!(config.paths.resolved_lib_dir(), wd.path().join("luag-lib"));
        assert_eq!(config.engine.tps, 60);
    }

    #[test]
    fn cli_overrides_win() {
        let wd = WorkDir::temporary().expect("should create temp WorkDir for test");
        let mut resolver = resolver_in(&wd);
        resolver.debug = true;
        resolver.mode = Some(ConsoleMode::User);
        resolver.lib_dir = Some(PathBuf::from("/opt/luag-lib"));
        resolver.max_probe = Some(5);
        resolver.tps = Some(120);

        let config = resolver.resolve().expect("should resolve");
        assert!(config.debug);
        assert_eq!(config.console.mode, ConsoleMode::User);
        assert_eq!(config.paths.resolved_lib_dir(), PathBuf::from("/opt/luag-lib"));
        assert_eq!(config.engine.max_probe, 5);
        assert_eq!(config.engine.tps, 120);
    }

    #[test]
    fn project_config_is_read() {
        let wd = WorkDir::temporary().expect("should create temp WorkDir for test");
        let dir = wd.path().join(".luag");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("config.toml"), "[engine]\ntps = 30\n").expect("write");

        let config = resolver_in(&wd).resolve().expect("should resolve");
        assert_eq!(config.engine.tps, 30);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let wd = WorkDir::temporary().expect("should create temp WorkDir for test");
        let mut resolver = resolver_in(&wd);
        resolver.tps = Some(0);
        assert!(resolver.resolve().is_err());
    }

    #[test]
    fn mode_argument_parses_short_and_long() {
        assert_eq!(parse_mode("d"), Ok(ConsoleMode::Developer));
        assert_eq!(parse_mode("User"), Ok(ConsoleMode::User));
        assert!(parse_mode("x").is_err());
    }

    #[test]
    fn args_parse_trailing_command() {
        let args = Args::try_parse_from(["luag", "--mode", "u", "--tps", "500", "help", "mode"])
            .expect("should parse");
        assert_eq!(args.mode, Some(ConsoleMode::User));
        assert_eq!(args.tps, Some(500));
        assert_eq!(args.command, vec!["help", "mode"]);
    }
}
