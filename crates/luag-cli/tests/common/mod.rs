//! Shared E2E test helpers for `luag` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::Path;
use std::time::Duration;

/// Default timeout for basic CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Tick rate for tests. The terminal consumes one byte per tick.
pub const FAST_TPS: &str = "5000";

/// Environment variables the config loader reads.
const LUAG_VARS: &[&str] = &[
    "LUAG_DEBUG",
    "LUAG_MODE",
    "LUAG_MAX_PROBE",
    "LUAG_USERDATA_DIR",
    "LUAG_LIB_DIR",
    "LUAG_LOG_FILE",
    "RUST_LOG",
];

/// Build a Command for the `luag` binary sandboxed in a fresh tempdir.
///
/// Returns (command, guard). Keep the guard alive for the test's duration;
/// its path is the console's user data root.
pub fn luag_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp dir for user data");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("luag");
    cmd.timeout(TIMEOUT_BASIC);
    for var in LUAG_VARS {
        cmd.env_remove(var);
    }
    cmd.arg(sandbox_arg(tmp.path()));
    cmd.args(["--tps", FAST_TPS]);
    (cmd, tmp)
}

pub fn sandbox_arg(dir: &Path) -> String {
    format!("--sandbox={}", dir.display())
}
