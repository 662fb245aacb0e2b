//! Cartridge confinement sandbox.
//!
//! [`CartridgeSandbox`] is the boundary for every file a script asks to
//! load. A request is accepted only when its canonical path (symlinks
//! resolved) lies under the canonical cartridge root.
//!
//! ```text
//! root: /tmp/luag-cartridge-x1y2/
//!   scripts/main.lua          ✓
//!   scripts/../map            ✓ (still under root)
//!   ../../etc/passwd          ✗ OutsideBoundary
//!   scripts/evil -> /etc      ✗ OutsideBoundary (symlink resolved)
//! ```
//!
//! # Known Limitations
//!
//! Validation is check-then-use: the caller reads the returned canonical
//! path, so an attacker able to swap directories between the check and the
//! read could still race it. Cartridges are untrusted code, not untrusted
//! local users, so this is accepted.

use crate::error::ErrorCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from sandbox validation.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Path resolves outside the sandbox boundary.
    #[error("access denied: '{path}' is outside the cartridge folder '{root}'")]
    OutsideBoundary { path: String, root: String },

    /// Path does not exist.
    #[error("cannot open {path}: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Sandbox root could not be resolved.
    #[error("sandbox init failed: {0}")]
    Init(String),
}

impl ErrorCode for SandboxError {
    fn code(&self) -> &'static str {
        match self {
            Self::OutsideBoundary { .. } => "SANDBOX_PATH_ESCAPE",
            Self::NotFound { .. } => "SANDBOX_NOT_FOUND",
            Self::Init(_) => "SANDBOX_INIT_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Init(_))
    }
}

/// Read-only sandbox rooted at a cartridge folder.
///
/// # Example
///
/// ```no_run
/// use luag_runtime::sandbox::CartridgeSandbox;
///
/// let sandbox = CartridgeSandbox::new("/tmp/my-game").expect("sandbox init");
/// assert!(sandbox.validate_read("scripts/main.lua").is_ok());
/// assert!(sandbox.validate_read("/etc/passwd").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CartridgeSandbox {
    root: PathBuf,
}

impl CartridgeSandbox {
    /// Creates a sandbox rooted at `root`, canonicalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Init`] if the root cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let canonical = root.as_ref().canonicalize().map_err(|e| {
            SandboxError::Init(format!(
                "cannot canonicalize '{}': {e}",
                root.as_ref().display()
            ))
        })?;
        Ok(Self { root: canonical })
    }

    /// The canonical boundary.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates a path for reading, relative paths resolving against the root.
    ///
    /// # Errors
    ///
    /// - [`SandboxError::NotFound`] if the path does not exist
    /// - [`SandboxError::OutsideBoundary`] if it resolves outside the root
    pub fn validate_read(&self, path: &str) -> Result<PathBuf, SandboxError> {
        self.validate_read_in(&self.root, path)
    }

    /// Validates `path` resolved against `base` (which may itself be
    /// anywhere), accepting it only if it ends up under the root.
    ///
    /// # Errors
    ///
    /// Same as [`validate_read`](Self::validate_read).
    pub fn validate_read_in(&self, base: &Path, path: &str) -> Result<PathBuf, SandboxError> {
        let requested = Path::new(path);
        let absolute = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            base.join(requested)
        };

        let canonical = absolute
            .canonicalize()
            .map_err(|e| SandboxError::NotFound {
                path: path.to_string(),
                source: e,
            })?;

        if !canonical.starts_with(&self.root) {
            return Err(SandboxError::OutsideBoundary {
                path: path.to_string(),
                root: self.root.display().to_string(),
            });
        }

        Ok(canonical)
    }
}
