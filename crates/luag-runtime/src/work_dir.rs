//! Lifecycle-managed cartridge root directory.
//!
//! [`WorkDir`] owns the folder a cartridge is served from and guarantees its
//! existence for the lifetime of the value.
//!
//! | Variant | Created by | Drop behaviour |
//! |---------|-----------|----------------|
//! | [`Persistent`](WorkDir::Persistent) | development folder | directory is **kept** |
//! | [`Temporary`](WorkDir::Temporary) | archive extraction | directory is **deleted** |
//!
//! Replacing a cartridge workspace drops its `WorkDir`, which is what removes
//! the previous extraction directory.

use std::path::{Path, PathBuf};

/// A directory whose existence is guaranteed while this value is alive.
#[derive(Debug)]
pub enum WorkDir {
    /// Existing user folder. Not deleted on drop.
    Persistent(PathBuf),
    /// Fresh extraction directory. Deleted on drop via [`tempfile::TempDir`].
    Temporary(tempfile::TempDir),
}

impl WorkDir {
    /// Wraps a user folder, creating it (and parents) if needed.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if directory creation fails.
    pub fn persistent(path: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self::Persistent(path))
    }

    /// Wraps a user folder that must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::ErrorKind::NotFound`] if `path` is not a directory.
    pub fn existing(path: PathBuf) -> std::io::Result<Self> {
        if !path.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("'{}' is not a directory", path.display()),
            ));
        }
        Ok(Self::Persistent(path))
    }

    /// Creates a fresh directory with a random name under the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if temporary directory creation fails.
    pub fn temporary() -> std::io::Result<Self> {
        let td = tempfile::Builder::new().prefix("luag-cartridge-").tempdir()?;
        Ok(Self::Temporary(td))
    }

    /// Returns the path to the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Persistent(p) => p,
            Self::Temporary(td) => td.path(),
        }
    }

    /// Returns `true` if the directory is removed on drop.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}
