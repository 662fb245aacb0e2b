//! Cartridge workspace.
//!
//! A cartridge is a game package: an entry script plus optional assets and a
//! declared scripting API version. It is served either from a development
//! folder or from a `.luag` archive extracted into a fresh temporary
//! directory.
//!
//! ```text
//! <root>/
//!   cartridge-info      library-version = 1.3   (optional)
//!   scripts/main.lua    entry script            (required)
//!   atlas.png           sprite atlas            (optional)
//!   map                 tile map, see tilemap   (optional)
//!   sfx/                sound bank              (optional)
//! ```
//!
//! The workspace owns its [`WorkDir`]. Dropping the workspace removes an
//! extraction directory, so opening the next cartridge cleans up the
//! previous one.

pub mod archive;
mod info;
mod tilemap;

pub use info::{parse_info, read_info, Version, DEFAULT_VERSION, INFO_FILE};
pub use tilemap::{TileMap, MAP_FILE};

use crate::error::ErrorCode;
use crate::work_dir::WorkDir;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Folder holding the cartridge scripts.
pub const SCRIPTS_DIR: &str = "scripts";
/// Entry script, relative to [`SCRIPTS_DIR`].
pub const MAIN_SCRIPT: &str = "main.lua";
/// Sprite atlas file name.
pub const ATLAS_FILE: &str = "atlas.png";
/// Sound bank folder name.
pub const SFX_DIR: &str = "sfx";
/// Archive file extension.
pub const ARCHIVE_EXT: &str = "luag";

/// Cartridge-level errors.
#[derive(Debug, Error)]
pub enum CartridgeError {
    /// `cartridge-info` is present but malformed.
    #[error("'cartridge-info' is invalid: {0:?}")]
    InvalidInfo(String),

    /// Tile map file is truncated or oversized.
    #[error("invalid tile map: {0}")]
    InvalidTileMap(String),

    /// Cartridge folder or archive does not exist.
    #[error("cartridge not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Archive could not be read, written, or contained an unsafe entry.
    #[error("archive error ({path}): {message}")]
    Archive { path: String, message: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CartridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }
}

impl ErrorCode for CartridgeError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidInfo(_) => "CARTRIDGE_INVALID_INFO",
            Self::InvalidTileMap(_) => "CARTRIDGE_INVALID_TILE_MAP",
            Self::NotFound(_) => "CARTRIDGE_NOT_FOUND",
            Self::Archive { .. } => "CARTRIDGE_ARCHIVE",
            Self::Io { .. } => "CARTRIDGE_IO",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Every cartridge failure leaves the console usable; the user can
        // fix the package and run again.
        true
    }
}

/// Where a cartridge is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartridgeSource {
    /// Development folder, used in place.
    Folder(PathBuf),
    /// `.luag` archive, extracted into a temporary directory on open.
    Archive(PathBuf),
}

impl CartridgeSource {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Folder(p) | Self::Archive(p) => p,
        }
    }
}

/// An opened cartridge.
#[derive(Debug)]
pub struct CartridgeWorkspace {
    root: WorkDir,
    canonical_root: PathBuf,
    version: Version,
    atlas: Option<PathBuf>,
    tile_map: Option<TileMap>,
    sound_bank: BTreeMap<String, PathBuf>,
}

impl CartridgeWorkspace {
    /// Opens a cartridge, extracting it first if it is an archive.
    ///
    /// `default_version` is used when the cartridge has no `cartridge-info`.
    ///
    /// # Errors
    ///
    /// - [`CartridgeError::NotFound`] if the source does not exist
    /// - [`CartridgeError::Archive`] if extraction fails
    /// - [`CartridgeError::InvalidInfo`] on malformed metadata
    /// - [`CartridgeError::InvalidTileMap`] on a malformed map
    pub fn open(
        source: &CartridgeSource,
        default_version: Version,
    ) -> Result<Self, CartridgeError> {
        let root = match source {
            CartridgeSource::Folder(path) => WorkDir::existing(path.clone())
                .map_err(|_| CartridgeError::NotFound(path.clone()))?,
            CartridgeSource::Archive(path) => {
                if !path.is_file() {
                    return Err(CartridgeError::NotFound(path.clone()));
                }
                let tmp = WorkDir::temporary().map_err(|e| CartridgeError::io(path, e))?;
                archive::unpack(path, tmp.path())?;
                tmp
            }
        };
        Self::from_work_dir(root, default_version)
    }

    /// Reads the cartridge content of an already prepared directory.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open), minus extraction.
    pub fn from_work_dir(root: WorkDir, default_version: Version) -> Result<Self, CartridgeError> {
        let canonical_root = root
            .path()
            .canonicalize()
            .map_err(|e| CartridgeError::io(root.path(), e))?;

        let version = read_info(&canonical_root, default_version)?;
        let tile_map = TileMap::load(&canonical_root)?;

        let atlas = Some(canonical_root.join(ATLAS_FILE)).filter(|p| p.is_file());
        let sound_bank = scan_sound_bank(&canonical_root.join(SFX_DIR))?;

        tracing::info!(
            root = %canonical_root.display(),
            %version,
            temporary = root.is_temporary(),
            sounds = sound_bank.len(),
            "Cartridge opened"
        );

        Ok(Self {
            root,
            canonical_root,
            version,
            atlas,
            tile_map,
            sound_bank,
        })
    }

    /// Canonical cartridge root; the confinement boundary for scripts.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.canonical_root
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// `root/scripts`.
    #[must_use]
    pub fn scripts_dir(&self) -> PathBuf {
        self.canonical_root.join(SCRIPTS_DIR)
    }

    /// `root/scripts/main.lua`.
    #[must_use]
    pub fn main_script(&self) -> PathBuf {
        self.scripts_dir().join(MAIN_SCRIPT)
    }

    #[must_use]
    pub fn atlas(&self) -> Option<&Path> {
        self.atlas.as_deref()
    }

    #[must_use]
    pub fn tile_map(&self) -> Option<&TileMap> {
        self.tile_map.as_ref()
    }

    /// Sound name (file stem) to file path, sorted by name.
    #[must_use]
    pub fn sound_bank(&self) -> &BTreeMap<String, PathBuf> {
        &self.sound_bank
    }

    /// Returns `true` if the root is deleted when the workspace drops.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.root.is_temporary()
    }
}

fn scan_sound_bank(dir: &Path) -> Result<BTreeMap<String, PathBuf>, CartridgeError> {
    let mut bank = BTreeMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(bank),
        Err(e) => return Err(CartridgeError::io(dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| CartridgeError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            bank.insert(stem.to_string(), path);
        }
    }
    Ok(bank)
}
