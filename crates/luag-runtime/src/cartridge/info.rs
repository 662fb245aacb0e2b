//! `cartridge-info` metadata file.
//!
//! A single line declaring the scripting API version the cartridge targets:
//!
//! ```text
//! library-version = 1.3
//! ```
//!
//! Whitespace around `=` is optional. Each version part is read as a run of
//! leading digits, so `1.3b` reads as `1.3`, while `1 . 3` is rejected.

use super::CartridgeError;
use std::fmt;
use std::path::Path;

/// File name of the metadata file inside a cartridge root.
pub const INFO_FILE: &str = "cartridge-info";

/// Version assumed when a cartridge ships no metadata file.
pub const DEFAULT_VERSION: Version = Version::new(1, 3);

const VERSION_KEY: &str = "library-version";

/// Scripting API version as `(major, minor)`.
///
/// A native extension `E` can serve a cartridge `C` when
/// `E.major == C.major && E.minor >= C.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns `true` if an extension at `self` can serve `requested`.
    #[must_use]
    pub fn serves(&self, requested: Version) -> bool {
        self.major == requested.major && self.minor >= requested.minor
    }

    /// Parses `"<major>.<minor>"`. Surrounding whitespace is allowed, inner
    /// whitespace is not.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (major, minor) = text.trim().split_once('.')?;
        let (major, "") = leading_number(major)? else {
            return None;
        };
        let (minor, "") = leading_number(minor)? else {
            return None;
        };
        Some(Self::new(major, minor))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parses the content of a `cartridge-info` file.
///
/// # Errors
///
/// Returns [`CartridgeError::InvalidInfo`] if the `library-version` entry is
/// missing or malformed.
pub fn parse_info(content: &str) -> Result<Version, CartridgeError> {
    let invalid = || CartridgeError::InvalidInfo(content.trim().to_string());

    let (key, value) = content.trim_start().split_once('=').ok_or_else(invalid)?;
    if key.trim() != VERSION_KEY {
        return Err(invalid());
    }

    let (major, rest) = leading_number(value.trim_start()).ok_or_else(invalid)?;
    let rest = rest.strip_prefix('.').ok_or_else(invalid)?;
    let (minor, _) = leading_number(rest.trim_start()).ok_or_else(invalid)?;
    Ok(Version::new(major, minor))
}

/// Splits a leading run of ASCII digits off `text`.
fn leading_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

/// Reads the declared version from `root/cartridge-info`.
///
/// A missing file yields `default` (normally [`DEFAULT_VERSION`]); a present
/// but malformed file is an error.
///
/// # Errors
///
/// - [`CartridgeError::InvalidInfo`] on malformed content
/// - [`CartridgeError::Io`] if the file exists but cannot be read
pub fn read_info(root: &Path, default: Version) -> Result<Version, CartridgeError> {
    let path = root.join(INFO_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_info(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), %default, "No cartridge-info, using default version");
            Ok(default)
        }
        Err(e) => Err(CartridgeError::io(path, e)),
    }
}
