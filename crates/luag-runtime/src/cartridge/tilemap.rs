//! Tile map binary format.
//!
//! ```text
//! offset  size            field
//! 0       4  (u32 BE)     width
//! 4       4  (u32 BE)     height
//! 8       width*height    tile ids, row-major, one byte each
//! ```
//!
//! Any short read is a format error. Trailing bytes are ignored.

use super::CartridgeError;
use std::io::Read;
use std::path::Path;

/// File name of the tile map inside a cartridge root.
pub const MAP_FILE: &str = "map";

/// Decoded tile map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<u8>,
}

impl TileMap {
    /// Creates a map filled with tile `0`.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        let len = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            tiles: vec![0; len],
        }
    }

    /// Decodes a map from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::InvalidTileMap`] on a short read or a size
    /// that does not fit in memory.
    pub fn read_from(mut reader: impl Read) -> Result<Self, CartridgeError> {
        let width = read_u32_be(&mut reader)?;
        let height = read_u32_be(&mut reader)?;

        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| CartridgeError::InvalidTileMap(format!("{width}x{height} overflows")))?;

        let mut tiles = Vec::new();
        reader
            .take(len as u64)
            .read_to_end(&mut tiles)
            .map_err(|e| CartridgeError::InvalidTileMap(e.to_string()))?;
        if tiles.len() < len {
            return Err(CartridgeError::InvalidTileMap(format!(
                "expected {len} tiles, found {}",
                tiles.len()
            )));
        }

        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Loads `root/map` if present.
    ///
    /// # Errors
    ///
    /// - [`CartridgeError::InvalidTileMap`] on malformed content
    /// - [`CartridgeError::Io`] if the file exists but cannot be opened
    pub fn load(root: &Path) -> Result<Option<Self>, CartridgeError> {
        let path = root.join(MAP_FILE);
        match std::fs::File::open(&path) {
            Ok(file) => Self::read_from(std::io::BufReader::new(file)).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CartridgeError::io(path, e)),
        }
    }

    /// Encodes the map into its binary form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.tiles.len());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.tiles);
        out
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tile id at `(x, y)`, `None` when out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    /// Sets the tile at `(x, y)`. Returns `false` when out of bounds.
    pub fn set(&mut self, x: u32, y: u32, tile: u8) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(x as usize + y as usize * self.width as usize)
    }
}

fn read_u32_be(reader: &mut impl Read) -> Result<u32, CartridgeError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| CartridgeError::InvalidTileMap(format!("short header: {e}")))?;
    Ok(u32::from_be_bytes(buf))
}
