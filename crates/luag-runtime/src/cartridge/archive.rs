//! `.luag` cartridge archives (gzip-compressed tar).
//!
//! Extraction guards against:
//! - Path traversal (`../` components)
//! - Absolute paths
//! - Links, devices and other non-regular entry types
//! - Excessive entry count or extracted size

use super::CartridgeError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

/// Maximum number of entries allowed in a cartridge archive.
const MAX_ENTRY_COUNT: usize = 10_000;

/// Maximum total extracted size (256 MB).
const MAX_EXTRACTED_SIZE: u64 = 256_000_000;

/// Packs the content of `src_dir` into a gzip-compressed tar at `dest`.
///
/// Entries are stored relative to `src_dir`, so unpacking reproduces the
/// folder layout at the destination root.
///
/// # Errors
///
/// Returns [`CartridgeError::NotFound`] if `src_dir` is not a directory and
/// [`CartridgeError::Archive`] if writing fails or the folder contains a
/// symbolic link, which [`unpack`] would refuse. Nothing is written at
/// `dest` in the symlink case.
pub fn pack(src_dir: &Path, dest: &Path) -> Result<(), CartridgeError> {
    if !src_dir.is_dir() {
        return Err(CartridgeError::NotFound(src_dir.to_path_buf()));
    }
    if let Some(link) = find_symlink(src_dir)? {
        let rel = link.strip_prefix(src_dir).unwrap_or(&link);
        tracing::warn!(link = %link.display(), "Refusing to pack symbolic link");
        return Err(CartridgeError::archive(
            dest,
            format!("symbolic link '{}' cannot be packed", rel.display()),
        ));
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CartridgeError::io(parent, e))?;
    }

    let file = File::create(dest).map_err(|e| CartridgeError::io(dest, e))?;
    let enc = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(enc);
    tar.follow_symlinks(false);

    tar.append_dir_all("", src_dir)
        .map_err(|e| CartridgeError::archive(dest, format!("failed to append files: {e}")))?;

    let enc = tar
        .into_inner()
        .map_err(|e| CartridgeError::archive(dest, format!("failed to finish tar: {e}")))?;
    enc.finish()
        .map_err(|e| CartridgeError::archive(dest, format!("failed to finish gzip: {e}")))?;

    tracing::info!(src = %src_dir.display(), dest = %dest.display(), "Cartridge packed");
    Ok(())
}

/// Extracts the archive at `src` into `dest_dir`.
///
/// # Errors
///
/// Returns [`CartridgeError::Archive`] on decompression failures, unsafe
/// entries, or limits exceeded. Entries extracted before the failure stay
/// on disk; callers extract into a directory they own.
pub fn unpack(src: &Path, dest_dir: &Path) -> Result<(), CartridgeError> {
    let file = File::open(src).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CartridgeError::NotFound(src.to_path_buf()),
        _ => CartridgeError::io(src, e),
    })?;
    std::fs::create_dir_all(dest_dir).map_err(|e| CartridgeError::io(dest_dir, e))?;
    let dest = dest_dir
        .canonicalize()
        .map_err(|e| CartridgeError::io(dest_dir, e))?;

    let mut archive = Archive::new(GzDecoder::new(std::io::BufReader::new(file)));
    let entries = archive
        .entries()
        .map_err(|e| CartridgeError::archive(src, format!("failed to read entries: {e}")))?;

    let mut entry_count = 0usize;
    let mut total_size: u64 = 0;

    for entry_result in entries {
        let mut entry = entry_result
            .map_err(|e| CartridgeError::archive(src, format!("failed to read entry: {e}")))?;

        entry_count = entry_count.saturating_add(1);
        if entry_count > MAX_ENTRY_COUNT {
            return Err(CartridgeError::archive(
                src,
                format!("more than {MAX_ENTRY_COUNT} entries"),
            ));
        }

        let entry_path = entry
            .path()
            .map_err(|e| CartridgeError::archive(src, format!("bad entry path: {e}")))?
            .into_owned();

        let entry_type = entry.header().entry_type();
        if !is_safe_entry_type(entry_type) {
            return Err(CartridgeError::archive(
                src,
                format!(
                    "unsafe archive entry type {entry_type:?} at '{}'",
                    entry_path.display()
                ),
            ));
        }

        total_size = total_size.saturating_add(entry.header().size().unwrap_or(0));
        if total_size > MAX_EXTRACTED_SIZE {
            return Err(CartridgeError::archive(
                src,
                format!("extracted size exceeds {MAX_EXTRACTED_SIZE} bytes"),
            ));
        }

        if !is_confined_entry_path(&entry_path) {
            return Err(CartridgeError::archive(
                src,
                format!("path traversal in entry '{}'", entry_path.display()),
            ));
        }

        // Metadata headers carry no file content of their own.
        if !matches!(
            entry_type,
            tar::EntryType::Regular | tar::EntryType::Directory
        ) {
            continue;
        }

        let target = dest.join(&entry_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CartridgeError::io(parent, e))?;
        }
        entry.unpack(&target).map_err(|e| {
            CartridgeError::archive(
                src,
                format!("failed to unpack '{}': {e}", entry_path.display()),
            )
        })?;
    }

    tracing::debug!(
        src = %src.display(),
        dest = %dest.display(),
        entries = entry_count,
        "Cartridge extracted"
    );
    Ok(())
}

/// First symbolic link found under `dir`, if any.
fn find_symlink(dir: &Path) -> Result<Option<PathBuf>, CartridgeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CartridgeError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CartridgeError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CartridgeError::io(&path, e))?;
        if file_type.is_symlink() {
            return Ok(Some(path));
        }
        if file_type.is_dir() {
            if let Some(link) = find_symlink(&path)? {
                return Ok(Some(link));
            }
        }
    }
    Ok(None)
}

fn is_safe_entry_type(entry_type: tar::EntryType) -> bool {
    matches!(
        entry_type,
        tar::EntryType::Regular
            | tar::EntryType::Directory
            | tar::EntryType::GNULongName
            | tar::EntryType::XHeader
            | tar::EntryType::XGlobalHeader
    )
}

fn is_confined_entry_path(path: &Path) -> bool {
    !path.is_absolute()
        && !path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::Prefix(_) | Component::RootDir
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn gzip(tar_data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(tar_data).expect("should gzip");
        encoder.finish().expect("should finish gzip")
    }

    /// Raw tar entry with an arbitrary name and type flag, bypassing the
    /// tar crate's own path validation.
    fn raw_entry_archive(name: &[u8], type_flag: u8, data: &[u8]) -> Vec<u8> {
        let mut header = [0u8; 512];
        header[..name.len()].copy_from_slice(name);
        header[100..108].copy_from_slice(b"0000644\0");
        let size = format!("{:011o}\0", data.len());
        header[124..136].copy_from_slice(size.as_bytes());
        header[136..148].copy_from_slice(b"00000000000\0");
        header[156] = type_flag;
        header[148..156].copy_from_slice(b"        ");
        let cksum: u32 = header.iter().map(|&b| u32::from(b)).sum();
        header[148..156].copy_from_slice(format!("{cksum:06o}\0 ").as_bytes());

        let mut tar_data = header.to_vec();
        tar_data.extend_from_slice(data);
        let pad = (512 - data.len() % 512) % 512;
        tar_data.extend(std::iter::repeat_n(0u8, pad + 1024));
        gzip(&tar_data)
    }

    #[test]
    fn pack_then_unpack_reproduces_layout() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let dev = tmp.path().join("dev");
        fs::create_dir_all(dev.join("scripts")).expect("should create scripts");
        fs::create_dir_all(dev.join("sfx")).expect("should create sfx");
        fs::write(dev.join("scripts/main.lua"), "function init() end").expect("write main");
        fs::write(dev.join("cartridge-info"), "library-version = 1.3").expect("write info");
        fs::write(dev.join("sfx/beep.wav"), [1u8, 2, 3]).expect("write sfx");

        let packed = tmp.path().join("out/game.luag");
        pack(&dev, &packed).expect("should pack");
        assert!(packed.is_file());

        let out = tmp.path().join("extracted");
        unpack(&packed, &out).expect("should unpack");
        assert_eq!(
            fs::read_to_string(out.join("scripts/main.lua")).expect("read main"),
            "function init() end"
        );
        assert_eq!(fs::read(out.join("sfx/beep.wav")).expect("read sfx"), [1, 2, 3]);
        assert!(out.join("cartridge-info").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn pack_refuses_symlinks_it_could_not_unpack() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let dev = tmp.path().join("dev");
        fs::create_dir_all(dev.join("scripts")).expect("should create scripts");
        fs::write(dev.join("scripts/main.lua"), "function init() end").expect("write main");
        std::os::unix::fs::symlink("main.lua", dev.join("scripts/alias.lua"))
            .expect("should create symlink");

        let packed = tmp.path().join("game.luag");
        let err = pack(&dev, &packed).expect_err("symlink should fail");
        assert!(matches!(err, CartridgeError::Archive { .. }), "got: {err}");
        assert!(err.to_string().contains("alias.lua"), "got: {err}");
        assert!(!packed.exists());

        // Without the link the same folder packs and unpacks.
        fs::remove_file(dev.join("scripts/alias.lua")).expect("remove link");
        pack(&dev, &packed).expect("should pack");
        unpack(&packed, &tmp.path().join("out")).expect("should unpack");
        assert!(tmp.path().join("out/scripts/main.lua").is_file());
    }

    #[test]
    fn pack_missing_folder_fails() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let err = pack(&tmp.path().join("missing"), &tmp.path().join("x.luag"))
            .expect_err("missing folder should fail");
        assert!(matches!(err, CartridgeError::NotFound(_)));
    }

    #[test]
    fn unpack_rejects_traversal() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let archive = tmp.path().join("evil.luag");
        fs::write(&archive, raw_entry_archive(b"../escape.lua", b'0', b"x"))
            .expect("should write archive");

        let out = tmp.path().join("out");
        let err = unpack(&archive, &out).expect_err("traversal should fail");
        assert!(err.to_string().contains("path traversal"), "got: {err}");
        assert!(!tmp.path().join("escape.lua").exists());
    }

    #[test]
    fn unpack_rejects_absolute_path() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let archive = tmp.path().join("abs.luag");
        fs::write(&archive, raw_entry_archive(b"/tmp/luag-abs.lua", b'0', b"x"))
            .expect("should write archive");

        let err = unpack(&archive, &tmp.path().join("out")).expect_err("absolute should fail");
        assert!(err.to_string().contains("path traversal"), "got: {err}");
    }

    #[test]
    fn unpack_rejects_symlink_entry() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let archive = tmp.path().join("link.luag");
        fs::write(&archive, raw_entry_archive(b"scripts/evil", b'2', b""))
            .expect("should write archive");

        let err = unpack(&archive, &tmp.path().join("out")).expect_err("symlink should fail");
        assert!(err.to_string().contains("unsafe archive entry type"), "got: {err}");
    }

    #[test]
    fn unpack_garbage_is_archive_error() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let archive = tmp.path().join("garbage.luag");
        fs::write(&archive, b"definitely not gzip").expect("should write archive");

        let err = unpack(&archive, &tmp.path().join("out")).expect_err("garbage should fail");
        assert!(matches!(err, CartridgeError::Archive { .. }), "got: {err}");
    }

    #[test]
    fn unpack_missing_archive_is_not_found() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let err = unpack(&tmp.path().join("nope.luag"), &tmp.path().join("out"))
            .expect_err("missing should fail");
        assert!(matches!(err, CartridgeError::NotFound(_)));
    }
}
