//! Zip archive codec
//!
//! Archives store paths relative to the world directory with `/` separators.
//! Unix permission bits travel with each entry so executables stay executable
//! across a round trip.

use std::fs::{self, File};
use std::io::{self, BufReader, Seek, Write};
use std::path::{Component, Path};

use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{BsmError, BsmResult};

/// What a pack or unpack touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: usize,
    pub directories: usize,
    /// Uncompressed payload
    pub bytes: u64,
}

/// Write the contents of `source` as a zip stream into `writer`
pub fn write_archive<W: Write + Seek>(source: &Path, writer: W) -> BsmResult<(W, ArchiveStats)> {
    let mut zip = ZipWriter::new(writer);
    let mut stats = ArchiveStats::default();

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            BsmError::Archive(format!(
                "{} is outside {}",
                entry.path().display(),
                source.display()
            ))
        })?;
        let name = entry_name(relative)?;
        let metadata = entry.metadata().map_err(|e| {
            BsmError::Archive(format!("Failed to stat {}: {}", entry.path().display(), e))
        })?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(permission_bits(&metadata))
            .large_file(metadata.len() >= u64::from(u32::MAX));

        let file_type = entry.file_type();
        if file_type.is_dir() {
            zip.add_directory(name, options)?;
            stats.directories += 1;
        } else if file_type.is_file() {
            zip.start_file(name, options)?;
            let mut input =
                File::open(entry.path()).map_err(|e| BsmError::io("read", entry.path(), e))?;
            stats.bytes += io::copy(&mut input, &mut zip)
                .map_err(|e| BsmError::io("archive", entry.path(), e))?;
            stats.files += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    let writer = zip.finish()?;
    Ok((writer, stats))
}

/// Pack `source` into a temporary archive inside `dest_dir`
///
/// The caller decides the final name by persisting the returned file, so a
/// failed pack never leaves a half-written archive under a backup name.
pub fn pack_directory(source: &Path, dest_dir: &Path) -> BsmResult<(NamedTempFile, ArchiveStats)> {
    let temp = tempfile::Builder::new()
        .prefix(".pending-")
        .suffix(".part")
        .tempfile_in(dest_dir)
        .map_err(|e| {
            BsmError::Io(format!(
                "Failed to create archive in {}: {}",
                dest_dir.display(),
                e
            ))
        })?;

    let (mut temp, stats) = write_archive(source, temp)?;
    temp.flush()
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| BsmError::io("flush archive", temp.path(), e))?;

    tracing::debug!(
        source = %source.display(),
        files = stats.files,
        directories = stats.directories,
        bytes = stats.bytes,
        "archive packed"
    );
    Ok((temp, stats))
}

/// Unpack `archive` into `dest`
///
/// When every entry sits under a single top-level directory named
/// `strip_root`, that directory is dropped so archives made from the parent
/// of a world land in the same place as archives made from the world itself.
/// Entries that would escape `dest` are rejected.
pub fn extract_archive(archive: &Path, dest: &Path, strip_root: Option<&str>) -> BsmResult<ArchiveStats> {
    let file = File::open(archive).map_err(|e| {
        BsmError::Archive(format!("Failed to open archive {}: {}", archive.display(), e))
    })?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| {
        BsmError::Archive(format!("Failed to read archive {}: {}", archive.display(), e))
    })?;

    let strip = strip_root.filter(|root| wrapped_in(&zip, root));
    fs::create_dir_all(dest).map_err(|e| BsmError::io("create", dest, e))?;

    let mut stats = ArchiveStats::default();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| {
            BsmError::Archive(format!("Failed to read entry {} of {}: {}", index, archive.display(), e))
        })?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(BsmError::Archive(format!(
                "Unsafe entry '{}' in {}",
                entry.name(),
                archive.display()
            )));
        };
        let relative = match strip {
            Some(root) => relative
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or(relative),
            None => relative,
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| BsmError::io("create", &out_path, e))?;
            stats.directories += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BsmError::io("create", parent, e))?;
        }
        let mut output =
            File::create(&out_path).map_err(|e| BsmError::io("create", &out_path, e))?;
        stats.bytes += io::copy(&mut entry, &mut output)
            .map_err(|e| BsmError::io("write", &out_path, e))?;
        stats.files += 1;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| BsmError::io("set permissions on", &out_path, e))?;
        }
    }

    Ok(stats)
}

fn wrapped_in<R: io::Read + Seek>(zip: &ZipArchive<R>, root: &str) -> bool {
    let nested = format!("{}/", root);
    zip.len() > 0
        && zip
            .file_names()
            .all(|name| name == root || name.starts_with(&nested))
}

fn entry_name(relative: &Path) -> BsmResult<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                BsmError::Archive(format!("Non UTF-8 path: {}", relative.display()))
            })?),
            _ => {
                return Err(BsmError::Archive(format!(
                    "Unexpected path component in {}",
                    relative.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else {
        0o644
    }
}
