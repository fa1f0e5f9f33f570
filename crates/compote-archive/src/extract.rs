//! Archive extraction for downloaded component artifacts.
//!
//! # Platform Behavior
//!
//! **Unix**: file mode bits stored in the archive are applied to extracted
//! files, and symlinks whose target stays inside the destination are created.
//!
//! **Windows (non-Unix)**: mode bits are ignored and symlink entries are
//! skipped with a warning.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::format::{self, ArchiveFormat};
use crate::sanitize::{
    ensure_no_symlink_components, sanitize_entry_path, sanitize_symlink_target,
};

/// Unpacks a downloaded file into a directory.
///
/// Implementations either fully extract or return an error; callers treat
/// any error as fatal for the artifact.
pub trait ArtifactExtractor: Send + Sync {
    fn unpack(&self, source: &Path, destination: &Path) -> Result<ArchiveReport>;
}

/// Extraction options.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtractOptions {
    pub strip_components: usize,
}

impl ExtractOptions {
    pub fn strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }
}

/// Summary of one extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveReport {
    pub format: ArchiveFormat,
    pub entry_count: usize,
    pub total_bytes: u64,
}

/// Default extractor: sniffs the source filename and dispatches on the format.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArchiveExtractor {
    options: ExtractOptions,
}

impl ArchiveExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

impl ArtifactExtractor for ArchiveExtractor {
    fn unpack(&self, source: &Path, destination: &Path) -> Result<ArchiveReport> {
        let detected = format::sniff_path(source)?;
        let file = File::open(source).map_err(|e| Error::Open {
            path: source.to_path_buf(),
            source: e,
        })?;
        ensure_directory(destination)?;

        debug!(source = %source.display(), format = %detected.format, "unpacking artifact");

        let report = match detected.format {
            ArchiveFormat::Zip => extract_zip(file, destination, &self.options)?,
            ArchiveFormat::Tar(codec) => extract_tar(file, codec, destination, &self.options)?,
        };

        debug!(
            entries = report.entry_count,
            bytes = report.total_bytes,
            "artifact unpacked"
        );
        Ok(report)
    }
}

#[cfg(feature = "tar")]
fn extract_tar(
    file: File,
    codec: format::TarCompress,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ArchiveReport> {
    let decoder = codec.decoder(BufReader::new(file))?;
    let mut archive = tar::Archive::new(decoder);

    let mut entry_count = 0;
    let mut total_bytes = 0u64;

    for entry in archive
        .entries()
        .map_err(|e| Error::Corrupted(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| Error::Corrupted(e.to_string()))?;
        let raw_path = entry.path().map_err(|_| Error::InvalidPath)?.into_owned();
        let header = entry.header();
        let entry_type = header.entry_type();
        let mode = header.mode().ok();

        // pax/gnu metadata records carry no payload of their own
        if entry_type.is_pax_global_extensions()
            || entry_type.is_pax_local_extensions()
            || entry_type.is_gnu_longname()
            || entry_type.is_gnu_longlink()
        {
            continue;
        }

        let target = resolve_entry(&raw_path, destination, options)?;

        if entry_type.is_dir() {
            ensure_directory(&target)?;
        } else if entry_type.is_symlink() {
            let link_target = entry
                .link_name()
                .map_err(|_| Error::InvalidPath)?
                .ok_or(Error::InvalidPath)?
                .into_owned();
            write_symlink(&link_target, &target, destination)?;
        } else if entry_type.is_file() {
            total_bytes += write_file(&mut entry, &target, mode)?;
        } else {
            debug!(path = %raw_path.display(), "skipping unsupported tar entry");
            continue;
        }

        entry_count += 1;
    }

    Ok(ArchiveReport {
        format: ArchiveFormat::Tar(codec),
        entry_count,
        total_bytes,
    })
}

#[cfg(not(feature = "tar"))]
fn extract_tar(
    _file: File,
    _codec: format::TarCompress,
    _destination: &Path,
    _options: &ExtractOptions,
) -> Result<ArchiveReport> {
    Err(Error::FormatDisabled { format: "tar" })
}

#[cfg(feature = "zip")]
fn extract_zip(file: File, destination: &Path, options: &ExtractOptions) -> Result<ArchiveReport> {
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| Error::Corrupted(e.to_string()))?;

    let mut entry_count = 0;
    let mut total_bytes = 0u64;

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| Error::Corrupted(e.to_string()))?;

        let raw_path = PathBuf::from(file.name());
        let target = resolve_entry(&raw_path, destination, options)?;
        let mode = file.unix_mode();

        if file.is_dir() {
            ensure_directory(&target)?;
        } else if mode.is_some_and(is_symlink_mode) {
            let link_target = io::read_to_string(&mut file).map_err(|e| Error::ExtractionFailed {
                path: target.clone(),
                source: e,
            })?;
            write_symlink(Path::new(&link_target), &target, destination)?;
        } else {
            total_bytes += write_file(&mut file, &target, mode)?;
        }

        entry_count += 1;
    }

    Ok(ArchiveReport {
        format: ArchiveFormat::Zip,
        entry_count,
        total_bytes,
    })
}

#[cfg(not(feature = "zip"))]
fn extract_zip(
    _file: File,
    _destination: &Path,
    _options: &ExtractOptions,
) -> Result<ArchiveReport> {
    Err(Error::FormatDisabled { format: "zip" })
}

/// Sanitized on-disk location for an archive entry.
fn resolve_entry(
    raw_path: &Path,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<PathBuf> {
    let target = sanitize_entry_path(raw_path, destination, options.strip_components)?;
    ensure_no_symlink_components(&target, destination)?;
    Ok(target)
}

#[cfg(feature = "zip")]
fn is_symlink_mode(mode: u32) -> bool {
    const S_IFMT: u32 = 0o170000;
    const S_IFLNK: u32 = 0o120000;
    mode & S_IFMT == S_IFLNK
}

fn write_file(reader: &mut impl Read, target: &Path, mode: Option<u32>) -> Result<u64> {
    if let Some(parent) = target.parent() {
        ensure_directory(parent)?;
    }

    let mut file = File::create(target).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })?;
    let written = io::copy(reader, &mut file).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })?;

    apply_mode(target, mode)?;
    Ok(written)
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    // owner read/write is always kept
    if let Some(mode) = mode {
        let perms = std::fs::Permissions::from_mode((mode & 0o777) | 0o600);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &Path, link: &Path, base: &Path) -> Result<()> {
    sanitize_symlink_target(target, link, base)?;
    if let Some(parent) = link.parent() {
        ensure_directory(parent)?;
    }
    std::os::unix::fs::symlink(target, link).map_err(|e| Error::ExtractionFailed {
        path: link.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn write_symlink(target: &Path, link: &Path, base: &Path) -> Result<()> {
    sanitize_symlink_target(target, link, base)?;
    tracing::warn!(
        link = %link.display(),
        "symlink entries are not supported on this platform, skipping"
    );
    Ok(())
}
