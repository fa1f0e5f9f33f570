use std::fmt;
#[cfg(feature = "tar")]
use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(TarCompress),
}

/// Compression codec for tar archives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCompress {
    None,
    Gzip,
    Xz,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::Tar(TarCompress::None) => write!(f, "tar"),
            Self::Tar(TarCompress::Gzip) => write!(f, "tar.gz"),
            Self::Tar(TarCompress::Xz) => write!(f, "tar.xz"),
        }
    }
}

/// Checked in order; compound suffixes come before their `tar` tail.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    ("tar.gz", ArchiveFormat::Tar(TarCompress::Gzip)),
    ("tar.xz", ArchiveFormat::Tar(TarCompress::Xz)),
    ("tgz", ArchiveFormat::Tar(TarCompress::Gzip)),
    ("txz", ArchiveFormat::Tar(TarCompress::Xz)),
    ("tar", ArchiveFormat::Tar(TarCompress::None)),
    ("zip", ArchiveFormat::Zip),
];

/// Outcome of sniffing a filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detected {
    pub format: ArchiveFormat,
    /// The suffix as it matched, without the leading dot (`tgz`, `tar.gz`, ...).
    pub extension: &'static str,
}

/// Infer the archive family from a filename.
///
/// Only the name is inspected; the file does not need to exist. Matching is
/// case-insensitive and requires the suffix to be preceded by a dot.
pub fn sniff(filename: &str) -> Result<Detected> {
    let lowered = filename.trim().to_ascii_lowercase();

    SUFFIXES
        .iter()
        .find(|(suffix, _)| {
            lowered
                .strip_suffix(suffix)
                .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
        })
        .map(|&(extension, format)| Detected { format, extension })
        .ok_or_else(|| Error::UnsupportedFormat {
            name: filename.to_string(),
        })
}

/// Sniff the final component of `path`.
pub fn sniff_path(path: &Path) -> Result<Detected> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    sniff(&name)
}

impl TarCompress {
    /// Create a decoder for this compression codec.
    #[cfg(feature = "tar")]
    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>> {
        match self {
            Self::None => Ok(Decoder::Passthrough(reader)),
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(
                reader,
            )))),
            #[cfg(feature = "xz")]
            Self::Xz => Ok(Decoder::Xz(Box::new(xz2::read::XzDecoder::new(reader)))),
            #[cfg(not(feature = "xz"))]
            Self::Xz => Err(Error::FormatDisabled { format: "tar.xz" }),
        }
    }
}

/// Decoder wrapper for tar decompression.
#[cfg(feature = "tar")]
pub enum Decoder<R> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
    #[cfg(feature = "xz")]
    Xz(Box<xz2::read::XzDecoder<R>>),
}

#[cfg(feature = "tar")]
impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "xz")]
            Self::Xz(d) => d.read(buf),
        }
    }
}
