use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive format: '{name}'")]
    UnsupportedFormat { name: String },

    #[error("{format} support is not enabled in this build")]
    FormatDisabled { format: &'static str },

    #[error("zip-slip attack detected: entry '{entry}' resolves to '{resolved}'")]
    ZipSlip { entry: PathBuf, resolved: PathBuf },

    #[error("symlink target escapes base directory: '{target}' -> '{resolved}'")]
    SymlinkEscape { target: PathBuf, resolved: PathBuf },

    #[error("entry would be written through extracted symlink '{path}'")]
    SymlinkTraversal { path: PathBuf },

    #[error("entry path contains null byte")]
    InvalidPath,

    #[error("strip_components({count}) removed all path components from '{original}'")]
    NoComponentsRemaining { original: PathBuf, count: usize },

    #[error("failed to open archive '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("archive is corrupted: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
