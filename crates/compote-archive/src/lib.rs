//! Filename-based archive sniffing and sanitized extraction.
//!
//! # Architecture
//!
//! - `format.rs` - Format sniffing from filenames, tar codecs
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `extract.rs` - The [`ArtifactExtractor`] seam and its default implementation

pub use error::{Error, Result};
pub use extract::{ArchiveExtractor, ArchiveReport, ArtifactExtractor, ExtractOptions};
pub use format::{ArchiveFormat, Detected, TarCompress, sniff, sniff_path};

mod error;
mod extract;
mod format;
mod sanitize;
