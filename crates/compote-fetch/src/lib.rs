//! Fetch components from a registry web service into a local directory.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Component references, options, progress
//! - [`core`] - Pure transformations (URL and header filename parsing)
//! - [`effects`] - Registry, transport and extraction behind trait seams
//!
//! # Key Features
//!
//! - **Deterministic identity**: scratch names derive from name, version and registry endpoint
//! - **Guaranteed cleanup**: every fetch owns a [`ScratchSpace`] removed on all exit paths
//! - **Filename sniffing**: archive format from the URL, then `Content-Disposition`
//! - **Mechanism-only**: no retries, no caching; [`FetchError::is_transient`] informs the caller

mod core;
mod data;
mod effects;
mod error;
mod identity;
mod scratch;
mod source;

pub use core::{disposition_filename, is_success, url_filename};
pub use data::{
    ComponentRef, DEFAULT_CHUNK_SIZE, FetchOptions, FetchPhase, Progress, ProgressCallback,
};
pub use effects::{BoxStream, DownloadResponse, FetchPipeline, HttpTransport};
pub use error::{BoxError, FetchError, Result};
pub use identity::{IdentityKey, unique_token};
pub use scratch::ScratchSpace;
pub use source::{SOURCE_TYPE, SourceRecord, WebServiceSource};

#[cfg(feature = "reqwest")]
pub use effects::{ReqwestResponse, ReqwestTransport};
