//! Component registry client.
//!
//! Resolves `(name, version)` pairs to download URLs and lists published
//! versions. The [`RegistryClient`] trait is the seam the fetch pipeline
//! depends on; [`ApiClient`] talks to the registry over HTTP.
//!
//! The service URL is always passed in explicitly through [`RegistryConfig`].

mod client;
mod data;
mod error;

pub use client::{ApiClient, RegistryClient, RegistryConfig};
pub use data::{ComponentVersions, ResolvedArtifact, VersionEntry};
pub use error::{RegistryError, Result};
