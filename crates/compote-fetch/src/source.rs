//! The web-service component source.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use compote_archive::ArtifactExtractor;
use compote_registry::RegistryClient;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{ComponentRef, FetchOptions};
use crate::effects::{FetchPipeline, HttpTransport};
use crate::error::{FetchError, Result};
use crate::identity::IdentityKey;

/// Source type tag written to lockfiles.
pub const SOURCE_TYPE: &str = "service";

/// Lockfile entry describing where a component came from.
///
/// Field order is the serialization order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub service_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Components hosted by a registry web service.
pub struct WebServiceSource<R, T> {
    pipeline: FetchPipeline<R, T>,
    /// Service URL as configured, written to lockfiles verbatim.
    configured_url: String,
}

impl<R: RegistryClient, T: HttpTransport> WebServiceSource<R, T> {
    pub fn new(registry: R, transport: T, extractor: impl ArtifactExtractor + 'static) -> Self {
        let configured_url = registry.endpoint().to_string();
        Self {
            pipeline: FetchPipeline::new(registry, transport, extractor),
            configured_url,
        }
    }

    /// Record `url` in lockfiles instead of the registry's normalized endpoint.
    pub fn with_configured_url(mut self, url: impl Into<String>) -> Self {
        self.configured_url = url.into();
        self
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.pipeline = self.pipeline.with_options(options);
        self
    }

    pub fn name(&self) -> &'static str {
        SOURCE_TYPE
    }

    /// Manifest keys this source understands.
    pub fn known_keys(&self) -> &'static [&'static str] {
        &["service_url", "version"]
    }

    pub fn component_hash_required(&self) -> bool {
        true
    }

    pub fn downloadable(&self) -> bool {
        true
    }

    pub fn service_url(&self) -> &url::Url {
        self.pipeline.registry().endpoint()
    }

    pub fn hash_key(&self) -> &IdentityKey {
        self.pipeline.identity()
    }

    pub fn unique_path(&self, name: &str, version: &str) -> String {
        self.pipeline.unique_token(name, version)
    }

    pub fn pipeline(&self) -> &FetchPipeline<R, T> {
        &self.pipeline
    }

    pub async fn download(&self, component: &ComponentRef, destination: &Path) -> Result<PathBuf> {
        self.pipeline.fetch(component, destination).await
    }

    /// Published versions of `name` matching `spec` (`"*"` for all).
    pub async fn list_versions(&self, name: &str, spec: &str) -> Result<BTreeSet<Version>> {
        let versions = self.pipeline.registry().versions(name, spec).await?;
        debug!(name, spec, count = versions.len(), "listed versions");

        if versions.is_empty() {
            return Err(FetchError::NoVersions {
                name: name.to_string(),
                spec: spec.to_string(),
            });
        }
        Ok(versions)
    }

    pub fn record(&self) -> SourceRecord {
        SourceRecord {
            service_url: self.configured_url.clone(),
            kind: SOURCE_TYPE.to_string(),
        }
    }
}
