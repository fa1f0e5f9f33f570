use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use semver::{Version, VersionReq};
use tracing::debug;
use url::Url;

use crate::data::{ComponentVersions, ResolvedArtifact};
use crate::error::{RegistryError, Result};

/// Registry operations needed by the fetch pipeline.
///
/// # Implementations
///
/// - [`ApiClient`]: HTTP JSON API client
/// - In-memory doubles in tests
pub trait RegistryClient: Send + Sync {
    /// Base URL of the registry service. Used to derive storage identity.
    fn endpoint(&self) -> &Url;

    /// Resolve a concrete `(name, version)` to its download location.
    fn component(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<ResolvedArtifact>> + Send;

    /// All published versions of `name` matching the semver requirement `spec`.
    fn versions(
        &self,
        name: &str,
        spec: &str,
    ) -> impl Future<Output = Result<BTreeSet<Version>>> + Send;
}

/// Connection settings for [`ApiClient`].
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub service_url: Url,
    pub timeout: Duration,
}

impl RegistryConfig {
    pub fn new(service_url: Url) -> Self {
        Self {
            service_url,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the registry HTTP API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RegistryError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self::with_http(http, config.service_url))
    }

    /// Build on top of an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, service_url: Url) -> Self {
        Self {
            http,
            base_url: service_url,
        }
    }

    fn component_url(&self, name: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(&format!("components/{name}"))?)
    }

    async fn component_versions(&self, name: &str) -> Result<ComponentVersions> {
        let url = self.component_url(name)?;
        let endpoint = url.to_string();
        debug!(%endpoint, "querying registry");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }

        if !resp.status().is_success() {
            return Err(RegistryError::Status {
                endpoint,
                status: resp.status().as_u16(),
            });
        }

        resp.json()
            .await
            .map_err(|e| RegistryError::Decode { endpoint, source: e })
    }
}

impl RegistryClient for ApiClient {
    fn endpoint(&self) -> &Url {
        &self.base_url
    }

    async fn component(&self, name: &str, version: &str) -> Result<ResolvedArtifact> {
        let component = self.component_versions(name).await?;
        let entry = component
            .find(version)
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })?;

        Ok(ResolvedArtifact {
            download_url: entry.url.clone(),
            name: component.name.clone(),
            version: entry.version.clone(),
        })
    }

    async fn versions(&self, name: &str, spec: &str) -> Result<BTreeSet<Version>> {
        let req = VersionReq::parse(spec).map_err(|e| RegistryError::InvalidSpec {
            spec: spec.to_string(),
            source: e,
        })?;

        let component = self.component_versions(name).await?;
        Ok(matching_versions(&component, &req))
    }
}

fn matching_versions(component: &ComponentVersions, req: &VersionReq) -> BTreeSet<Version> {
    component
        .versions
        .iter()
        .filter_map(|entry| match Version::parse(&entry.version) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(
                    name = %component.name,
                    version = %entry.version,
                    error = %e,
                    "skipping unparsable version"
                );
                None
            }
        })
        .filter(|v| req.matches(v))
        .collect()
}
