//! Registry payloads and resolution results.

use serde::{Deserialize, Serialize};

/// A downloadable artifact as resolved by the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub download_url: String,
    pub name: String,
    pub version: String,
}

/// `GET {service_url}/components/{name}` response body.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentVersions {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub component_hash: Option<String>,
}

impl ComponentVersions {
    pub fn find(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }
}
