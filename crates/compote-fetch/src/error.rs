//! Error types for compote-fetch.

use std::io;
use std::time::Duration;

use compote_registry::RegistryError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("component name is required")]
    MissingName,

    #[error("component hash is required for {name}@{version} from the web service")]
    MissingIntegrityInfo { name: String, version: String },

    #[error("version should be provided for \"{name}\" (got \"{version}\")")]
    MissingVersion { name: String, version: String },

    #[error("cannot resolve download url for version {version} of \"{name}\"")]
    UnresolvedArtifact {
        name: String,
        version: String,
        #[source]
        source: Option<RegistryError>,
    },

    #[error("registry returned an invalid download response for {name}@{version}")]
    InvalidDownloadResponse { name: String, version: String },

    #[error("cannot download component {name}@{version}. Server returned HTTP code {status}")]
    DownloadFailed {
        name: String,
        version: String,
        status: u16,
    },

    #[error("network error while downloading {name}@{version}: {source}")]
    Network {
        name: String,
        version: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot write download of {name}@{version} to scratch space: {source}")]
    Storage {
        name: String,
        version: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot extract {name}@{version}: {source}")]
    ExtractionFailed {
        name: String,
        version: String,
        #[source]
        source: compote_archive::Error,
    },

    #[error("fetching {name}@{version} timed out after {after:?}")]
    TimedOut {
        name: String,
        version: String,
        after: Duration,
    },

    #[error("cannot get versions of \"{name}\" matching \"{spec}\"")]
    NoVersions { name: String, spec: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl FetchError {
    /// Whether re-invoking the fetch may succeed.
    ///
    /// Nothing is retried internally; this only informs a caller's own policy.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::TimedOut { .. } => true,
            Self::DownloadFailed { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Registry(RegistryError::Http { .. }) => true,
            Self::Registry(RegistryError::Status { status, .. }) => {
                *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn download_failed(status: u16) -> FetchError {
        FetchError::DownloadFailed {
            name: "foo".into(),
            version: "1.0.0".into(),
            status,
        }
    }

    #[test]
    fn messages_carry_name_version_and_status() {
        let msg = download_failed(404).to_string();
        assert!(msg.contains("foo@1.0.0"));
        assert!(msg.contains("404"));

        let msg = FetchError::UnresolvedArtifact {
            name: "foo".into(),
            version: "1.0.0".into(),
            source: None,
        }
        .to_string();
        assert!(msg.contains("\"foo\"") && msg.contains("1.0.0"));
    }

    #[test]
    fn precondition_messages_carry_name_and_version() {
        let msg = FetchError::MissingIntegrityInfo {
            name: "foo".into(),
            version: "1.2.3".into(),
        }
        .to_string();
        assert!(msg.contains("foo@1.2.3"));
    }

    #[test]
    fn transient_classification() {
        assert!(download_failed(503).is_transient());
        assert!(download_failed(429).is_transient());
        assert!(!download_failed(404).is_transient());
        assert!(
            !FetchError::MissingVersion {
                name: "foo".into(),
                version: String::new(),
            }
            .is_transient()
        );
        assert!(
            FetchError::TimedOut {
                name: "foo".into(),
                version: "1.0.0".into(),
                after: Duration::from_secs(1),
            }
            .is_transient()
        );
    }
}
