use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("component \"{name}\" was not found in the registry")]
    NotFound { name: String },

    #[error("version {version} of \"{name}\" was not found in the registry")]
    VersionNotFound { name: String, version: String },

    #[error("invalid version spec \"{spec}\": {source}")]
    InvalidSpec {
        spec: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid registry url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("registry returned HTTP {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot decode registry response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
