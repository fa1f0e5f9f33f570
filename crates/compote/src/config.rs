//! Layered settings: defaults, TOML file, environment, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use compote_fetch::FetchOptions;
use compote_registry::RegistryConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable naming the registry used when no flag is given.
pub const SERVICE_URL_ENV: &str = "DEFAULT_COMPONENT_SERVICE_URL";

pub const DEFAULT_SERVICE_URL: &str = "https://pacman.dev.brno.espressif.com/api/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Kept as written so lockfile records match the configuration.
    pub service_url: String,

    /// Parent of per-fetch scratch directories. OS temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_root: Option<PathBuf>,

    /// Deadline for a whole fetch, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Defaults, then `config_file`, then the environment.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::default("service_url", DEFAULT_SERVICE_URL));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(
            Env::raw()
                .filter_map(|key| {
                    key.as_str()
                        .eq_ignore_ascii_case(SERVICE_URL_ENV)
                        .then(|| "service_url".into())
                }),
        )
    }

    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self, figment::Error> {
        Self::figment(config_file)
            .merge(Serialized::defaults(overrides))
            .extract()
    }

    pub fn registry_config(&self) -> Result<RegistryConfig, url::ParseError> {
        Url::parse(&self.service_url).map(RegistryConfig::new)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let mut options = FetchOptions::default();
        if let Some(root) = &self.scratch_root {
            options = options.scratch_root(root);
        }
        if let Some(secs) = self.timeout_secs {
            options = options.timeout(Duration::from_secs(secs));
        }
        options
    }
}
