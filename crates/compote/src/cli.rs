use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use url::Url;

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "compote",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fetch components from a registry web service",
    propagate_version = true
)]
pub struct Cli {
    /// Registry web service to talk to.
    #[arg(long, global = true, value_name = "URL", value_parser = parse_service_url)]
    pub service_url: Option<String>,

    /// TOML settings file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download one component version and extract it.
    #[command(alias = "f")]
    Fetch(FetchArgs),
    /// List published versions of a component.
    #[command(alias = "v")]
    Versions(VersionsArgs),
    /// Print the lockfile record for the configured registry.
    Record,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Component name, e.g. `espressif/led_strip`.
    pub name: String,

    /// Exact component version.
    #[arg(id = "component_version", value_name = "VERSION")]
    pub version: String,

    /// Integrity hash recorded for this component version.
    #[arg(long)]
    pub hash: String,

    /// Directory to extract into.
    #[arg(long, value_name = "DIR")]
    pub dest: PathBuf,

    /// Parent directory for scratch files.
    #[arg(long, value_name = "DIR")]
    pub scratch_root: Option<PathBuf>,

    /// Abort the fetch after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct VersionsArgs {
    pub name: String,

    /// Semver requirement to filter by.
    #[arg(default_value = "*")]
    pub spec: String,
}

/// Validate the flag but keep it as typed.
fn parse_service_url(value: &str) -> Result<String, url::ParseError> {
    Url::parse(value)?;
    Ok(value.to_string())
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            service_url: self.service_url.clone(),
            ..Overrides::default()
        };
        if let Command::Fetch(args) = &self.command {
            overrides.scratch_root = args.scratch_root.clone();
            overrides.timeout_secs = args.timeout;
        }
        overrides
    }
}
