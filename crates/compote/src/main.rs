mod cli;
mod config;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use compote_archive::ArchiveExtractor;
use compote_fetch::{ComponentRef, FetchPhase, ReqwestTransport, WebServiceSource};
use compote_registry::ApiClient;
use tracing::level_filters::LevelFilter;
use tracing::{info, trace};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Command, FetchArgs, VersionsArgs};
use crate::config::Settings;

type Source = WebServiceSource<ApiClient, ReqwestTransport>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if let Some(path) = &cli.config {
        ensure!(path.is_file(), "config file {} does not exist", path.display());
    }
    let settings = Settings::load(cli.config.as_deref(), cli.overrides())
        .context("failed to load settings")?;
    tracing::debug!(?settings, "loaded settings");

    let source = build_source(&settings)?;

    match cli.command {
        Command::Fetch(args) => fetch(&source, args).await,
        Command::Versions(args) => versions(&source, args).await,
        Command::Record => record(&source),
    }
}

/// `-v` raises the default level; `RUST_LOG` takes precedence.
fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env()
        .context("invalid RUST_LOG")?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .without_time();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
    Ok(())
}

fn build_source(settings: &Settings) -> Result<Source> {
    let config = settings
        .registry_config()
        .with_context(|| format!("invalid service url '{}'", settings.service_url))?;
    let registry = ApiClient::new(config).context("failed to build registry client")?;

    let options = settings.fetch_options().on_progress(|progress| match progress.phase {
        FetchPhase::Downloading => trace!(
            bytes = progress.bytes_downloaded,
            total = progress.total_bytes,
            "downloading"
        ),
        phase => info!(%phase, bytes = progress.bytes_downloaded),
    });

    Ok(WebServiceSource::new(registry, ReqwestTransport::default(), ArchiveExtractor::default())
        .with_options(options)
        .with_configured_url(&settings.service_url))
}

async fn fetch(source: &Source, args: FetchArgs) -> Result<()> {
    let component = ComponentRef::new(&args.name, &args.version).component_hash(&args.hash);

    let dest = match source.download(&component, &args.dest).await {
        Ok(dest) => dest,
        Err(e) if e.is_transient() => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to fetch {component} (temporary, retrying may help)")));
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("failed to fetch {component}"))),
    };

    println!("{}", dest.display());
    Ok(())
}

async fn versions(source: &Source, args: VersionsArgs) -> Result<()> {
    let versions = source
        .list_versions(&args.name, &args.spec)
        .await
        .with_context(|| format!("failed to list versions of {}", args.name))?;

    for version in versions {
        println!("{version}");
    }
    Ok(())
}

fn record(source: &Source) -> Result<()> {
    let record = serde_json::to_string_pretty(&source.record())?;
    println!("{record}");
    Ok(())
}
