//! The fetch pipeline: resolve, download, sniff, extract, clean up.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compote_archive::{ArtifactExtractor, Detected, sniff};
use compote_registry::{RegistryClient, ResolvedArtifact};
use futures_util::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use crate::core::{disposition_filename, is_success, url_filename};
use crate::data::{ComponentRef, FetchOptions, FetchPhase, Progress};
use crate::effects::http::{DownloadResponse, HttpTransport};
use crate::error::{FetchError, Result};
use crate::identity::{IdentityKey, unique_token};
use crate::scratch::ScratchSpace;

/// Downloads one component version and unpacks it into a caller-owned directory.
///
/// Every call works in its own [`ScratchSpace`], so concurrent calls for
/// different components share nothing mutable. Concurrent calls for the same
/// component are not coordinated.
pub struct FetchPipeline<R, T> {
    registry: R,
    transport: T,
    extractor: Arc<dyn ArtifactExtractor>,
    identity: IdentityKey,
    options: FetchOptions,
}

impl<R: RegistryClient, T: HttpTransport> FetchPipeline<R, T> {
    pub fn new(registry: R, transport: T, extractor: impl ArtifactExtractor + 'static) -> Self {
        let identity = IdentityKey::derive(registry.endpoint());
        Self {
            registry,
            transport,
            extractor: Arc::new(extractor),
            identity,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Scratch file stem for `name@version` from this pipeline's registry.
    pub fn unique_token(&self, name: &str, version: &str) -> String {
        unique_token(name, version, &self.identity)
    }

    /// Fetch `component` and extract it into `destination`.
    ///
    /// Preconditions are checked before any network activity. On success
    /// `destination` is returned. The scratch directory is gone once this
    /// returns, whatever the outcome, and also when the future is dropped.
    #[instrument(skip_all, fields(component = %component))]
    pub async fn fetch(&self, component: &ComponentRef, destination: &Path) -> Result<PathBuf> {
        check_preconditions(component)?;

        match self.options.timeout {
            Some(after) => tokio::time::timeout(after, self.run(component, destination))
                .await
                .map_err(|_| FetchError::TimedOut {
                    name: component.name.clone(),
                    version: component.version.clone(),
                    after,
                })?,
            None => self.run(component, destination).await,
        }
    }

    async fn run(&self, component: &ComponentRef, destination: &Path) -> Result<PathBuf> {
        self.report(FetchPhase::Resolving, 0, None);
        let artifact = self.resolve(component).await?;
        let url = artifact.download_url.as_str();

        let from_url = sniff(url_filename(url)).ok();
        debug!(%url, extension = from_url.map(|d| d.extension), "resolved download url");

        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| network_error(component, e))?;

        let status = response.status();
        if !is_success(status) {
            return Err(FetchError::DownloadFailed {
                name: component.name.clone(),
                version: component.version.clone(),
                status,
            });
        }

        let detected = match from_url {
            Some(detected) => detected,
            None => from_disposition(component, &response)?,
        };

        let scratch = ScratchSpace::new(self.options.scratch_root.as_deref())
            .map_err(|e| storage_error(component, e))?;
        let file = scratch.file(&format!(
            "{}.{}",
            self.unique_token(&component.name, &component.version),
            detected.extension
        ));

        let bytes = self.download(component, response, &file).await?;
        debug!(bytes, file = %file.display(), "download complete");

        self.report(FetchPhase::Extracting, bytes, None);
        self.extract(component, file, destination).await?;

        // removal failures are logged inside `close`
        let _ = scratch.close();

        self.report(FetchPhase::Completed, bytes, None);
        Ok(destination.to_path_buf())
    }

    async fn resolve(&self, component: &ComponentRef) -> Result<ResolvedArtifact> {
        let unresolved = |source| FetchError::UnresolvedArtifact {
            name: component.name.clone(),
            version: component.version.clone(),
            source,
        };

        let artifact = self
            .registry
            .component(&component.name, &component.version)
            .await
            .map_err(|e| unresolved(Some(e)))?;

        if artifact.download_url.trim().is_empty() {
            return Err(unresolved(None));
        }
        Ok(artifact)
    }

    async fn download<S: DownloadResponse>(
        &self,
        component: &ComponentRef,
        response: S,
        file: &Path,
    ) -> Result<u64> {
        let total_bytes = response.content_length();
        let out = tokio::fs::File::create(file)
            .await
            .map_err(|e| storage_error(component, e))?;
        let mut writer = BufWriter::with_capacity(self.options.chunk_size, out);
        let mut stream = response.into_stream();
        let mut bytes_downloaded = 0u64;

        self.report(FetchPhase::Downloading, 0, total_bytes);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| network_error(component, e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| storage_error(component, e))?;
            bytes_downloaded += chunk.len() as u64;
            self.report(FetchPhase::Downloading, bytes_downloaded, total_bytes);
        }

        writer.flush().await.map_err(|e| storage_error(component, e))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(|e| storage_error(component, e))?;

        Ok(bytes_downloaded)
    }

    async fn extract(
        &self,
        component: &ComponentRef,
        file: PathBuf,
        destination: &Path,
    ) -> Result<()> {
        let extractor = Arc::clone(&self.extractor);
        let destination = destination.to_path_buf();

        let report = tokio::task::spawn_blocking(move || extractor.unpack(&file, &destination))
            .await
            .map_err(|e| compote_archive::Error::Io(io::Error::other(e)))
            .and_then(|result| result)
            .map_err(|e| FetchError::ExtractionFailed {
                name: component.name.clone(),
                version: component.version.clone(),
                source: e,
            })?;

        debug!(
            format = %report.format,
            entries = report.entry_count,
            "extracted"
        );
        Ok(())
    }

    fn report(&self, phase: FetchPhase, bytes_downloaded: u64, total_bytes: Option<u64>) {
        self.options.report(Progress {
            phase,
            bytes_downloaded,
            total_bytes,
        });
    }
}

fn check_preconditions(component: &ComponentRef) -> Result<()> {
    if component.name.is_empty() {
        return Err(FetchError::MissingName);
    }

    let has_hash = component
        .component_hash
        .as_deref()
        .is_some_and(|h| !h.trim().is_empty());
    if !has_hash {
        return Err(FetchError::MissingIntegrityInfo {
            name: component.name.clone(),
            version: component.version.clone(),
        });
    }

    if component.version.is_empty() {
        return Err(FetchError::MissingVersion {
            name: component.name.clone(),
            version: component.version.clone(),
        });
    }

    Ok(())
}

/// Last step of the extension chain: the response's `Content-Disposition`.
fn from_disposition<S: DownloadResponse>(
    component: &ComponentRef,
    response: &S,
) -> Result<Detected> {
    let detected = response
        .header("content-disposition")
        .and_then(|value| disposition_filename(&value))
        .and_then(|filename| sniff(&filename).ok());

    debug!(extension = detected.map(|d| d.extension), "consulted content-disposition");

    detected.ok_or_else(|| FetchError::InvalidDownloadResponse {
        name: component.name.clone(),
        version: component.version.clone(),
    })
}

fn network_error<E>(component: &ComponentRef, e: E) -> FetchError
where
    E: std::error::Error + Send + Sync + 'static,
{
    FetchError::Network {
        name: component.name.clone(),
        version: component.version.clone(),
        source: Box::new(e),
    }
}

fn storage_error(component: &ComponentRef, e: io::Error) -> FetchError {
    FetchError::Storage {
        name: component.name.clone(),
        version: component.version.clone(),
        source: e,
    }
}
