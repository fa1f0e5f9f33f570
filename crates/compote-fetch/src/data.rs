//! Data layer: component references, fetch options and progress reporting.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Reference chunk size used when streaming to the scratch file.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A component version that the resolver has decided to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRef {
    pub name: String,
    pub version: String,
    /// Integrity marker attached by the resolver.
    pub component_hash: Option<String>,
}

impl ComponentRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            component_hash: None,
        }
    }

    pub fn component_hash(mut self, hash: impl Into<String>) -> Self {
        self.component_hash = Some(hash.into());
        self
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Phases of a fetch operation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Asking the registry for the download URL.
    #[default]
    Resolving,
    /// Streaming the artifact into scratch space.
    Downloading,
    /// Unpacking into the destination directory.
    Extracting,
    /// Terminal state for a successful fetch.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Resolving => write!(f, "Resolving"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Extracting => write!(f, "Extracting"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,
    pub bytes_downloaded: u64,
    /// From `Content-Length`, when the server sent one.
    pub total_bytes: Option<u64>,
}

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Configuration for one pipeline.
///
/// # Examples
///
/// ```
/// use compote_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .timeout(Duration::from_secs(120))
///     .chunk_size(16 * 1024);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Write buffer size for the scratch file.
    pub chunk_size: usize,

    /// Deadline for the whole fetch. Scratch space is still cleaned up when it fires.
    pub timeout: Option<Duration>,

    /// Parent directory for scratch spaces. `None` uses the OS temp dir.
    pub scratch_root: Option<PathBuf>,

    pub on_progress: Option<ProgressCallback>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
            scratch_root: None,
            on_progress: None,
        }
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("chunk_size", &self.chunk_size)
            .field("timeout", &self.timeout)
            .field("scratch_root", &self.scratch_root)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl FetchOptions {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(ref callback) = self.on_progress {
            callback(&progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn defaults_use_reference_chunk_size() {
        let options = FetchOptions::default();
        assert_eq!(options.chunk_size, 65536);
        assert!(options.timeout.is_none());
        assert!(options.scratch_root.is_none());
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        assert_eq!(FetchOptions::default().chunk_size(0).chunk_size, 1);
    }

    #[test]
    fn report_invokes_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options =
            FetchOptions::default().on_progress(move |p| sink.lock().unwrap().push(p.phase));

        options.report(Progress {
            phase: FetchPhase::Extracting,
            bytes_downloaded: 10,
            total_bytes: None,
        });

        assert_eq!(*seen.lock().unwrap(), vec![FetchPhase::Extracting]);
    }

    #[test]
    fn component_ref_display() {
        let component = ComponentRef::new("espressif/foo", "1.2.3").component_hash("abc");
        assert_eq!(component.to_string(), "espressif/foo@1.2.3");
        assert_eq!(component.component_hash.as_deref(), Some("abc"));
    }
}
