use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

const PREFIX: &str = "compote-fetch-";

/// Private scratch directory for one fetch.
///
/// The directory and everything in it is removed by [`ScratchSpace::close`]
/// or, on any other exit path (early return, panic, dropped future), by `Drop`.
/// Removal failures are logged and never surfaced in place of another error.
pub struct ScratchSpace {
    dir: Option<TempDir>,
}

impl ScratchSpace {
    /// Create a fresh directory under `root`, or under the OS temp dir.
    pub fn new(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        debug!(path = %dir.path().display(), "allocated scratch space");
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        // only `close` and `drop` take the directory, both consume `self`
        self.dir.as_ref().map_or(Path::new(""), TempDir::path)
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Remove the directory now, reporting whether removal succeeded.
    pub fn close(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => remove(dir),
            None => Ok(()),
        }
    }
}

fn remove(dir: TempDir) -> io::Result<()> {
    let path = dir.path().to_path_buf();
    dir.close().inspect_err(|e| {
        warn!(path = %path.display(), error = %e, "failed to remove scratch space");
    })
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let _ = remove(dir);
        }
    }
}
