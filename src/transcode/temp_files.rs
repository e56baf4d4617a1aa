//! Scoped temporary files for transcoding jobs.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

/// Upper bound on name collisions before giving up.
const MAX_ACQUIRE_ATTEMPTS: usize = 8;

/// Allocates uniquely-named paths inside a temp directory.
#[derive(Debug)]
pub struct TempFiles {
    dir: PathBuf,
    acquired: AtomicUsize,
}

impl TempFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            acquired: AtomicUsize::new(0),
        }
    }

    /// Number of paths handed out since creation.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Creates the temp directory if missing.
    pub async fn init(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Reserves a fresh path `<dir>/<prefix>_<uuid>.<extension>`.
    ///
    /// The file itself is not created. It is removed when the returned
    /// [`TempResource`] is released or dropped.
    pub fn acquire(&self, prefix: &str, extension: &str) -> io::Result<TempResource> {
        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let name = format!("{}_{}.{}", prefix, Uuid::new_v4().simple(), extension);
            let path = self.dir.join(name);
            if !path.exists() {
                self.acquired.fetch_add(1, Ordering::Relaxed);
                debug!("Acquired temp path {:?}", path);
                return Ok(TempResource {
                    path,
                    released: false,
                });
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Could not allocate a unique temp path in {:?}", self.dir),
        ))
    }
}

/// A temp path owned by a single job. Deleted on release or drop.
#[derive(Debug)]
pub struct TempResource {
    path: PathBuf,
    released: bool,
}

impl TempResource {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file if present. Safe to call more than once and safe to
    /// call when the file was never written.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Released temp file {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temp file {:?}: {}", self.path, e),
        }
    }
}

impl Drop for TempResource {
    fn drop(&mut self) {
        self.release();
    }
}
