//! Test utilities for figma-archive.
//!
//! Provides on-disk archive fixtures laid out the way the archive backend
//! expects them, and a small HTTP server that serves canned responses so the
//! remote backend can be exercised without network access.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub mod fixture;
pub mod stub;

pub use fixture::{ArchiveFixture, Compression, gzip};
pub use stub::{RecordedRequest, StubResponse, StubServer};

/// A wrapper around TempDir that provides a canonicalized path.
/// This resolves symlinks like /var -> /private/var on macOS, so paths
/// reported back by the backends compare equal to the ones tests build.
pub struct CanonicalTempDir {
    _inner: TempDir,
    path: PathBuf,
}

impl CanonicalTempDir {
    /// Create a new temporary directory with a canonicalized path.
    pub fn new() -> std::io::Result<Self> {
        let inner = TempDir::new()?;
        let path = inner.path().canonicalize()?;
        Ok(Self {
            _inner: inner,
            path,
        })
    }

    /// Get the canonicalized path to the temporary directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
