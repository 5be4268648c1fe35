//! Backends able to answer `get(path)` for an archive layout.
//!
//! - `ArchiveBackend`: files under a local directory, plain or gzipped
//! - `RemoteBackend`: objects in an HTTP bucket
//!
//! [`Backend`] selects one of the two at construction time.

mod archive;
mod codec;
mod remote;

use std::future::Future;

use figma_archive_core::Envelope;

pub use archive::ArchiveBackend;
pub use remote::{RemoteBackend, TOKEN_HEADER, http_client};

use crate::error::TransportError;

/// A source of archive payloads.
///
/// Missing and malformed resources are reported through the envelope's
/// status, never as `Err`. Only faults of the transport itself, such as a
/// refused connection, are errors.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str) -> impl Future<Output = Result<Envelope, TransportError>> + Send;

    /// Location derived URLs are built on, without a trailing slash.
    fn base_url(&self) -> String;
}

#[derive(Debug, Clone)]
pub enum Backend {
    Archive(ArchiveBackend),
    Remote(RemoteBackend),
}

impl Transport for Backend {
    async fn get(&self, path: &str) -> Result<Envelope, TransportError> {
        match self {
            Backend::Archive(backend) => backend.get(path).await,
            Backend::Remote(backend) => backend.get(path).await,
        }
    }

    fn base_url(&self) -> String {
        match self {
            Backend::Archive(backend) => backend.base_url(),
            Backend::Remote(backend) => backend.base_url(),
        }
    }
}

impl From<ArchiveBackend> for Backend {
    fn from(backend: ArchiveBackend) -> Self {
        Backend::Archive(backend)
    }
}

impl From<RemoteBackend> for Backend {
    fn from(backend: RemoteBackend) -> Self {
        Backend::Remote(backend)
    }
}
