//! Archive backend: serves requests from a directory tree on local disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use figma_archive_core::envelope::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use figma_archive_core::{Envelope, Headers};
use tracing::{debug, trace};

use super::Transport;
use super::codec::{content_type_for, has_gzip_suffix, parse_json};
use crate::error::TransportError;

/// Reads JSON payloads from an archive root.
///
/// Every failure, be it a missing file, a permission problem or content that
/// is not JSON, is answered with [`Envelope::not_found`]. The backend never
/// returns an error.
#[derive(Debug, Clone)]
pub struct ArchiveBackend {
    root: PathBuf,
}

impl ArchiveBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the archive root.
    ///
    /// Leading slashes are ignored. Paths that would leave the root are
    /// refused.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut full = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => full.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(full)
    }

    /// Looks the path up, trying its compressed or uncompressed sibling when
    /// it is absent.
    pub async fn fetch(&self, path: &str) -> Envelope {
        let Some(primary) = self.resolve(path) else {
            debug!(path, "refusing path outside archive root");
            return Envelope::not_found();
        };

        for candidate in [primary.clone(), sibling(&primary)] {
            match read(&candidate).await {
                Ok(envelope) => {
                    debug!(path = %candidate.display(), status = envelope.status, "archive hit");
                    return envelope;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    trace!(path = %candidate.display(), "archive miss");
                }
                Err(err) => {
                    debug!(path = %candidate.display(), "unreadable archive entry: {err}");
                    return Envelope::not_found();
                }
            }
        }
        Envelope::not_found()
    }
}

impl Transport for ArchiveBackend {
    async fn get(&self, path: &str) -> Result<Envelope, TransportError> {
        Ok(self.fetch(path).await)
    }

    fn base_url(&self) -> String {
        self.root.display().to_string()
    }
}

/// `x.json.gz` for `x.json` and the other way round.
fn sibling(path: &Path) -> PathBuf {
    if has_gzip_suffix(path) {
        path.with_extension("")
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    }
}

async fn read(path: &Path) -> io::Result<Envelope> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }
    let bytes = tokio::fs::read(path).await?;
    let compressed = has_gzip_suffix(path);
    let data = parse_json(&bytes, compressed).await?;

    let mut headers = Headers::new();
    headers.insert(CONTENT_TYPE, content_type_for(path).to_string());
    headers.insert(CONTENT_LENGTH, metadata.len().to_string());
    headers.insert(
        CONTENT_ENCODING,
        if compressed { "gzip" } else { "identity" },
    );
    Ok(Envelope::ok(data, headers))
}
