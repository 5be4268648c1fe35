use std::io;
use std::path::{Path, PathBuf};

use async_compression::tokio::write::GzipEncoder;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::CanonicalTempDir;

/// How a JSON document is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

/// Gzip-compresses `data` in memory.
pub async fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(data).await?;
    encoder.shutdown().await?;
    Ok(encoder.into_inner())
}

/// An archive root in a temporary directory.
///
/// Paths follow the archive layout: `{file_id}/file.json[.gz]`,
/// `{file_id}/meta.json`, `{file_id}/exports/meta.json` and
/// `{file_id}/images/meta.json`.
pub struct ArchiveFixture {
    dir: CanonicalTempDir,
}

impl ArchiveFixture {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: CanonicalTempDir::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes raw bytes at `rel`, creating parent directories.
    pub async fn write_bytes(&self, rel: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::trace!(path = %path.display(), len = bytes.len(), "wrote fixture");
        Ok(path)
    }

    /// Writes `value` as JSON at `rel`, gzip-compressed when asked to.
    ///
    /// `rel` is used as given; callers choose whether it ends in `.gz`.
    pub async fn write_json(
        &self,
        rel: &str,
        value: &Value,
        compression: Compression,
    ) -> io::Result<PathBuf> {
        let bytes = serde_json::to_vec(value)?;
        let bytes = match compression {
            Compression::None => bytes,
            Compression::Gzip => gzip(&bytes).await?,
        };
        self.write_bytes(rel, &bytes).await
    }

    /// Stores a file document as `file.json` or `file.json.gz`.
    pub async fn write_file(
        &self,
        file_id: &str,
        snapshot: &Value,
        compression: Compression,
    ) -> io::Result<PathBuf> {
        let rel = match compression {
            Compression::None => format!("{file_id}/file.json"),
            Compression::Gzip => format!("{file_id}/file.json.gz"),
        };
        self.write_json(&rel, snapshot, compression).await
    }

    pub async fn write_meta(&self, file_id: &str, meta: &Value) -> io::Result<PathBuf> {
        self.write_json(&format!("{file_id}/meta.json"), meta, Compression::None)
            .await
    }

    pub async fn write_export_meta(&self, file_id: &str, meta: &Value) -> io::Result<PathBuf> {
        self.write_json(
            &format!("{file_id}/exports/meta.json"),
            meta,
            Compression::None,
        )
        .await
    }

    pub async fn write_fill_meta(&self, file_id: &str, meta: &Value) -> io::Result<PathBuf> {
        self.write_json(
            &format!("{file_id}/images/meta.json"),
            meta,
            Compression::None,
        )
        .await
    }
}
