//! Payload decoding shared by both backends.

use std::io;
use std::path::Path;

use async_compression::tokio::bufread::GzipDecoder;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub(crate) fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

pub(crate) async fn gunzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzipDecoder::new(bytes);
    decoder.multiple_members(true);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).await?;
    Ok(out)
}

/// Parses a JSON document, decompressing it first when `compressed`.
pub(crate) async fn parse_json(bytes: &[u8], compressed: bool) -> io::Result<Value> {
    let value = if compressed {
        from_slice_unbounded(&gunzip(bytes).await?)?
    } else {
        from_slice_unbounded(bytes)?
    };
    Ok(value)
}

/// Node trees nest two JSON levels per node (object plus `children` array),
/// so serde_json's default limit of 128 would reject files deeper than 63
/// nodes.
fn from_slice_unbounded(bytes: &[u8]) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Whether `path` names a gzip-compressed file.
pub(crate) fn has_gzip_suffix(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Content type of an archived file, judged by its extension.
///
/// A trailing `.gz` is looked through: `file.json.gz` is JSON delivered with
/// gzip encoding. Unknown extensions are reported as JSON.
pub(crate) fn content_type_for(path: &Path) -> mime::Mime {
    let path = if has_gzip_suffix(path) {
        path.file_stem().map(Path::new).unwrap_or(path)
    } else {
        path
    };
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_JSON,
    }
}
