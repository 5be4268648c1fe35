//! Core semantics of design-file archives.
//!
//! This crate holds the types and pure derivations shared by every archive
//! backend. It performs no IO: documents, export metadata and fill metadata
//! are handed in already fetched, and the functions here reshape them into
//! the responses the client returns.
//!
//! # Key Modules
//!
//! - `node` - the document tree, lookup by id, id and image-ref collection
//! - `file` - file snapshots and the per-node projection
//! - `images` - export and image-fill URL resolution
//! - `envelope` - the status/headers/data wrapper every request returns

pub mod envelope;
pub mod file;
pub mod images;
pub mod node;

#[cfg(any(test, feature = "test"))]
pub mod test;

pub use envelope::{Envelope, Headers};
pub use file::{
    FileNodesParams, FileNodesResponse, FileParams, FileSnapshot, NodeEntry, project_nodes,
};
pub use images::{
    ExportFormat, ExportMeta, FileImageFillsResponse, FileImageParams, FileImageResponse,
    FillMeta, ParseFormatError, resolve_fill_urls, resolve_image_urls,
};
pub use node::{Node, collect_image_refs, collect_node_ids, find_node};
