//! Read-only client for design-file archives.
//!
//! The same five calls (`meta`, `file`, `file_nodes`, `file_images`,
//! `file_image_fills`) work against an archive on local disk and against the
//! remote buckets holding the same layout. Which one is used is decided once,
//! when the client is built.
//!
//! # Example
//!
//! ```ignore
//! use figma_archive_client::{Client, config};
//! use figma_archive_core::FileNodesParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_config(&config::load()?)?;
//!
//!     let res = client
//!         .file_nodes("767122733527420957", &FileNodesParams::new(["0:594"]))
//!         .await?;
//!     if let Some(nodes) = res.data {
//!         println!("{}", nodes.nodes["0:594"].document.kind);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::Client;
pub use config::{ArchivePaths, BackendConfig, ClientConfig, RemoteEndpoints};
pub use error::{ClientError, ConfigError, Result, TransportError};
pub use transport::{ArchiveBackend, Backend, RemoteBackend, TOKEN_HEADER, Transport};
