use std::path::PathBuf;

use figma_archive_core::{
    Envelope, ExportMeta, FileImageFillsResponse, FileImageParams, FileImageResponse,
    FileNodesParams, FileNodesResponse, FileParams, FileSnapshot, FillMeta, project_nodes,
    resolve_fill_urls, resolve_image_urls,
};
use serde_json::Value;

use crate::config::{BackendConfig, ClientConfig, RemoteEndpoints};
use crate::error::Result;
use crate::transport::{ArchiveBackend, Backend, RemoteBackend, Transport, http_client};

/// Read-only access to archived design files.
///
/// Documents come from the `files` transport; export and image-fill metadata
/// from the `images` transport, whose base URL also prefixes every derived
/// image URL. The client keeps no state between calls: each call performs a
/// single fetch and reshapes the result locally.
#[derive(Debug, Clone)]
pub struct Client<T = Backend> {
    files: T,
    images: T,
}

impl Client<Backend> {
    /// Builds the backend selected by `config`, after validating it.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        match config.backend() {
            BackendConfig::Archive(paths) => Ok(Self::archive(paths.files, paths.images)),
            BackendConfig::Remote(remote) => Self::remote(&remote),
        }
    }

    pub fn archive(files: impl Into<PathBuf>, images: impl Into<PathBuf>) -> Self {
        Self::new(
            ArchiveBackend::new(files).into(),
            ArchiveBackend::new(images).into(),
        )
    }

    pub fn remote(endpoints: &RemoteEndpoints) -> Result<Self> {
        endpoints.validate()?;
        let http = http_client(endpoints.timeout())?;
        Ok(Self::new(
            RemoteBackend::new(http.clone(), &endpoints.files, endpoints.token.clone())?.into(),
            RemoteBackend::new(http, &endpoints.images, endpoints.token.clone())?.into(),
        ))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(files: T, images: T) -> Self {
        Self { files, images }
    }

    pub fn files(&self) -> &T {
        &self.files
    }

    pub fn images(&self) -> &T {
        &self.images
    }

    /// Catalogue metadata of a file, passed through undecoded.
    pub async fn meta(&self, file_id: &str) -> Result<Envelope<Value>> {
        Ok(self.files.get(&format!("/{file_id}/meta.json")).await?)
    }

    /// The complete file document.
    ///
    /// The parameters have no effect: archived files are always returned whole.
    pub async fn file(
        &self,
        file_id: &str,
        _params: &FileParams,
    ) -> Result<Envelope<FileSnapshot>> {
        let res = self.files.get(&format!("/{file_id}/file.json.gz")).await?;
        Ok(typed(res))
    }

    /// The requested nodes, cut out of the complete file document.
    ///
    /// Ids that do not occur in the document are left out of the result.
    /// `depth` and `geometry` are not applied; see [`project_nodes`].
    pub async fn file_nodes(
        &self,
        file_id: &str,
        params: &FileNodesParams,
    ) -> Result<Envelope<FileNodesResponse>> {
        let res = self.file(file_id, &FileParams::default()).await?;
        Ok(res.map(|snapshot| project_nodes(&snapshot, params)))
    }

    /// Export URLs of the requested nodes.
    pub async fn file_images(
        &self,
        file_id: &str,
        params: &FileImageParams,
    ) -> Result<Envelope<FileImageResponse>> {
        let res = self
            .images
            .get(&format!("/{file_id}/exports/meta.json"))
            .await?;
        let base = self.images.base_url();
        Ok(typed::<ExportMeta>(res).map(|meta| resolve_image_urls(file_id, &meta, params, &base)))
    }

    /// Stored locations of every image fill used in the file.
    ///
    /// A failed metadata request keeps its status, status text and headers
    /// but loses its body, which is not a fills response.
    pub async fn file_image_fills(&self, file_id: &str) -> Result<Envelope<FileImageFillsResponse>> {
        let res = self
            .images
            .get(&format!("/{file_id}/images/meta.json"))
            .await?;
        if !res.is_ok() {
            return Ok(res.without_data());
        }
        let base = self.images.base_url();
        Ok(typed::<FillMeta>(res).map(|meta| resolve_fill_urls(file_id, &meta, &base)))
    }
}

/// Decodes a successful payload; failed envelopes keep their status and lose
/// their body.
fn typed<U: serde::de::DeserializeOwned>(res: Envelope<Value>) -> Envelope<U> {
    if res.is_ok() {
        res.decode()
    } else {
        tracing::debug!(status = res.status, "upstream request failed");
        res.without_data()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use figma_archive_core::test::arbitrary::arb_document;
    use figma_archive_core::{collect_node_ids, find_node};
    use figma_archive_test_utils::{ArchiveFixture, Compression};
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_compression() -> impl Strategy<Value = Compression> {
        prop_oneof![Just(Compression::None), Just(Compression::Gzip)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn archived_documents_resolve_every_node(
            doc in arb_document(4, 24, 4),
            compression in arb_compression(),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let ids = collect_node_ids(&doc, None);
            let snapshot = json!({ "name": "Generated", "version": "1", "document": &doc });

            let res = rt.block_on(async {
                let fixture = ArchiveFixture::new().unwrap();
                fixture.write_file("F", &snapshot, compression).await.unwrap();
                let client = Client::archive(fixture.root(), fixture.root());
                client
                    .file_nodes("F", &FileNodesParams::new(ids.clone()))
                    .await
                    .unwrap()
            });

            prop_assert_eq!(res.status, 200);
            let nodes = res.data.unwrap().nodes;
            prop_assert_eq!(nodes.len(), ids.len());
            for id in &ids {
                prop_assert_eq!(Some(&nodes[id].document), find_node(&doc, id));
            }
        }
    }
}
