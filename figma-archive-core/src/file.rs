//! File snapshots and the `nodes` projection derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node::{Node, find_node};

/// Role reported on derived responses; archives are only ever read.
pub const VIEWER_ROLE: &str = "viewer";

/// A complete archived file as returned by the files endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    pub document: Node,
    #[serde(default)]
    pub components: Map<String, Value>,
    #[serde(default)]
    pub styles: Map<String, Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters of the file request. Accepted for interface parity; archived
/// files are always returned whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileNodesParams {
    /// Node ids to extract.
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
}

impl FileNodesParams {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// One requested node with the component and style tables it uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub document: Node,
    pub components: Map<String, Value>,
    pub styles: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNodesResponse {
    pub name: String,
    pub role: String,
    pub last_modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub version: String,
    pub nodes: BTreeMap<String, NodeEntry>,
}

/// Extracts the requested nodes from a full snapshot.
///
/// Ids that do not resolve are left out of `nodes`; no error is raised for
/// them. Every entry carries empty `components` and `styles` tables: which
/// components and styles a subtree uses is not computed.
///
/// `depth` and `geometry` are ignored on purpose. Archived snapshots are
/// captured at full depth with geometry included, so every subtree is already
/// complete and asking for vector paths cannot add anything. Do not start
/// honouring them here unless a backend begins serving partial trees.
pub fn project_nodes(snapshot: &FileSnapshot, params: &FileNodesParams) -> FileNodesResponse {
    let FileNodesParams {
        ids,
        depth: _,
        geometry: _,
    } = params;

    let nodes = ids
        .iter()
        .filter_map(|id| find_node(&snapshot.document, id))
        .map(|node| {
            (
                node.id.clone(),
                NodeEntry {
                    document: node.clone(),
                    components: Map::new(),
                    styles: Map::new(),
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    tracing::trace!(requested = ids.len(), resolved = nodes.len(), "projected nodes");

    FileNodesResponse {
        name: snapshot.name.clone(),
        role: VIEWER_ROLE.to_string(),
        last_modified: snapshot.last_modified.clone(),
        thumbnail_url: snapshot.thumbnail_url.clone(),
        version: snapshot.version.clone(),
        nodes,
    }
}
