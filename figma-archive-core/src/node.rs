//! The document tree and lookups over it.
//!
//! Only the structural part of a node is modelled: its `id`, `type`, `name`
//! and `children`. Everything else the design tool emits is kept verbatim in
//! [`Node::properties`] so a node survives a decode/encode cycle unchanged.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Paint lists that may carry an `imageRef`.
static PAINT_PROPERTIES: [&str; 3] = ["fills", "strokes", "background"];

/// A single node of a design document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: None,
            children: None,
            properties: Map::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    /// Child nodes in document order; empty for leaf kinds.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Image references used by this node's own paints.
    ///
    /// Does not descend into children, see [`collect_image_refs`].
    pub fn image_refs(&self) -> impl Iterator<Item = &str> {
        PAINT_PROPERTIES
            .iter()
            .filter_map(|key| self.properties.get(*key)?.as_array())
            .flatten()
            .filter_map(|paint| paint.get("imageRef")?.as_str())
    }
}

/// Finds the node with the given id, searching depth-first in pre-order.
///
/// Ids are unique within a document. Should a document violate that, the
/// first match in document order wins.
pub fn find_node<'a>(node: &'a Node, id: &str) -> Option<&'a Node> {
    if node.id == id {
        return Some(node);
    }
    node.children().iter().find_map(|child| find_node(child, id))
}

/// Lists the ids of every node below `document`, in pre-order.
///
/// The root's direct children are at depth 0. When `max_depth` is set, nodes
/// deeper than it are skipped along with their subtrees.
pub fn collect_node_ids(document: &Node, max_depth: Option<usize>) -> Vec<String> {
    fn walk(node: &Node, depth: usize, max_depth: Option<usize>, out: &mut Vec<String>) {
        if max_depth.is_some_and(|max| depth > max) {
            return;
        }
        out.push(node.id.clone());
        for child in node.children() {
            walk(child, depth + 1, max_depth, out);
        }
    }

    let mut ids = Vec::new();
    for child in document.children() {
        walk(child, 0, max_depth, &mut ids);
    }
    ids
}

/// Every image reference used anywhere in the tree rooted at `node`.
pub fn collect_image_refs(node: &Node) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        refs.extend(node.image_refs().map(str::to_owned));
        stack.extend(node.children());
    }
    refs
}

#[cfg(test)]
mod unittests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn sample() -> Node {
        serde_json::from_value(json!({
            "id": "0:0",
            "type": "DOCUMENT",
            "name": "Document",
            "children": [
                {
                    "id": "0:1",
                    "type": "CANVAS",
                    "children": [
                        {
                            "id": "1:2",
                            "type": "FRAME",
                            "fills": [{ "type": "IMAGE", "imageRef": "abc" }],
                            "children": [
                                { "id": "1:3", "type": "TEXT", "characters": "hi" }
                            ]
                        },
                        {
                            "id": "1:4",
                            "type": "RECTANGLE",
                            "fills": [{ "type": "SOLID" }],
                            "strokes": [{ "type": "IMAGE", "imageRef": "def" }]
                        }
                    ]
                },
                { "id": "0:2", "type": "CANVAS", "background": [{ "imageRef": "abc" }] }
            ]
        }))
        .unwrap()
    }

    #[rstest]
    #[case::root("0:0", "DOCUMENT")]
    #[case::page("0:1", "CANVAS")]
    #[case::nested("1:3", "TEXT")]
    #[case::last_sibling("0:2", "CANVAS")]
    fn finds_present_ids(#[case] id: &str, #[case] kind: &str) {
        let doc = sample();
        let node = find_node(&doc, id).unwrap();
        assert_eq!(node.id, id);
        assert_eq!(node.kind, kind);
    }

    #[rstest]
    #[case("9:9")]
    #[case("")]
    #[case("1:")]
    fn missing_ids_are_not_found(#[case] id: &str) {
        assert!(find_node(&sample(), id).is_none());
    }

    #[test]
    fn duplicate_ids_resolve_to_first_in_document_order() {
        let mut first = Node::new("dup", "FRAME");
        first.name = Some("first".into());
        let mut second = Node::new("dup", "FRAME");
        second.name = Some("second".into());
        let doc = Node::new("0:0", "DOCUMENT").with_children(vec![
            Node::new("0:1", "CANVAS").with_children(vec![first]),
            second,
        ]);

        let found = find_node(&doc, "dup").unwrap();
        assert_eq!(found.name.as_deref(), Some("first"));
    }

    #[test]
    fn unknown_properties_survive_roundtrip() {
        let doc = sample();
        let text = find_node(&doc, "1:3").unwrap();
        assert_eq!(text.properties["characters"], "hi");

        let encoded = serde_json::to_value(&doc).unwrap();
        let decoded: Node = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, doc);
    }

    #[rstest]
    #[case::unbounded(None, &["0:1", "1:2", "1:3", "1:4", "0:2"])]
    #[case::pages_only(Some(0), &["0:1", "0:2"])]
    #[case::one_level(Some(1), &["0:1", "1:2", "1:4", "0:2"])]
    fn collects_ids_below_root(#[case] depth: Option<usize>, #[case] expected: &[&str]) {
        assert_eq!(collect_node_ids(&sample(), depth), expected);
    }

    #[test]
    fn collects_image_refs_from_all_paint_lists() {
        let refs = collect_image_refs(&sample());
        assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec!["abc", "def"]);
    }

    #[test]
    fn own_image_refs_ignore_children() {
        let doc = sample();
        assert_eq!(doc.image_refs().count(), 0);
        let frame = find_node(&doc, "1:2").unwrap();
        assert_eq!(frame.image_refs().collect::<Vec<_>>(), vec!["abc"]);
    }
}
