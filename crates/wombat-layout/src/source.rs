//! JSON markup source.
//!
//! HTML and CSS text are parsed upstream; this module consumes the result
//! as a JSON tree of elements and text and builds a [`BoxTree`] from it.
//!
//! ```json
//! {"tag": "p", "style": {"color": "red"}, "children": [{"text": "hello"}]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::tree::{BoxId, BoxTree, HtmlTag};

/// One node of a markup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentNode {
    /// A text run.
    Text {
        /// Raw text; whitespace is handled per `white-space`.
        text: String,
    },
    /// An element.
    Element(ElementNode),
}

/// An element with its attributes, declared style and children.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementNode {
    /// Lowercase tag name.
    pub tag: String,
    /// HTML attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Declared CSS properties, applied after the `style` attribute.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    /// Child nodes in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build and normalize a box tree with this node as the document
    /// element, under the tree's initial containing block.
    pub fn build(&self) -> Result<BoxTree, SourceError> {
        let DocumentNode::Element(element) = self else {
            return Err(SourceError::TextRoot);
        };
        let mut tree = BoxTree::new();
        let root = tree.root();
        let _ = build_element(&mut tree, root, element)?;
        tree.normalize(root)?;
        tracing::debug!(boxes = tree.len(), "box tree built");
        Ok(tree)
    }
}

/// Parse JSON and build its box tree.
pub fn tree_from_json(json: &str) -> Result<BoxTree, SourceError> {
    DocumentNode::from_json(json)?.build()
}

fn build_element(tree: &mut BoxTree, parent: BoxId, element: &ElementNode) -> Result<BoxId, SourceError> {
    let mut tag = HtmlTag::new(&element.tag.to_ascii_lowercase());
    tag.attributes.extend(
        element
            .attributes
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone())),
    );
    let id = tree.create_box(tag, parent)?;

    // Declared properties go in before children are created so they
    // inherit them.
    for (name, value) in &element.style {
        let _ = tree[id].style.set_property(name, value);
    }

    for child in &element.children {
        match child {
            DocumentNode::Text { text } => {
                let _ = tree.create_text(id, text)?;
            }
            DocumentNode::Element(child) => {
                let _ = build_element(tree, id, child)?;
            }
        }
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_root_is_rejected() {
        let node = DocumentNode::from_json(r#"{"text": "loose"}"#).expect("valid json");
        assert!(matches!(node.build(), Err(SourceError::TextRoot)));
    }

    #[test]
    fn test_element_round_trips_through_json() {
        let json = r#"{"tag":"p","attributes":{"align":"center"},"children":[{"text":"hi"}]}"#;
        let node = DocumentNode::from_json(json).expect("valid json");
        let DocumentNode::Element(element) = &node else {
            panic!("expected element");
        };
        assert_eq!(element.tag, "p");
        assert_eq!(element.children, vec![DocumentNode::Text { text: "hi".into() }]);
        assert_eq!(serde_json::to_string(&node).expect("serializes"), json);
    }
}
