//! Serializable dump of laid-out geometry.

use serde::Serialize;

use crate::geometry::{Point, Rect, Size};
use crate::style::DisplayKind;
use crate::tree::{BoxId, BoxKind, BoxNode, BoxTree, WordKind};

/// Geometry of every attached box, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    /// Boxes in pre-order; a list item's marker follows the item.
    pub boxes: Vec<BoxSnapshot>,
}

/// One box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSnapshot {
    /// Arena id.
    pub id: BoxId,
    /// Parent box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<BoxId>,
    /// Tree depth, root at 0.
    pub depth: usize,
    /// Box kind.
    #[serde(flatten)]
    pub kind: BoxKind,
    /// Tag name, empty for anonymous boxes.
    pub tag: String,
    /// `display`
    pub display: DisplayKind,
    /// Border-box origin.
    pub location: Point,
    /// Border-box size.
    pub size: Size,
    /// Bottom edge.
    pub bottom: f32,
    /// Paint rectangles from line layout.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rectangles: Vec<Rect>,
    /// Words.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<WordSnapshot>,
}

/// One word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordSnapshot {
    /// Content.
    #[serde(flatten)]
    pub kind: WordKind,
    /// Bounds.
    pub bounds: Rect,
}

impl LayoutSnapshot {
    /// Capture `tree`.
    #[must_use]
    pub fn capture(tree: &BoxTree) -> Self {
        let mut boxes = Vec::new();
        let mut stack = vec![(tree.root(), 0)];
        while let Some((id, depth)) = stack.pop() {
            let node = &tree[id];
            boxes.push(BoxSnapshot {
                id,
                parent: node.parent(),
                depth,
                kind: node.kind.clone(),
                tag: node.tag_name().to_string(),
                display: node.display(),
                location: node.location,
                size: node.size,
                bottom: node.actual_bottom(),
                rectangles: node.rectangles.clone(),
                words: word_snapshots(node),
            });
            if let Some(marker) = node.list_marker {
                boxes.push(Self::marker(tree, marker, depth + 1));
            }
            stack.extend(tree.children(id).iter().rev().map(|&c| (c, depth + 1)));
        }
        Self { boxes }
    }

    fn marker(tree: &BoxTree, id: BoxId, depth: usize) -> BoxSnapshot {
        let node = &tree[id];
        BoxSnapshot {
            id,
            parent: None,
            depth,
            kind: node.kind.clone(),
            tag: String::new(),
            display: node.display(),
            location: node.location,
            size: node.size,
            bottom: node.actual_bottom(),
            rectangles: Vec::new(),
            words: word_snapshots(node),
        }
    }

    /// Snapshot of box `id`.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&BoxSnapshot> {
        self.boxes.iter().find(|b| b.id == id)
    }

    /// Boxes with tag `tag`, in document order.
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a BoxSnapshot> + 'a {
        self.boxes.iter().filter(move |b| b.tag == tag)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn word_snapshots(node: &BoxNode) -> Vec<WordSnapshot> {
    node.words
        .iter()
        .map(|w| WordSnapshot {
            kind: w.kind.clone(),
            bounds: w.bounds(),
        })
        .collect()
}

impl BoxSnapshot {
    /// Border-box bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::from_point_size(self.location, self.size)
    }
}
