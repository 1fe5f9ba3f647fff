//! Arena-backed box tree.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! Boxes live in a single `Vec` and refer to each other through [`BoxId`]
//! indices. A box's `parent` and its parent's `children` are only ever
//! changed together. Removed boxes stay in the arena, detached, until the
//! tree is dropped.

pub mod normalize;
pub mod words;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use serde::Serialize;

use crate::error::TreeError;
use crate::font::Font;
use crate::geometry::{Point, Rect, Size};
use crate::image::ImageSlot;
use crate::layout::line::LineBox;
use crate::style::{BoxStyle, DisplayKind, Position, ua};

pub use words::{Word, WordKind, WordSelection, parse_to_words};

/// Index of a box in its [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoxId(pub usize);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The element a box was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HtmlTag {
    /// Lowercase tag name.
    pub name: String,
    /// Attributes with lowercase names.
    pub attributes: BTreeMap<String, String>,
}

impl HtmlTag {
    /// A tag with no attributes.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        let _ = self
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// A `colspan`, `rowspan` or `span` attribute, defaulting to 1.
    ///
    /// [§ 4.9.11 Attributes common to td and th elements](https://html.spec.whatwg.org/multipage/tables.html#attributes-common-to-td-and-th-elements)
    ///
    /// "If parsing that value failed, or returned zero, or if the attribute
    /// is absent, then let colspan be 1, instead. If colspan is greater
    /// than 1000, let it be 1000 instead." Row spans stop at 65534.
    #[must_use]
    pub fn span(&self, name: &str) -> usize {
        let limit = if name.eq_ignore_ascii_case("rowspan") {
            MAX_ROWSPAN
        } else {
            MAX_COLSPAN
        };
        self.attribute(name)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(1, |n| usize::try_from(n).unwrap_or(limit).clamp(1, limit))
    }

    /// Whether the tag has `name` (case-insensitive).
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Largest honoured `colspan` and `span`.
pub const MAX_COLSPAN: usize = 1000;
/// Largest honoured `rowspan`.
pub const MAX_ROWSPAN: usize = 65534;

/// Box kind, chosen at construction from the tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BoxKind {
    /// Ordinary element or anonymous box.
    Generic,
    /// `<img>`: one image word sized from the loaded image.
    Image,
    /// `<iframe>` / `<frame>`: a fixed-size placeholder.
    Frame,
    /// `<hr>`
    HorizontalRule,
    /// Marker box of a list item. Not a child of any box.
    ListMarker,
    /// Occupies a grid cell covered by a row-spanning cell.
    SpacingPlaceholder {
        /// The cell this placeholder extends.
        extends: BoxId,
        /// Last row index the spanning cell covers.
        end_row: usize,
    },
}

impl BoxKind {
    /// Kind for a tag name.
    #[must_use]
    pub fn for_tag(name: &str) -> Self {
        match name {
            "img" => Self::Image,
            "iframe" | "frame" => Self::Frame,
            "hr" => Self::HorizontalRule,
            _ => Self::Generic,
        }
    }

    /// Whether the box's content is a single image-like word.
    #[must_use]
    pub const fn is_replaced(&self) -> bool {
        matches!(self, Self::Image | Self::Frame)
    }
}

/// One box.
#[derive(Debug, Clone)]
pub struct BoxNode {
    /// Source element; `None` for anonymous boxes.
    pub tag: Option<HtmlTag>,
    /// Kind.
    pub kind: BoxKind,
    /// Declared style.
    pub style: BoxStyle,
    text: Option<String>,
    /// Layout fragments.
    pub words: Vec<Word>,
    pub(crate) words_measured: bool,
    /// Top-left of the border box.
    pub location: Point,
    /// Border-box size.
    pub size: Size,
    pub(crate) collapsed_margin_top: Option<f32>,
    /// Paint rectangles, one per line box the inline box spans.
    pub rectangles: Vec<Rect>,
    /// Line boxes of a block that contains only inlines.
    pub line_boxes: Vec<LineBox>,
    parent: Option<BoxId>,
    children: Vec<BoxId>,
    /// Marker box of a list item.
    pub list_marker: Option<BoxId>,
    pub(crate) placeholders_inserted: bool,
    pub(crate) font: Option<Rc<Font>>,
    /// Replaced content of image boxes.
    pub image: ImageSlot,
    /// `background-image` of any box.
    pub background: ImageSlot,
}

impl BoxNode {
    fn new(tag: Option<HtmlTag>, kind: BoxKind, style: BoxStyle) -> Self {
        let words = if kind.is_replaced() {
            vec![Word::image()]
        } else {
            Vec::new()
        };
        Self {
            tag,
            kind,
            style,
            text: None,
            words,
            words_measured: false,
            location: Point::default(),
            size: Size::default(),
            collapsed_margin_top: None,
            rectangles: Vec::new(),
            line_boxes: Vec::new(),
            parent: None,
            children: Vec::new(),
            list_marker: None,
            placeholders_inserted: false,
            font: None,
            image: ImageSlot::default(),
            background: ImageSlot::default(),
        }
    }

    /// Parent box.
    #[must_use]
    pub const fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    /// Child boxes in document order.
    #[must_use]
    pub fn children(&self) -> &[BoxId] {
        &self.children
    }

    /// Raw text, if this is a text box.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether the box was synthesized rather than generated by an element.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.tag.is_none()
    }

    /// Tag name, or `""` for anonymous boxes.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.tag.as_ref().map_or("", |t| t.name.as_str())
    }

    /// Attribute of the source element.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.tag.as_ref().and_then(|t| t.attribute(name))
    }

    /// Display kind.
    #[must_use]
    pub const fn display(&self) -> DisplayKind {
        self.style.display
    }

    /// Border-box bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::from_point_size(self.location, self.size)
    }

    /// Right edge of the border box.
    #[must_use]
    pub fn actual_right(&self) -> f32 {
        self.location.x + self.size.width
    }

    /// Set the right edge by adjusting the width.
    pub fn set_actual_right(&mut self, right: f32) {
        self.size.width = right - self.location.x;
    }

    /// Bottom edge of the border box.
    #[must_use]
    pub fn actual_bottom(&self) -> f32 {
        self.location.y + self.size.height
    }

    /// Set the bottom edge by adjusting the height.
    pub fn set_actual_bottom(&mut self, bottom: f32) {
        self.size.height = bottom - self.location.y;
    }

    /// Whether the box is fixed-positioned.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.style.position == Position::Fixed
    }

    /// Whether the box establishes a containing block for its descendants.
    #[must_use]
    pub const fn is_block_container(&self) -> bool {
        matches!(
            self.style.display,
            DisplayKind::Block
                | DisplayKind::ListItem
                | DisplayKind::Table
                | DisplayKind::InlineTable
                | DisplayKind::TableCell
                | DisplayKind::TableCaption
        )
    }

    /// Spacing placeholder row extent, if this is one.
    #[must_use]
    pub const fn placeholder_end_row(&self) -> Option<usize> {
        match self.kind {
            BoxKind::SpacingPlaceholder { end_row, .. } => Some(end_row),
            _ => None,
        }
    }

    /// Mark the words for re-measurement.
    pub fn invalidate_measure(&mut self) {
        self.words_measured = false;
        self.font = None;
    }
}

/// The box tree of one document.
#[derive(Debug, Clone)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
    root: BoxId,
}

impl Default for BoxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<BoxId> for BoxTree {
    type Output = BoxNode;

    fn index(&self, id: BoxId) -> &BoxNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut BoxNode {
        &mut self.nodes[id.0]
    }
}

impl BoxTree {
    /// A tree holding only the anonymous initial containing block.
    #[must_use]
    pub fn new() -> Self {
        let style = BoxStyle {
            display: DisplayKind::Block,
            ..BoxStyle::default()
        };
        Self {
            nodes: vec![BoxNode::new(None, BoxKind::Generic, style)],
            root: BoxId(0),
        }
    }

    /// The initial containing block.
    #[must_use]
    pub const fn root(&self) -> BoxId {
        self.root
    }

    /// Number of boxes ever allocated, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; the root exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Box by id.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&BoxNode> {
        self.nodes.get(id.0)
    }

    /// Mutable box by id.
    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut BoxNode> {
        self.nodes.get_mut(id.0)
    }

    /// Box by id, or [`TreeError::UnknownBox`].
    pub fn node(&self, id: BoxId) -> Result<&BoxNode, TreeError> {
        self.get(id).ok_or(TreeError::UnknownBox(id))
    }

    fn check(&self, id: BoxId) -> Result<(), TreeError> {
        self.node(id).map(|_| ())
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of `id`.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: BoxId) -> impl Iterator<Item = BoxId> + '_ {
        std::iter::successors(self.parent(id), |&p| self.parent(p))
    }

    /// `id` and all its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Whether `descendant` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: BoxId, ancestor: BoxId) -> bool {
        self.ancestors(descendant).any(|a| a == ancestor)
    }

    /// Allocate a detached box.
    fn alloc(&mut self, node: BoxNode) -> BoxId {
        let id = BoxId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Style for a new element box under `parent`.
    ///
    /// Inherited values, then user-agent defaults, then presentational
    /// attributes (including those a table passes to its cells), then the
    /// element's `style` attribute.
    fn element_style(&self, tag: &HtmlTag, parent: Option<BoxId>) -> BoxStyle {
        let mut style = parent
            .and_then(|p| self.get(p))
            .map_or_else(BoxStyle::default, |p| BoxStyle::inherit_from(&p.style));
        ua::apply_tag_defaults(&mut style, &tag.name);
        ua::apply_presentational_attributes(&mut style, &tag.name, &tag.attributes);
        if matches!(tag.name.as_str(), "td" | "th") {
            let table = parent.and_then(|p| {
                std::iter::once(p)
                    .chain(self.ancestors(p))
                    .find(|&a| self[a].tag.as_ref().is_some_and(|t| t.is("table")))
            });
            if let Some(table) = table.and_then(|t| self[t].tag.as_ref()) {
                ua::apply_table_attributes_to_cell(&mut style, &table.attributes);
            }
        }
        if let Some(inline) = tag.attribute("style") {
            style.apply_declarations(inline);
        }
        style
    }

    /// Create an element box appended to `parent`'s children.
    ///
    /// The kind is picked from the tag name: `img` becomes an image box,
    /// `iframe`/`frame` a frame box, `hr` a horizontal rule; everything else
    /// is generic. `br` becomes an inline box holding a line-break word.
    pub fn create_box(&mut self, tag: HtmlTag, parent: BoxId) -> Result<BoxId, TreeError> {
        self.create_box_before(parent, Some(tag), None)
    }

    /// Create a box under `parent`, appended or inserted before `before`.
    ///
    /// With no tag the box is anonymous and inherits from `parent`.
    /// Fails with [`TreeError::SiblingNotFound`] if `before` is not one of
    /// `parent`'s children.
    pub fn create_box_before(
        &mut self,
        parent: BoxId,
        tag: Option<HtmlTag>,
        before: Option<BoxId>,
    ) -> Result<BoxId, TreeError> {
        self.check(parent)?;
        let position = self.insertion_index(parent, before)?;
        let node = match tag {
            Some(tag) => {
                let style = self.element_style(&tag, Some(parent));
                let kind = BoxKind::for_tag(&tag.name);
                let is_br = tag.is("br");
                let mut node = BoxNode::new(Some(tag), kind, style);
                if is_br {
                    node.words = vec![Word::line_break()];
                }
                node
            }
            None => BoxNode::new(
                None,
                BoxKind::Generic,
                BoxStyle::anonymous(&self[parent].style),
            ),
        };
        let id = self.alloc(node);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(position, id);
        Ok(id)
    }

    /// Create an anonymous block box under `parent`.
    pub fn create_anonymous_block(
        &mut self,
        parent: BoxId,
        before: Option<BoxId>,
    ) -> Result<BoxId, TreeError> {
        let id = self.create_box_before(parent, None, before)?;
        self[id].style.display = DisplayKind::Block;
        Ok(id)
    }

    /// Create an anonymous inline box holding `text`.
    pub fn create_text(&mut self, parent: BoxId, text: &str) -> Result<BoxId, TreeError> {
        let id = self.create_box_before(parent, None, None)?;
        self.set_text(id, text);
        Ok(id)
    }

    /// Create a spacing placeholder before `before` in `row`.
    pub(crate) fn create_placeholder(
        &mut self,
        row: BoxId,
        before: Option<BoxId>,
        extends: BoxId,
        end_row: usize,
    ) -> Result<BoxId, TreeError> {
        let id = self.create_box_before(row, None, before)?;
        let node = &mut self[id];
        node.kind = BoxKind::SpacingPlaceholder { extends, end_row };
        node.style.display = DisplayKind::None;
        Ok(id)
    }

    /// Create a detached list-marker box styled after `owner`.
    pub(crate) fn create_marker(&mut self, owner: BoxId, font_size: f32) -> BoxId {
        let mut style = BoxStyle::inherit_from(&self[owner].style);
        style.display = DisplayKind::Inline;
        style.font_size = crate::style::FontSize::Absolute(font_size);
        self.alloc(BoxNode::new(None, BoxKind::ListMarker, style))
    }

    fn insertion_index(&self, parent: BoxId, before: Option<BoxId>) -> Result<usize, TreeError> {
        let children = &self.node(parent)?.children;
        match before {
            None => Ok(children.len()),
            Some(before) => children
                .iter()
                .position(|&c| c == before)
                .ok_or(TreeError::SiblingNotFound { parent, before }),
        }
    }

    fn detach(&mut self, id: BoxId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Move `id` under `parent`, appending it.
    pub fn set_parent(&mut self, id: BoxId, parent: BoxId) -> Result<(), TreeError> {
        self.check(id)?;
        self.check(parent)?;
        if id == parent || self.is_descendant_of(parent, id) {
            return Err(TreeError::Cycle(id, parent));
        }
        self.detach(id);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        Ok(())
    }

    /// Move `id` so it sits immediately before its sibling `before`.
    pub fn set_before_box(&mut self, id: BoxId, before: BoxId) -> Result<(), TreeError> {
        self.check(id)?;
        let parent = self.parent(before).ok_or(TreeError::UnknownBox(before))?;
        if id == before {
            return Ok(());
        }
        if id == parent || self.is_descendant_of(parent, id) {
            return Err(TreeError::Cycle(id, parent));
        }
        self.detach(id);
        let index = self.insertion_index(parent, Some(before))?;
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, id);
        Ok(())
    }

    /// Move every child of `from` to the end of `target`'s children.
    pub fn set_all_boxes(&mut self, target: BoxId, from: BoxId) -> Result<(), TreeError> {
        self.check(target)?;
        self.check(from)?;
        if target == from {
            return Ok(());
        }
        if self.is_descendant_of(target, from) {
            return Err(TreeError::Cycle(from, target));
        }
        let moved = std::mem::take(&mut self.nodes[from.0].children);
        for &child in &moved {
            self.nodes[child.0].parent = Some(target);
        }
        self.nodes[target.0].children.extend(moved);
        Ok(())
    }

    /// Detach `id` from its parent. The subtree stays in the arena,
    /// unreachable from the root; in-flight image loads are cancelled.
    pub fn remove(&mut self, id: BoxId) -> Result<(), TreeError> {
        self.check(id)?;
        self.detach(id);
        self.cancel_images(id);
        Ok(())
    }

    /// Replace the text of `id` and re-split it into words.
    pub fn set_text(&mut self, id: BoxId, text: &str) {
        let node = &mut self[id];
        node.text = Some(text.to_string());
        node.words = parse_to_words(text, node.style.white_space, node.style.word_break);
        node.invalidate_measure();
    }

    /// Re-split the text of `id` after a style change.
    pub fn parse_to_words(&mut self, id: BoxId) -> Result<(), TreeError> {
        let node = self.get_mut(id).ok_or(TreeError::UnknownBox(id))?;
        if let Some(text) = &node.text {
            node.words = parse_to_words(text, node.style.white_space, node.style.word_break);
            node.invalidate_measure();
        }
        Ok(())
    }

    /// Cancel in-flight image loads of `id` and its subtree.
    pub fn cancel_images(&mut self, id: BoxId) {
        for box_id in self.descendants(id) {
            let node = &mut self.nodes[box_id.0];
            node.image.cancel();
            node.background.cancel();
        }
    }

    /// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    ///
    /// "For other elements, if the element's position is 'relative' or
    /// 'static', the containing block is formed by the content edge of the
    /// nearest block container ancestor box."
    ///
    /// The root is its own containing block. A detached subtree with no
    /// block ancestor is a [`TreeError::NoContainingBlock`].
    pub fn containing_block(&self, id: BoxId) -> Result<BoxId, TreeError> {
        self.check(id)?;
        if id == self.root {
            return Ok(id);
        }
        self.ancestors(id)
            .find(|&a| a == self.root || self[a].is_block_container())
            .ok_or(TreeError::NoContainingBlock(id))
    }

    /// Nearest ancestor with `position` other than `static`.
    #[must_use]
    pub fn positioned_ancestor(&self, id: BoxId) -> BoxId {
        self.ancestors(id)
            .find(|&a| self[a].style.position != Position::Static)
            .unwrap_or(self.root)
    }

    /// Previous in-flow sibling.
    ///
    /// Siblings with `display: none` or absolute/fixed positioning are
    /// skipped.
    #[must_use]
    pub fn previous_sibling(&self, id: BoxId) -> Option<BoxId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings[..index].iter().rev().copied().find(|&s| {
            let style = &self[s].style;
            style.display != DisplayKind::None && !style.is_out_of_flow()
        })
    }

    /// Whether every displayed child of `id` is inline-level.
    #[must_use]
    pub fn contains_inlines_only(&self, id: BoxId) -> bool {
        self.children(id)
            .iter()
            .map(|&c| self[c].style.display)
            .filter(|&d| d != DisplayKind::None)
            .all(DisplayKind::is_inline)
    }

    /// Release resources held by the tree: every in-flight image load is
    /// cancelled depth-first and cached images and fonts are dropped.
    pub fn dispose(&mut self) {
        let order = self.descendants(self.root);
        for id in order.into_iter().rev() {
            release(&mut self.nodes[id.0]);
        }
        // Detached subtrees are not reachable from the root.
        for node in &mut self.nodes {
            release(node);
        }
    }
}

fn release(node: &mut BoxNode) {
    node.image.cancel();
    node.background.cancel();
    node.image = ImageSlot::default();
    node.background = ImageSlot::default();
    node.font = None;
}
