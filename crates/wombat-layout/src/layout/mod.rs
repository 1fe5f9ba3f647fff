//! Per-box layout orchestration.
//!
//! [§ 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! [`layout_box`] walks the tree top-down. Block-level boxes get their
//! width and position here, then hand their content to one of three
//! engines: the table engine for tables, the line-box builder for blocks
//! whose children are all inline, or recursive block layout otherwise.

pub mod line;
pub mod replaced;
pub mod table;

use wombat_common::report::{ErrorCategory, ErrorSink};

use crate::document::DocumentSettings;
use crate::error::LayoutError;
use crate::font::FontCache;
use crate::geometry::{Point, Size};
use crate::graphics::TextMeasure;
use crate::image::{ImageLoader, ImageQueue, ImageTarget};
use crate::measure::{self, UNBOUNDED};
use crate::style::{DisplayKind, ListStyleType, Position};
use crate::tree::{BoxId, BoxKind, BoxTree, Word};

/// Everything a layout pass needs besides the tree.
pub struct LayoutContext<'a> {
    /// Shared font cache.
    pub fonts: &'a FontCache,
    /// Text measurement.
    pub text: &'a dyn TextMeasure,
    /// Document settings.
    pub settings: &'a DocumentSettings,
    /// Where content errors go.
    pub sink: &'a dyn ErrorSink,
    /// Image loader.
    pub loader: &'a dyn ImageLoader,
    /// Completion queue the loader answers into.
    pub queue: &'a ImageQueue,
    /// Running maximum extent of the laid-out content.
    pub actual_size: Size,
    /// Synchronous loads started during this pass.
    pub(crate) sync_loads: usize,
}

impl<'a> LayoutContext<'a> {
    /// A context with an empty extent.
    pub fn new(
        fonts: &'a FontCache,
        text: &'a dyn TextMeasure,
        settings: &'a DocumentSettings,
        sink: &'a dyn ErrorSink,
        loader: &'a dyn ImageLoader,
        queue: &'a ImageQueue,
    ) -> Self {
        Self {
            fonts,
            text,
            settings,
            sink,
            loader,
            queue,
            actual_size: Size::default(),
            sync_loads: 0,
        }
    }

    /// Request an image for `id`, counting synchronous loads.
    pub(crate) fn request_image(&mut self, tree: &mut BoxTree, id: BoxId, target: ImageTarget) {
        let sync = self.settings.avoid_async_image_loading;
        if replaced::ensure_requested(tree, id, target, self.loader, self.queue, sync) {
            self.sync_loads += 1;
        }
    }
}

/// Result of laying out one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// The subtree is laid out.
    Complete,
    /// A content error was reported and the subtree was abandoned.
    Failed,
}

/// Lay out `id` and its subtree.
///
/// Content errors are reported to the sink as "Exception in box layout"
/// and yield [`LayoutOutcome::Failed`]; structural errors propagate.
pub fn layout_box(
    tree: &mut BoxTree,
    id: BoxId,
    cx: &mut LayoutContext<'_>,
) -> Result<LayoutOutcome, LayoutError> {
    match layout_box_inner(tree, id, cx) {
        Ok(()) => Ok(LayoutOutcome::Complete),
        Err(err) if err.is_structural() => Err(err),
        Err(err) => {
            cx.sink
                .report(ErrorCategory::Layout, "Exception in box layout", Some(&err));
            Ok(LayoutOutcome::Failed)
        }
    }
}

fn layout_box_inner(
    tree: &mut BoxTree,
    id: BoxId,
    cx: &mut LayoutContext<'_>,
) -> Result<(), LayoutError> {
    let display = tree[id].style.display;

    // STEP 1: display: none generates no box.
    if display == DisplayKind::None {
        return Ok(());
    }

    // STEP 2: reset paint rectangles and measure words.
    tree[id].rectangles.clear();
    measure_box(tree, id, cx)?;

    if tree[id].kind == BoxKind::HorizontalRule {
        replaced::layout_horizontal_rule(tree, id, cx)?;
    } else if display.is_block_level() {
        // STEP 3: width and position.
        if !matches!(
            display,
            DisplayKind::TableCell | DisplayKind::TableCaption | DisplayKind::Table | DisplayKind::InlineTable
        ) {
            resolve_block_width(tree, id, cx)?;
        }
        if !matches!(display, DisplayKind::TableCell | DisplayKind::TableCaption) {
            position_block(tree, id, cx)?;
        }

        // STEP 4: dispatch.
        if display.is_table() {
            table::layout_table(tree, id, cx)?;
        } else if !tree[id].words.is_empty() || tree.contains_inlines_only(id) {
            let top = tree[id].location.y;
            tree[id].set_actual_bottom(top);
            line::create_line_boxes(tree, id, cx)?;
        } else if !tree.children(id).is_empty() {
            for child in tree.children(id).to_vec() {
                let _ = layout_box(tree, child, cx)?;
            }
            let right = calculate_actual_right(tree, id, cx);
            tree[id].set_actual_right(right);
            let bottom = margin_bottom_collapse(tree, id, cx);
            tree[id].set_actual_bottom(bottom);
        }
    } else if let Some(previous) = tree.previous_sibling(id) {
        let (location, bottom) = (tree[previous].location, tree[previous].actual_bottom());
        let node = &mut tree[id];
        if node.location == Point::default() {
            node.location = location;
        }
        node.set_actual_bottom(bottom);
    }

    // STEP 5: explicit height.
    if let Some(height) = explicit_height(tree, id, cx) {
        let node = &tree[id];
        let bottom = node.actual_bottom().max(node.location.y + height);
        tree[id].set_actual_bottom(bottom);
    }

    // STEP 6: list marker.
    layout_list_marker(tree, id, cx)?;

    // STEP 7: document extent.
    if !tree[id].is_fixed() {
        update_actual_size(tree, id, cx)?;
    }

    #[cfg(feature = "layout-trace")]
    tracing::trace!(
        box_id = %id,
        display = %display,
        x = tree[id].location.x,
        y = tree[id].location.y,
        width = tree[id].size.width,
        height = tree[id].size.height,
        "box laid out"
    );
    Ok(())
}

/// Measure the words of `id`; replaced boxes are sized from their image.
fn measure_box(tree: &mut BoxTree, id: BoxId, cx: &mut LayoutContext<'_>) -> Result<(), LayoutError> {
    if cx.settings.avoid_images_late_loading && tree[id].style.background_image.is_some() {
        cx.request_image(tree, id, ImageTarget::Background);
    }
    if tree[id].kind.is_replaced() {
        replaced::measure_replaced(tree, id, cx)?;
    } else {
        measure::measure_words(tree, id, cx.fonts, cx.text)?;
    }
    Ok(())
}

/// Width of a block-level box: `auto` fills the containing block's content
/// width minus margins; an explicit width is the content width.
fn resolve_block_width(tree: &mut BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> Result<(), LayoutError> {
    let cb = tree.containing_block(id)?;
    let available = if cb == id {
        tree[id].size.width
    } else {
        let cb_edges = measure::edges(tree, cb, cx.fonts);
        tree[cb].size.width - cb_edges.inner_horizontal()
    };
    let edges = measure::edges(tree, id, cx.fonts);
    let width = match measure::resolve(tree, id, cx.fonts, &tree[id].style.width, available) {
        Some(content) => content + edges.inner_horizontal(),
        None => available - edges.margin.horizontal(),
    };
    tree[id].size.width = width;
    Ok(())
}

/// Position a block-level box below its previous in-flow sibling.
///
/// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
///
/// "In a block formatting context, boxes are laid out one after the other,
/// vertically, beginning at the top of a containing block."
pub(crate) fn position_block(
    tree: &mut BoxTree,
    id: BoxId,
    cx: &LayoutContext<'_>,
) -> Result<(), LayoutError> {
    let edges = measure::edges(tree, id, cx.fonts);
    let previous = tree.previous_sibling(id);
    let cb = tree.containing_block(id)?;

    let (mut left, mut top) = if cb == id {
        (tree[id].location.x, tree[id].location.y)
    } else {
        let cb_edges = measure::edges(tree, cb, cx.fonts);
        let left = tree[cb].location.x + cb_edges.inner_left() + edges.margin.left;
        let base = match (previous, tree.parent(id)) {
            (Some(prev), _) => {
                let prev_edges = measure::edges(tree, prev, cx.fonts);
                tree[prev].actual_bottom() + prev_edges.border.bottom
            }
            (None, Some(parent)) => measure::client_rect(tree, parent, cx.fonts).top(),
            (None, None) => tree[id].location.y,
        };
        (left, base + margin_top_collapse(tree, id, previous, cx)?)
    };

    match tree[id].style.position {
        Position::Fixed => {
            left = measure::resolve(tree, id, cx.fonts, &tree[id].style.left, 0.0).unwrap_or(0.0);
            top = measure::resolve(tree, id, cx.fonts, &tree[id].style.top, 0.0).unwrap_or(0.0);
        }
        Position::Absolute => {
            let anchor = tree.positioned_ancestor(id);
            let anchor_edges = measure::edges(tree, anchor, cx.fonts);
            let origin = tree[anchor].location;
            let basis = tree[anchor].size.width;
            if let Some(x) = measure::resolve(tree, id, cx.fonts, &tree[id].style.left, basis) {
                left = origin.x + anchor_edges.border.left + x + edges.margin.left;
            }
            if let Some(y) = measure::resolve(tree, id, cx.fonts, &tree[id].style.top, basis) {
                top = origin.y + anchor_edges.border.top + y + edges.margin.top;
            }
        }
        Position::Static | Position::Relative => {}
    }

    let node = &mut tree[id];
    node.location = Point::new(left, top);
    node.set_actual_bottom(top);
    Ok(())
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths."
///
/// With a previous sibling the gap is the larger of its bottom margin and
/// this box's top margin. A first child whose parent has no top or bottom
/// padding only keeps the part of its margin that exceeds the parent's
/// (collapsed) top margin. A horizontal rule never collapses below 1.1em.
fn margin_top_collapse(
    tree: &mut BoxTree,
    id: BoxId,
    previous: Option<BoxId>,
    cx: &LayoutContext<'_>,
) -> Result<f32, LayoutError> {
    let edges = measure::edges(tree, id, cx.fonts);
    let value = if let Some(prev) = previous {
        let prev_edges = measure::edges(tree, prev, cx.fonts);
        let value = prev_edges.margin.bottom.max(edges.margin.top);
        tree[id].collapsed_margin_top = Some(value);
        value
    } else if let Some(parent) = tree.parent(id).filter(|_| {
        edges.padding.top < 0.1 && edges.padding.bottom < 0.1
    }) {
        let parent_edges = measure::edges(tree, parent, cx.fonts);
        if parent_edges.padding.top < 0.1 && parent_edges.padding.bottom < 0.1 {
            let parent_collapsed = tree[parent].collapsed_margin_top.unwrap_or(0.0);
            (edges.margin.top - parent_edges.margin.top.max(parent_collapsed)).max(0.0)
        } else {
            edges.margin.top
        }
    } else {
        edges.margin.top
    };

    if value < 0.1 && tree[id].kind == BoxKind::HorizontalRule {
        let font = measure::font(tree, id, cx.fonts)?;
        return Ok(font.height * 1.1);
    }
    Ok(value)
}

/// Bottom edge of a block with block children: the last child's bottom
/// plus this box's bottom padding and border, and the last child's bottom
/// margin when this box is itself the last child of a parent without a
/// bottom margin.
fn margin_bottom_collapse(tree: &BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> f32 {
    let node = &tree[id];
    let Some(&last) = node
        .children()
        .iter()
        .rev()
        .find(|&&c| tree[c].style.display != DisplayKind::None)
    else {
        return node.actual_bottom();
    };
    let edges = measure::edges(tree, id, cx.fonts);
    let last_margin = measure::edges(tree, last, cx.fonts).margin.bottom;

    let mut margin = 0.0;
    if let Some(parent) = node.parent() {
        let is_last = tree.children(parent).last() == Some(&id);
        let parent_margin = measure::edges(tree, parent, cx.fonts).margin.bottom;
        if is_last && parent_margin < 0.1 {
            margin = if node.style.height.is_auto() {
                edges.margin.bottom.max(last_margin)
            } else {
                last_margin
            };
        }
    }
    node.actual_bottom()
        .max(tree[last].actual_bottom() + margin + edges.padding.bottom + edges.border.bottom)
}

/// Right edge of a block with block children. Only an unbounded box
/// shrinks to its children's extent.
fn calculate_actual_right(tree: &BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> f32 {
    let node = &tree[id];
    if node.actual_right() <= UNBOUNDED {
        return node.actual_right();
    }
    let max_right = node
        .children()
        .iter()
        .filter(|&&c| tree[c].style.display != DisplayKind::None)
        .map(|&c| tree[c].actual_right() + measure::edges(tree, c, cx.fonts).margin.right)
        .fold(0.0_f32, f32::max);
    let edges = measure::edges(tree, id, cx.fonts);
    max_right + edges.padding.right + edges.margin.right + edges.border.right
}

/// Explicit border-box height of `id`, if `height` is set.
fn explicit_height(tree: &BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> Option<f32> {
    let basis = tree
        .containing_block(id)
        .ok()
        .filter(|&cb| cb != id)
        .map_or(0.0, |cb| tree[cb].size.height);
    let content = measure::resolve(tree, id, cx.fonts, &tree[id].style.height, basis)?;
    let edges = measure::edges(tree, id, cx.fonts);
    Some(content + edges.inner_top() + edges.inner_bottom())
}

/// Index of list item `id` among its siblings, honoring `start` and
/// `reversed` on the list element.
fn list_index(tree: &BoxTree, id: BoxId) -> i64 {
    let Some(parent) = tree.parent(id) else {
        return 1;
    };
    let list = &tree[parent];
    let reversed = list.attribute("reversed").is_some();
    let siblings = list.children();
    let items = || {
        siblings
            .iter()
            .copied()
            .filter(|&c| tree[c].style.display == DisplayKind::ListItem)
    };
    let mut index = match list.attribute("start").and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(start) => start,
        None if reversed => items().count() as i64,
        None => 1,
    };
    for item in items() {
        if item == id {
            break;
        }
        index += if reversed { -1 } else { 1 };
    }
    index
}

/// [§ 12.6.2 Lists: the 'list-style-type' property](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style-type)
#[must_use]
pub fn marker_text(kind: ListStyleType, index: i64) -> String {
    match kind {
        ListStyleType::None => String::new(),
        ListStyleType::Disc => "•".to_string(),
        ListStyleType::Circle => "o".to_string(),
        ListStyleType::Square => "▪".to_string(),
        ListStyleType::Decimal => format!("{index}."),
        ListStyleType::DecimalLeadingZero => format!("{index:02}."),
        ListStyleType::LowerAlpha | ListStyleType::LowerLatin => format!("{}.", alphabetic(index, 'a')),
        ListStyleType::UpperAlpha | ListStyleType::UpperLatin => format!("{}.", alphabetic(index, 'A')),
        ListStyleType::LowerRoman => format!("{}.", roman(index).to_lowercase()),
        ListStyleType::UpperRoman => format!("{}.", roman(index)),
        ListStyleType::LowerGreek => format!("{}.", greek(index)),
    }
}

/// `1 → a`, `26 → z`, `27 → aa`.
fn alphabetic(index: i64, first: char) -> String {
    if index <= 0 {
        return index.to_string();
    }
    let mut n = index;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(char::from(first as u8 + (n % 26) as u8));
        n /= 26;
    }
    out.iter().rev().collect()
}

fn roman(index: i64) -> String {
    const NUMERALS: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if !(1..4000).contains(&index) {
        return index.to_string();
    }
    let mut n = index;
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

fn greek(index: i64) -> String {
    const LETTERS: [char; 24] = [
        'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ',
        'τ', 'υ', 'φ', 'χ', 'ψ', 'ω',
    ];
    if index <= 0 {
        return index.to_string();
    }
    let mut n = index;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(LETTERS[(n % 24) as usize]);
        n /= 24;
    }
    out.iter().rev().collect()
}

/// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
///
/// Create (once) and place the marker box of a list item, 5px left of the
/// item's border box and aligned with its top padding edge.
fn layout_list_marker(tree: &mut BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> Result<(), LayoutError> {
    let style = &tree[id].style;
    if style.display != DisplayKind::ListItem || style.list_style_type == ListStyleType::None {
        return Ok(());
    }

    let marker = match tree[id].list_marker {
        Some(marker) => marker,
        None => {
            let size = measure::font_size(tree, id, cx.fonts);
            let marker = tree.create_marker(id, size);
            let text = marker_text(tree[id].style.list_style_type, list_index(tree, id));
            tree.set_text(marker, &text);
            measure::measure_words(tree, marker, cx.fonts, cx.text)?;
            let (width, height) = tree[marker]
                .words
                .first()
                .map_or((0.0, 0.0), |w: &Word| (w.width, w.height));
            tree[marker].size = Size::new(width, height);
            tree[id].list_marker = Some(marker);
            marker
        }
    };

    let edges = measure::edges(tree, id, cx.fonts);
    let location = tree[id].location;
    let width = tree[marker].size.width;
    let node = &mut tree[marker];
    if let Some(word) = node.words.first_mut() {
        word.left = location.x - width - 5.0;
        word.top = location.y + edges.padding.top;
        node.location = Point::new(word.left, word.top);
    }
    Ok(())
}

/// Sum of horizontal margins of `id` and its ancestors when the box or its
/// parent is unbounded; otherwise 0.
fn width_margin_deep(tree: &BoxTree, id: BoxId, cx: &LayoutContext<'_>) -> f32 {
    let unbounded = tree[id].size.width > UNBOUNDED
        || tree.parent(id).is_some_and(|p| tree[p].size.width > UNBOUNDED);
    if !unbounded {
        return 0.0;
    }
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .map(|b| measure::edges(tree, b, cx.fonts).margin.horizontal())
        .sum()
}

fn update_actual_size(tree: &BoxTree, id: BoxId, cx: &mut LayoutContext<'_>) -> Result<(), LayoutError> {
    let origin = tree[tree.root()].location;
    let node = &tree[id];
    let minimum = measure::minimum_width(tree, id, cx.fonts, cx.text)?;
    let bounded_right = if node.size.width < UNBOUNDED {
        node.actual_right() - origin.x
    } else {
        0.0
    };
    let width = (minimum + width_margin_deep(tree, id, cx)).max(bounded_right);
    let height = node.actual_bottom() - origin.y;
    cx.actual_size = cx.actual_size.max(Size::new(width, height));
    Ok(())
}
