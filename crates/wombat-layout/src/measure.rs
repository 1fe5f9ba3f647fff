//! Resolved box metrics: font sizes, edges, client rectangles, word sizes,
//! and the minimum / maximum content widths used by table layout.
//!
//! [§ 8.1 Box dimensions](https://www.w3.org/TR/CSS2/box.html#box-dimensions)

use std::rc::Rc;

use crate::error::FontError;
use crate::font::{Font, FontCache, FontStyle};
use crate::geometry::{EdgeSizes, Rect};
use crate::graphics::TextMeasure;
use crate::style::{AutoLength, BorderCollapse, DisplayKind, FontSlant, LineHeight, Side, WhiteSpace};
use crate::tree::{BoxId, BoxTree, WordKind};

/// Widths at or above this are treated as "unbounded" by layout.
pub const UNBOUNDED: f32 = 90_999.0;

/// Computed font size of `id` in pixels.
#[must_use]
pub fn font_size(tree: &BoxTree, id: BoxId, fonts: &FontCache) -> f32 {
    let mut chain: Vec<BoxId> = std::iter::once(id).chain(tree.ancestors(id)).collect();
    chain.reverse();
    chain.into_iter().fold(fonts.default_size(), |parent, box_id| {
        tree[box_id].style.font_size.resolve(parent)
    })
}

/// Resolved margin, border and padding widths of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxEdges {
    /// Margins; `auto` resolves to 0.
    pub margin: EdgeSizes,
    /// Border widths; 0 where the border style is `none` or `hidden`.
    pub border: EdgeSizes,
    /// Padding.
    pub padding: EdgeSizes,
}

impl BoxEdges {
    /// Border plus padding on the left.
    #[must_use]
    pub fn inner_left(&self) -> f32 {
        self.border.left + self.padding.left
    }

    /// Border plus padding on the right.
    #[must_use]
    pub fn inner_right(&self) -> f32 {
        self.border.right + self.padding.right
    }

    /// Border plus padding on the top.
    #[must_use]
    pub fn inner_top(&self) -> f32 {
        self.border.top + self.padding.top
    }

    /// Border plus padding on the bottom.
    #[must_use]
    pub fn inner_bottom(&self) -> f32 {
        self.border.bottom + self.padding.bottom
    }

    /// Horizontal border plus padding.
    #[must_use]
    pub fn inner_horizontal(&self) -> f32 {
        self.inner_left() + self.inner_right()
    }
}

/// Width that percentages in `id`'s edges refer to: the border-box width of
/// its containing block (its own width for the root and detached boxes).
fn percent_basis(tree: &BoxTree, id: BoxId) -> f32 {
    match tree.containing_block(id) {
        Ok(cb) if cb != id => tree[cb].size.width,
        _ => tree[id].size.width,
    }
}

/// Resolve the edges of `id`.
///
/// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
///
/// "The percentage is calculated with respect to the width of the generated
/// box's containing block."
#[must_use]
pub fn edges(tree: &BoxTree, id: BoxId, fonts: &FontCache) -> BoxEdges {
    let style = &tree[id].style;
    let basis = percent_basis(tree, id);
    let em = font_size(tree, id, fonts);
    let side = |s: Side| -> (f32, f32, f32) {
        let margin = style.margin.get(s).to_px(basis, em);
        let border = if style.border_style.get(s).is_visible() {
            style.border_width.get(s).to_px(basis, em).max(0.0)
        } else {
            0.0
        };
        let padding = style.padding.get(s).to_px(basis, em).max(0.0);
        (margin, border, padding)
    };
    let (mt, bt, pt) = side(Side::Top);
    let (mr, br, pr) = side(Side::Right);
    let (mb, bb, pb) = side(Side::Bottom);
    let (ml, bl, pl) = side(Side::Left);
    BoxEdges {
        margin: EdgeSizes::new(mt, mr, mb, ml),
        border: EdgeSizes::new(bt, br, bb, bl),
        padding: EdgeSizes::new(pt, pr, pb, pl),
    }
}

/// Content ("client") rectangle of `id`.
#[must_use]
pub fn client_rect(tree: &BoxTree, id: BoxId, fonts: &FontCache) -> Rect {
    let node = &tree[id];
    let e = edges(tree, id, fonts);
    Rect::from_ltrb(
        node.location.x + e.inner_left(),
        node.location.y + e.inner_top(),
        node.actual_right() - e.inner_right(),
        node.actual_bottom() - e.inner_bottom(),
    )
}

/// Resolve an optional length property of `id` against `basis`.
#[must_use]
pub fn resolve(tree: &BoxTree, id: BoxId, fonts: &FontCache, value: &AutoLength, basis: f32) -> Option<f32> {
    value
        .length()
        .map(|len| len.to_px(basis, font_size(tree, id, fonts)))
}

/// [§ 17.6.1 The separated borders model](https://www.w3.org/TR/CSS2/tables.html#separated-borders)
///
/// Gap between cells of table `id`. In the collapsing model adjacent cells
/// overlap by one pixel.
#[must_use]
pub fn table_spacing(tree: &BoxTree, id: BoxId, fonts: &FontCache) -> (f32, f32) {
    let style = &tree[id].style;
    if style.border_collapse == BorderCollapse::Collapse {
        return (-1.0, -1.0);
    }
    let em = font_size(tree, id, fonts);
    (
        style.border_spacing_h.to_px(0.0, em),
        style.border_spacing_v.to_px(0.0, em),
    )
}

/// Requested face of `id`.
#[must_use]
pub fn font_style(tree: &BoxTree, id: BoxId) -> FontStyle {
    let style = &tree[id].style;
    let mut flags = FontStyle::empty();
    if style.is_bold() {
        flags |= FontStyle::BOLD;
    }
    if style.font_slant != FontSlant::Normal {
        flags |= FontStyle::ITALIC;
    }
    flags
}

/// Font of `id`, from the box's cache slot or the document cache.
pub fn font(tree: &BoxTree, id: BoxId, fonts: &FontCache) -> Result<Rc<Font>, FontError> {
    if let Some(font) = &tree[id].font {
        return Ok(Rc::clone(font));
    }
    let family = tree[id].style.font_family.as_str();
    let family = if family.is_empty() {
        fonts.default_family()
    } else {
        family
    };
    fonts.get(family, font_size(tree, id, fonts), font_style(tree, id))
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
///
/// Used line height of `id`. `normal` is the font's own line spacing.
pub fn line_height(tree: &BoxTree, id: BoxId, fonts: &FontCache) -> Result<f32, FontError> {
    let size = font_size(tree, id, fonts);
    Ok(match &tree[id].style.line_height {
        LineHeight::Normal => font(tree, id, fonts)?.height,
        LineHeight::Number(factor) => factor * size,
        LineHeight::Length(len) => len.to_px(size, size),
    })
}

/// [§ 16.4 Spacing](https://www.w3.org/TR/CSS2/text.html#spacing-props)
///
/// Width of one inter-word space in `id`: a measured space plus
/// `word-spacing`.
pub fn word_spacing(
    tree: &BoxTree,
    id: BoxId,
    fonts: &FontCache,
    text: &dyn TextMeasure,
) -> Result<f32, FontError> {
    let font = font(tree, id, fonts)?;
    let mut spacing = text.measure_string(" ", &font).width;
    if let Some(extra) = &tree[id].style.word_spacing {
        spacing += extra.to_px(0.0, font.size);
    }
    Ok(spacing)
}

/// Measure the text words of `id` once, caching the box's font.
///
/// Image words are sized by replaced-box layout.
pub fn measure_words(
    tree: &mut BoxTree,
    id: BoxId,
    fonts: &FontCache,
    text: &dyn TextMeasure,
) -> Result<(), FontError> {
    if tree[id].words_measured {
        return Ok(());
    }
    let font = font(tree, id, fonts)?;
    let node = &mut tree[id];
    for word in &mut node.words {
        match &word.kind {
            WordKind::Text(content) => {
                word.width = text.measure_string(content, &font).width;
                word.height = font.height;
            }
            WordKind::LineBreak => {
                word.width = 0.0;
                word.height = font.height;
            }
            WordKind::Image => {}
        }
    }
    node.font = Some(font);
    node.words_measured = true;
    Ok(())
}

/// Measure every box below `id`.
pub fn measure_subtree(
    tree: &mut BoxTree,
    id: BoxId,
    fonts: &FontCache,
    text: &dyn TextMeasure,
) -> Result<(), FontError> {
    for box_id in tree.descendants(id) {
        if tree[box_id].style.display != DisplayKind::None && !tree[box_id].kind.is_replaced() {
            measure_words(tree, box_id, fonts, text)?;
        }
    }
    Ok(())
}

/// Width of a word plus the trailing space it owns.
fn full_width(word_width: f32, has_space_after: bool, spacing: f32) -> f32 {
    if has_space_after {
        word_width + spacing
    } else {
        word_width
    }
}

/// How narrow `id` can get before its widest word overflows: the widest
/// word in the subtree plus the horizontal border and padding of every box
/// from that word's owner up to, not including, `id`.
pub fn minimum_width(
    tree: &BoxTree,
    id: BoxId,
    fonts: &FontCache,
    text: &dyn TextMeasure,
) -> Result<f32, FontError> {
    let mut widest = 0.0_f32;
    let mut owner = None;
    longest_word(tree, id, fonts, text, &mut widest, &mut owner)?;

    let mut padding = 0.0;
    if let Some(mut current) = owner {
        while current != id {
            padding += edges(tree, current, fonts).inner_horizontal();
            match tree.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }
    Ok(widest + padding)
}

fn longest_word(
    tree: &BoxTree,
    id: BoxId,
    fonts: &FontCache,
    text: &dyn TextMeasure,
    widest: &mut f32,
    owner: &mut Option<BoxId>,
) -> Result<(), FontError> {
    let node = &tree[id];
    if node.style.display == DisplayKind::None {
        return Ok(());
    }
    if node.words.is_empty() {
        for &child in node.children() {
            longest_word(tree, child, fonts, text, widest, owner)?;
        }
        return Ok(());
    }
    let spacing = if node.words.iter().any(|w| w.has_space_after) {
        word_spacing(tree, id, fonts, text)?
    } else {
        0.0
    };
    for word in &node.words {
        let width = full_width(word.width, word.has_space_after, spacing);
        if width > *widest {
            *widest = width;
            *owner = Some(id);
        }
    }
    Ok(())
}

/// Minimum and maximum content width of `id`.
///
/// The minimum is the widest single word; the maximum is the longest line
/// the content would form with no wrapping. The running line sum restarts
/// at block-level descendants and at forced line breaks, and starts from
/// the margins accumulated on the way down. Horizontal border and padding
/// of every visited box is added to both; tables also add their cell
/// spacing.
pub fn min_max_width(
    tree: &BoxTree,
    id: BoxId,
    fonts: &FontCache,
    text: &dyn TextMeasure,
) -> Result<(f32, f32), FontError> {
    let mut sums = MinMaxSums::default();
    sums.visit(tree, id, fonts, text)?;
    let min = if sums.min < UNBOUNDED { sums.min } else { 0.0 };
    Ok((sums.padding + min, sums.padding + sums.max.max(sums.broken)))
}

#[derive(Debug, Default)]
struct MinMaxSums {
    min: f32,
    max: f32,
    /// Longest line ended by a forced break.
    broken: f32,
    padding: f32,
    margin: f32,
}

impl MinMaxSums {
    fn visit(
        &mut self,
        tree: &BoxTree,
        id: BoxId,
        fonts: &FontCache,
        text: &dyn TextMeasure,
    ) -> Result<(), FontError> {
        let node = &tree[id];
        if node.style.display == DisplayKind::None {
            return Ok(());
        }

        // STEP 1: block-level boxes start a new line.
        let mut previous = None;
        if node.style.display != DisplayKind::Inline
            && node.style.display != DisplayKind::TableCell
            && node.style.white_space != WhiteSpace::Nowrap
        {
            previous = Some(self.max);
            self.max = self.margin;
        }

        // STEP 2: edges, plus cell spacing for tables.
        let e = edges(tree, id, fonts);
        self.padding += e.inner_horizontal();
        if node.style.display.is_table() {
            let (h, _) = table_spacing(tree, id, fonts);
            self.padding += h * (column_estimate(tree, id) + 1) as f32;
        }

        // STEP 3: words or children.
        if node.words.is_empty() {
            for &child in node.children() {
                let m = edges(tree, child, fonts).margin.horizontal();
                self.margin += m;
                self.visit(tree, child, fonts, text)?;
                self.margin -= m;
            }
        } else {
            let spacing = word_spacing(tree, id, fonts, text)?;
            let count = node.words.len();
            for (index, word) in node.words.iter().enumerate() {
                if word.is_line_break() {
                    self.broken = self.broken.max(self.max);
                    self.max = self.margin;
                    continue;
                }
                if index == 0 && word.has_space_before {
                    self.max += spacing;
                }
                let trailing = word.has_space_after && index + 1 < count;
                self.max += full_width(word.width, trailing, spacing);
                self.min = self.min.max(word.width);
            }
        }

        if let Some(previous) = previous {
            self.max = self.max.max(previous);
        }
        Ok(())
    }
}

/// Column count of a table from its rows, for width estimates.
fn column_estimate(tree: &BoxTree, table: BoxId) -> usize {
    let mut best = 0;
    for &child in tree.children(table) {
        let display = tree[child].style.display;
        let rows: Vec<BoxId> = match display {
            DisplayKind::TableRow => vec![child],
            DisplayKind::TableRowGroup
            | DisplayKind::TableHeaderGroup
            | DisplayKind::TableFooterGroup => tree
                .children(child)
                .iter()
                .copied()
                .filter(|&r| tree[r].style.display == DisplayKind::TableRow)
                .collect(),
            _ => Vec::new(),
        };
        for row in rows {
            let cells = tree
                .children(row)
                .iter()
                .filter(|&&c| tree[c].style.display == DisplayKind::TableCell)
                .map(|&c| tree[c].tag.as_ref().map_or(1, |t| t.span("colspan")))
                .fold(0_usize, usize::saturating_add);
            best = best.max(cells);
        }
    }
    best
}
