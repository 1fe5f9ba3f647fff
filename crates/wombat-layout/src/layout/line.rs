//! Line-box builder.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! [`create_line_boxes`] flows the words of a block's inline descendants
//! into lines that wrap at the block's content edge, then aligns each line
//! and records one paint rectangle per inline box per line.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::LayoutError;
use crate::geometry::{Point, Rect};
use crate::measure::{self, UNBOUNDED};
use crate::style::{
    Direction, DisplayKind, Overflow, PageBreakInside, Position, TextAlign, VerticalAlign, WhiteSpace,
};
use crate::tree::{BoxId, BoxKind, BoxTree};

use super::{LayoutContext, measure_box};

/// A word placed on a line: the box that owns it and its index in that
/// box's words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WordRef {
    /// Owner box.
    pub box_id: BoxId,
    /// Index into the owner's words.
    pub index: usize,
}

/// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is called
/// a line box."
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineBox {
    /// Words in flow order.
    pub words: Vec<WordRef>,
    /// Boxes that own at least one word on this line.
    pub related_boxes: Vec<BoxId>,
    /// The rectangle each inline box occupies on this line.
    pub rectangles: Vec<(BoxId, Rect)>,
}

impl LineBox {
    fn report(&mut self, word: WordRef) {
        if !self.words.contains(&word) {
            self.words.push(word);
        }
        if !self.related_boxes.contains(&word.box_id) {
            self.related_boxes.push(word.box_id);
        }
    }

    /// Words of `id` on this line.
    pub fn words_of(&self, id: BoxId) -> impl Iterator<Item = WordRef> + '_ {
        self.words.iter().copied().filter(move |w| w.box_id == id)
    }

    /// Rectangle of `id` on this line.
    #[must_use]
    pub fn rectangle_of(&self, id: BoxId) -> Option<Rect> {
        self.rectangles
            .iter()
            .find(|(b, _)| *b == id)
            .map(|&(_, r)| r)
    }

    /// Height of the tallest box rectangle on the line.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        self.rectangles
            .iter()
            .map(|(_, r)| r.height)
            .fold(0.0, f32::max)
    }

    /// Union of the word boxes on the line.
    #[must_use]
    pub fn bounds(&self, tree: &BoxTree) -> Option<Rect> {
        self.words
            .iter()
            .map(|w| tree[w.box_id].words[w.index].bounds())
            .reduce(|a, b| a.union(&b))
    }

    /// Whether `word` ends a selected run: the next word on the line is
    /// not selected, or there is none.
    #[must_use]
    pub fn is_last_selected_word(&self, tree: &BoxTree, word: WordRef) -> bool {
        match self.words.iter().position(|&w| w == word) {
            Some(i) if i + 1 < self.words.len() => {
                let next = self.words[i + 1];
                !tree[next.box_id].words[next.index].is_selected()
            }
            _ => true,
        }
    }

    fn union_rectangle(&mut self, id: BoxId, rect: Rect) {
        match self.rectangles.iter_mut().find(|(b, _)| *b == id) {
            Some((_, existing)) => *existing = existing.union(&rect),
            None => self.rectangles.push((id, rect)),
        }
    }

    fn shift(&mut self, tree: &mut BoxTree, dx: f32) {
        for w in &self.words {
            tree[w.box_id].words[w.index].left += dx;
        }
        for (_, rect) in &mut self.rectangles {
            *rect = rect.offset(dx, 0.0);
        }
    }
}

/// Running state of one block's inline flow.
struct Flow {
    block: BoxId,
    limit_right: f32,
    start_x: f32,
    cur_x: f32,
    cur_y: f32,
    max_right: f32,
    max_bottom: f32,
    lines: Vec<LineBox>,
    /// First and last line index each box has content on.
    hosting: HashMap<BoxId, (usize, usize)>,
    line_has_content: bool,
    /// The last placed word already owns a trailing space.
    space_pending: bool,
    page_height: f32,
    page_top: f32,
}

/// Build the line boxes of block `block`, whose children are all inline.
///
/// Words wrap at the content edge according to `white-space`. Each line is
/// vertically aligned as it closes. Afterwards lines are aligned
/// horizontally (`text-align`), mirrored for right-to-left text, and every
/// inline box gets one rectangle per line it spans. A block without a
/// width limit shrinks to its widest line.
pub(crate) fn create_line_boxes(
    tree: &mut BoxTree,
    block: BoxId,
    cx: &mut LayoutContext<'_>,
) -> Result<(), LayoutError> {
    let edges = measure::edges(tree, block, cx.fonts);
    let node = &tree[block];
    let start_x = node.location.x + edges.inner_left();
    let start_y = node.location.y + edges.inner_top();
    let limit_right = node.actual_right() - edges.inner_right();
    let indent = node
        .style
        .text_indent
        .to_px(limit_right - start_x, measure::font_size(tree, block, cx.fonts));

    let mut flow = Flow {
        block,
        limit_right,
        start_x,
        cur_x: start_x + indent,
        cur_y: start_y,
        max_right: start_x,
        max_bottom: start_y,
        lines: vec![LineBox::default()],
        hosting: HashMap::new(),
        line_has_content: false,
        space_pending: false,
        page_height: cx.settings.page_size.height,
        page_top: cx.settings.margins.top,
    };

    // STEP 1: flow words into lines.
    if !tree[block].words.is_empty() {
        flow.flow_words(tree, block, block, 0.0, 0.0, cx)?;
    }
    flow.flow_box(tree, block, cx)?;
    flow.finish_line(tree, cx)?;

    // STEP 2: an unbounded block shrinks to its content.
    if tree[block].actual_right() >= UNBOUNDED {
        tree[block].set_actual_right(flow.max_right + edges.inner_right());
    }

    // STEP 3: align lines and collect rectangles.
    let client = measure::client_rect(tree, block, cx.fonts);
    let mut lines = std::mem::take(&mut flow.lines);
    let count = lines.len();
    for (index, line) in lines.iter_mut().enumerate() {
        let first_indent = if index == 0 { indent } else { 0.0 };
        align_horizontally(tree, block, line, client, first_indent, index + 1 == count, cx);
        apply_right_to_left(tree, block, line);
        flow.bubble_rectangles(tree, line, index, cx);
    }
    lines.retain(|l| !l.words.is_empty());
    for line in &lines {
        for &(id, rect) in &line.rectangles {
            tree[id].rectangles.push(rect);
        }
    }

    // STEP 4: bottom edge.
    let clamp = if tree[block].style.overflow == Overflow::Hidden {
        measure::resolve(tree, block, cx.fonts, &tree[block].style.height, 0.0)
    } else {
        None
    };
    let node = &mut tree[block];
    node.line_boxes = lines;
    node.set_actual_bottom(flow.max_bottom + edges.inner_bottom());
    if let Some(height) = clamp {
        let limit = node.location.y + height + edges.inner_top() + edges.inner_bottom();
        if node.actual_bottom() > limit {
            node.set_actual_bottom(limit);
        }
    }

    #[cfg(feature = "layout-trace")]
    tracing::trace!(
        box_id = %block,
        lines = tree[block].line_boxes.len(),
        max_right = flow.max_right,
        max_bottom = flow.max_bottom,
        "line boxes created"
    );
    Ok(())
}

impl Flow {
    fn current(&self) -> usize {
        self.lines.len() - 1
    }

    /// Flow the children of `id`.
    fn flow_box(&mut self, tree: &mut BoxTree, id: BoxId, cx: &mut LayoutContext<'_>) -> Result<(), LayoutError> {
        let start_x = self.cur_x;
        let saved = (self.cur_x, self.max_right, self.max_bottom);
        let first_line = self.current();

        for child in tree.children(id).to_vec() {
            if tree[child].style.display == DisplayKind::None {
                continue;
            }
            let edges = measure::edges(tree, child, cx.fonts);
            let out_of_flow = tree[child].style.is_out_of_flow();
            let (left, right) = if out_of_flow {
                (0.0, 0.0)
            } else {
                (
                    edges.margin.left + edges.inner_left(),
                    edges.margin.right + edges.inner_right(),
                )
            };

            // Inline boxes start each pass at the pen.
            let margin_left = if out_of_flow { 0.0 } else { edges.margin.left };
            let node = &mut tree[child];
            node.location = Point::new(self.cur_x + margin_left, self.cur_y);
            node.rectangles.clear();
            measure_box(tree, child, cx)?;

            self.cur_x += left;
            if tree[child].words.is_empty() {
                self.flow_box(tree, child, cx)?;
            } else {
                self.flow_words(tree, id, child, left, right, cx)?;
            }
            self.cur_x += right;
        }

        let node = &tree[id];
        if id != self.block {
            // An inline-block keeps its declared width.
            if node.style.display == DisplayKind::InlineBlock {
                let basis = self.limit_right - self.start_x;
                if let Some(width) = measure::resolve(tree, id, cx.fonts, &node.style.width, basis) {
                    let advance = self.cur_x - start_x;
                    if (0.0..width).contains(&advance) {
                        self.cur_x = start_x + width;
                    }
                }
            }

            // Whitespace-only text between inline boxes is one space.
            if node.words.is_empty()
                && node.children().is_empty()
                && node.style.display.is_inline()
                && node.text().is_some_and(|t| !t.is_empty() && t.chars().all(char::is_whitespace))
                && !self.space_pending
            {
                self.cur_x += measure::word_spacing(tree, id, cx.fonts, cx.text)?;
                self.space_pending = true;
            }
        }

        if tree[id].style.position == Position::Absolute {
            (self.cur_x, self.max_right, self.max_bottom) = saved;
        }

        let _ = self.hosting.insert(id, (first_line, self.current()));
        Ok(())
    }

    /// Place the words of `id`, a child of `container`.
    fn flow_words(
        &mut self,
        tree: &mut BoxTree,
        container: BoxId,
        id: BoxId,
        left: f32,
        right: f32,
        cx: &mut LayoutContext<'_>,
    ) -> Result<(), LayoutError> {
        let first_line = self.current();
        let white_space = tree[id].style.white_space;
        let spacing = measure::word_spacing(tree, id, cx.fonts, cx.text)?;
        let line_height = measure::line_height(tree, container, cx.fonts)?;
        let avoid_break = !tree[container].is_fixed()
            && tree[container].style.page_break_inside == PageBreakInside::Avoid;

        let full_width = |w: &crate::tree::Word| {
            if w.has_space_after {
                w.width + spacing
            } else {
                w.width
            }
        };

        let mut wrap_nowrap = false;
        if white_space == WhiteSpace::Nowrap && self.cur_x > self.start_x {
            let box_right = self.cur_x + tree[id].words.iter().map(full_width).sum::<f32>();
            wrap_nowrap = box_right > self.limit_right;
        }

        if let Some(first) = tree[id].words.first() {
            if first.has_space_before && !first.is_image() && !self.space_pending && self.line_has_content {
                self.cur_x += spacing;
            }
        }

        for index in 0..tree[id].words.len() {
            let word = &tree[id].words[index];
            let (width, height, has_space_after) = (word.width, word.height, word.has_space_after);
            let (is_break, is_image, is_spaces) = (word.is_line_break(), word.is_image(), word.is_spaces());

            if self.max_bottom - self.cur_y < line_height {
                self.max_bottom = self.cur_y + line_height;
            }

            let overflows = white_space.wraps()
                && self.cur_x + width + right > self.limit_right
                && (white_space != WhiteSpace::PreWrap || !is_spaces);
            if (overflows && self.line_has_content) || is_break || wrap_nowrap {
                wrap_nowrap = false;
                self.new_line(tree, cx)?;
                if is_image || index == 0 {
                    self.cur_x += left;
                }
            }

            let line = self.current();
            self.lines[line].report(WordRef { box_id: id, index });

            let top = if avoid_break {
                self.break_page(self.cur_y, height)
            } else {
                self.cur_y
            };
            let word = &mut tree[id].words[index];
            word.left = self.cur_x;
            word.top = top;

            self.cur_x = word.left + full_width(word);
            self.max_right = self.max_right.max(word.right());
            self.max_bottom = self.max_bottom.max(word.bottom());
            self.space_pending = has_space_after;
            if !is_break {
                self.line_has_content = true;
            }
        }

        let current = self.current();
        let entry = self.hosting.entry(id).or_insert((first_line, first_line));
        entry.1 = current;
        Ok(())
    }

    fn new_line(&mut self, tree: &mut BoxTree, cx: &LayoutContext<'_>) -> Result<(), LayoutError> {
        self.finish_line(tree, cx)?;
        self.cur_x = self.start_x;
        self.cur_y = self.max_bottom;
        self.lines.push(LineBox::default());
        self.line_has_content = false;
        self.space_pending = false;
        Ok(())
    }

    /// Move a word that would straddle a page boundary to the next page.
    fn break_page(&self, top: f32, height: f32) -> f32 {
        let page = self.page_height;
        if page < 1.0 || height >= page {
            return top;
        }
        let rem_top = (top - self.page_top).rem_euclid(page);
        let rem_bottom = (top + height - self.page_top).rem_euclid(page);
        if rem_top > rem_bottom {
            top + page - rem_top + 1.0
        } else {
            top
        }
    }

    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// Vertically align the words of the current line. Text sits on a
    /// shared baseline; images sit on it with their bottom edge.
    fn finish_line(&mut self, tree: &mut BoxTree, cx: &LayoutContext<'_>) -> Result<(), LayoutError> {
        let line = self.current();
        if self.lines[line].words.is_empty() {
            return Ok(());
        }
        let line_top = self.cur_y;
        let x_height = measure::font(tree, self.block, cx.fonts)?.size * 0.5;

        let mut placements = Vec::with_capacity(self.lines[line].words.len());
        let mut baseline = line_top;
        for &w in &self.lines[line].words {
            let align = vertical_align(tree, w.box_id, self.block);
            let word = &tree[w.box_id].words[w.index];
            let ascent = if word.is_image() {
                word.height
            } else {
                tree[w.box_id]
                    .font
                    .as_ref()
                    .map_or(word.height * 0.75, |f| f.ascent)
            };
            if matches!(align, VerticalAlign::Baseline | VerticalAlign::Sub | VerticalAlign::Super) {
                baseline = baseline.max(line_top + ascent);
            }
            placements.push((w, align, ascent, word.height));
        }

        // Offsets relative to the line top.
        let mut offsets: Vec<f32> = placements
            .iter()
            .map(|&(_, align, ascent, height)| match align {
                VerticalAlign::Baseline => baseline - ascent - line_top,
                VerticalAlign::Sub => baseline - ascent + height * 0.2 - line_top,
                VerticalAlign::Super => baseline - ascent - height * 0.3 - line_top,
                VerticalAlign::Middle => baseline - x_height / 2.0 - height / 2.0 - line_top,
                _ => 0.0,
            })
            .collect();

        let lift = offsets.iter().copied().fold(0.0_f32, f32::min);
        for offset in &mut offsets {
            *offset -= lift;
        }

        let mut line_bottom = self.max_bottom;
        for (&(_, align, _, height), offset) in placements.iter().zip(&offsets) {
            if !matches!(align, VerticalAlign::Bottom | VerticalAlign::TextBottom) {
                line_bottom = line_bottom.max(line_top + offset + height);
            }
        }
        for ((w, align, _, height), offset) in placements.iter().zip(offsets.iter_mut()) {
            if matches!(align, VerticalAlign::Bottom | VerticalAlign::TextBottom) {
                *offset = (line_bottom - line_top - height).max(0.0);
            }
            let word = &mut tree[w.box_id].words[w.index];
            word.top += *offset;
            self.max_bottom = self.max_bottom.max(word.bottom());
        }
        Ok(())
    }

    /// Rectangles of every inline box with words on `line`, grown by each
    /// box's padding and border and propagated to inline ancestors.
    fn bubble_rectangles(&self, tree: &BoxTree, line: &mut LineBox, index: usize, cx: &LayoutContext<'_>) {
        for id in line.related_boxes.clone() {
            if id == self.block {
                continue;
            }
            let Some(bounds) = line
                .words_of(id)
                .map(|w| tree[w.box_id].words[w.index].bounds())
                .reduce(|a, b| a.union(&b))
            else {
                continue;
            };
            self.update_rectangle(tree, line, index, id, bounds, cx);
        }
    }

    fn update_rectangle(
        &self,
        tree: &BoxTree,
        line: &mut LineBox,
        index: usize,
        id: BoxId,
        bounds: Rect,
        cx: &LayoutContext<'_>,
    ) {
        let edges = measure::edges(tree, id, cx.fonts);
        let image = tree[id].kind == BoxKind::Image;
        let (first, last) = self.hosting.get(&id).copied().unwrap_or((index, index));

        let (mut l, mut t, mut r, mut b) = (bounds.left(), bounds.top(), bounds.right(), bounds.bottom());
        if first == index || image {
            l -= edges.inner_left();
        }
        if last == index || image {
            r += edges.inner_right();
        }
        if !image {
            t -= edges.inner_top();
            b += edges.inner_bottom();
        }
        let rect = Rect::from_ltrb(l, t, r, b);
        line.union_rectangle(id, rect);

        if let Some(parent) = tree.parent(id) {
            if parent != self.block && tree[parent].style.display.is_inline() {
                self.update_rectangle(tree, line, index, parent, rect, cx);
            }
        }
    }
}

/// Effective `vertical-align` of words owned by `id`: the nearest value
/// other than `baseline` on the way up to, not including, `block`.
fn vertical_align(tree: &BoxTree, id: BoxId, block: BoxId) -> VerticalAlign {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .take_while(|&b| b != block)
        .map(|b| tree[b].style.vertical_align)
        .find(|&a| a != VerticalAlign::Baseline)
        .unwrap_or_default()
}

/// [§ 16.2 Alignment: the 'text-align' property](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
///
/// "If an element has a computed value for 'text-align' of 'justify', ...
/// the last line of the block is aligned to the start edge."
fn align_horizontally(
    tree: &mut BoxTree,
    block: BoxId,
    line: &mut LineBox,
    client: Rect,
    indent: f32,
    is_last: bool,
    cx: &LayoutContext<'_>,
) {
    let Some(&last) = line.words.last() else {
        return;
    };
    let last_right = tree[last.box_id].words[last.index].right();
    let trailing = if last.box_id == block {
        0.0
    } else {
        measure::edges(tree, last.box_id, cx.fonts).inner_right()
    };
    let slack = client.right() - last_right - trailing;

    match tree[block].style.text_align {
        TextAlign::Right if slack > 0.0 => line.shift(tree, slack),
        TextAlign::Center if slack > 0.0 => line.shift(tree, slack / 2.0),
        TextAlign::Justify if !is_last && line.words.len() > 1 => {
            let text: f32 = line
                .words
                .iter()
                .map(|w| tree[w.box_id].words[w.index].width)
                .sum();
            let gaps = (line.words.len() - 1) as f32;
            let gap = (client.width - indent - text) / gaps;
            if gap <= 0.0 {
                return;
            }
            let mut x = client.left() + indent;
            for w in &line.words {
                let word = &mut tree[w.box_id].words[w.index];
                word.left = x;
                x = word.right() + gap;
            }
            let word = &mut tree[last.box_id].words[last.index];
            word.left = client.right() - word.width;
        }
        _ => {}
    }
}

/// Mirror word positions for right-to-left text: the whole line when the
/// block is `rtl`, otherwise the run of each `rtl` inline box.
fn apply_right_to_left(tree: &mut BoxTree, block: BoxId, line: &LineBox) {
    let mirror = |tree: &mut BoxTree, words: &[WordRef]| {
        let (Some(first), Some(last)) = (words.first(), words.last()) else {
            return;
        };
        let left = tree[first.box_id].words[first.index].left;
        let right = tree[last.box_id].words[last.index].right();
        for w in words {
            let word = &mut tree[w.box_id].words[w.index];
            let offset = word.left - left;
            word.left = right - offset - word.width;
        }
    };

    if tree[block].style.direction == Direction::Rtl {
        mirror(tree, &line.words);
        return;
    }
    for &id in &line.related_boxes {
        if tree[id].style.direction != Direction::Rtl {
            continue;
        }
        let Some(start) = line.words.iter().position(|w| w.box_id == id) else {
            continue;
        };
        let end = line.words.iter().rposition(|w| w.box_id == id).unwrap_or(start);
        if end > start {
            mirror(tree, &line.words[start..=end]);
        }
    }
}
