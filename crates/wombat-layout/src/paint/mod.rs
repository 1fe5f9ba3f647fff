//! Paint dispatch.
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! [`paint_box`] draws one box and its subtree onto a [`GraphicsSurface`]:
//! for each of the box's paint rectangles the background and then the
//! borders, then its words, then its text decorations. Children follow in
//! three passes (static, absolute, fixed), which approximates the stacking
//! order without a z-index model.

mod background;
mod borders;

use wombat_common::report::{ErrorCategory, ErrorSink};

use crate::document::DocumentSettings;
use crate::error::PaintError;
use crate::font::{Font, FontCache};
use crate::geometry::{Point, Rect};
use crate::graphics::{Brush, GraphicsSurface, Pen};
use crate::image::{ImageLoader, ImageQueue, ImageState};
use crate::layout::line::{LineBox, WordRef};
use crate::measure;
use crate::style::{Color, Direction, DisplayKind, Overflow, Position, TextDecoration, Visibility};
use crate::tree::{BoxId, BoxKind, BoxTree, Word, WordSelection};

/// Selection background used when the document sets none.
pub const DEFAULT_SELECTION_BACK: Color = Color::rgba(51, 153, 255, 169);

const ERROR_FRAME: Color = Color::rgb(0xA0, 0xA0, 0xA0);
const ERROR_CROSS: Color = Color::rgb(0xE3, 0xE3, 0xE3);
const FRAME_PANEL: Color = Color::rgb(0xF0, 0xF0, 0xF0);

/// Smallest image box that gets the error cross.
const MIN_ERROR_MARK: f32 = 19.0;

/// Everything a paint pass needs besides the tree and the surface.
pub struct PaintContext<'a> {
    /// Shared font cache.
    pub fonts: &'a FontCache,
    /// Document settings.
    pub settings: &'a DocumentSettings,
    /// Where content errors go.
    pub sink: &'a dyn ErrorSink,
    /// Loader for background images requested at paint time.
    pub loader: &'a dyn ImageLoader,
    /// Completion queue the loader answers into.
    pub queue: &'a ImageQueue,
}

/// Result of painting one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    /// The subtree was painted.
    Complete,
    /// A content error was reported and the rest of the subtree skipped.
    Failed,
}

/// Paint `id` and its subtree.
///
/// Content errors are reported to the sink as "Exception in box paint" and
/// yield [`PaintOutcome::Failed`]; structural errors propagate.
pub fn paint_box(
    tree: &mut BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    cx: &PaintContext<'_>,
) -> Result<PaintOutcome, PaintError> {
    match paint_box_inner(tree, id, g, cx) {
        Ok(()) => Ok(PaintOutcome::Complete),
        Err(err) if err.is_structural() => Err(err),
        Err(err) => {
            cx.sink
                .report(ErrorCategory::Paint, "Exception in box paint", Some(&err));
            Ok(PaintOutcome::Failed)
        }
    }
}

fn paint_box_inner(
    tree: &mut BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let node = tree.node(id)?;
    if node.style.display == DisplayKind::None || node.style.visibility != Visibility::Visible {
        return Ok(());
    }

    // Page margins must not clip fixed boxes.
    let fixed = node.is_fixed();
    if fixed {
        g.suspend_clipping();
    }
    let result = paint_visible(tree, id, g, cx);
    if fixed {
        g.resume_clipping();
    }
    result
}

fn paint_visible(
    tree: &mut BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let offset = scroll_offset(tree, id, cx);
    if !is_in_clip(tree, id, g, offset, cx)? {
        return Ok(());
    }

    let clipped = clip_by_overflow(tree, id, g, offset, cx)?;
    let result = paint_content(tree, id, g, offset, cx).and_then(|()| paint_children(tree, id, g, cx));
    if clipped {
        g.pop_clip();
    }
    result?;

    if let Some(marker) = tree[id].list_marker {
        let _ = paint_box(tree, marker, g, cx)?;
    }
    Ok(())
}

/// Scroll offset applied to `id`; boxes inside a fixed box do not scroll.
fn scroll_offset(tree: &BoxTree, id: BoxId, cx: &PaintContext<'_>) -> Point {
    let fixed = std::iter::once(id)
        .chain(tree.ancestors(id))
        .any(|b| tree[b].is_fixed());
    if fixed {
        Point::default()
    } else {
        cx.settings.scroll_offset
    }
}

/// Whether any paint rectangle of `id` shows inside both the current clip
/// and its containing block. Boxes without rectangles always paint.
fn is_in_clip(
    tree: &BoxTree,
    id: BoxId,
    g: &dyn GraphicsSurface,
    offset: Point,
    cx: &PaintContext<'_>,
) -> Result<bool, PaintError> {
    let node = &tree[id];
    if node.rectangles.is_empty() || node.parent().is_none() {
        return Ok(true);
    }
    let cb = tree.containing_block(id)?;
    let client = measure::client_rect(tree, cb, cx.fonts);
    let area = Rect::new(client.x - 2.0, client.y, client.width + 2.0, client.height)
        .offset(offset.x, offset.y)
        .intersect(&g.clip());
    Ok(node
        .rectangles
        .iter()
        .any(|r| r.offset(offset.x, offset.y).intersects(&area)))
}

/// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
///
/// "hidden: This value indicates that the content is clipped and that no
/// scrolling user interface should be provided to view the content outside
/// the clipping region."
///
/// Pushes the client rectangle of the nearest containing block with hidden
/// overflow. Returns whether a clip was pushed.
fn clip_by_overflow(
    tree: &BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    offset: Point,
    cx: &PaintContext<'_>,
) -> Result<bool, PaintError> {
    if tree[id].parent().is_none() {
        return Ok(false);
    }
    let mut cb = tree.containing_block(id)?;
    loop {
        if tree[cb].style.overflow == Overflow::Hidden {
            let client = measure::client_rect(tree, cb, cx.fonts);
            g.push_clip(client.offset(offset.x, offset.y));
            return Ok(true);
        }
        if tree[cb].parent().is_none() {
            return Ok(false);
        }
        cb = tree.containing_block(cb)?;
    }
}

fn paint_content(
    tree: &mut BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    offset: Point,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let node = &tree[id];
    let areas: Vec<Rect> = if node.rectangles.is_empty() {
        vec![node.bounds()]
    } else {
        node.rectangles.clone()
    };
    let areas: Vec<Rect> = areas.iter().map(|r| r.offset(offset.x, offset.y)).collect();

    // STEP 1: background and borders per rectangle.
    let last = areas.len().saturating_sub(1);
    for (i, &area) in areas.iter().enumerate() {
        if !area.intersects(&g.clip()) {
            continue;
        }
        background::paint_background(tree, id, g, area, i == 0, cx)?;
        borders::paint_borders(tree, id, g, area, i == 0, i == last, cx);
    }

    // STEP 2: content.
    match tree[id].kind {
        BoxKind::Image => paint_image(tree, id, g, offset, cx)?,
        BoxKind::Frame => paint_frame(tree, id, g, offset, cx),
        _ => paint_words(tree, id, g, offset, cx)?,
    }

    // STEP 3: decorations.
    paint_decorations(tree, id, g, offset, cx)?;
    Ok(())
}

/// Children in three passes: in flow, absolute, fixed.
fn paint_children(
    tree: &mut BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let children = tree.children(id).to_vec();
    for pass in [Position::Static, Position::Absolute, Position::Fixed] {
        for &child in &children {
            let position = match tree[child].style.position {
                Position::Relative => Position::Static,
                other => other,
            };
            if position == pass {
                let _ = paint_box(tree, child, g, cx)?;
            }
        }
    }
    Ok(())
}

fn paint_words(
    tree: &BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    offset: Point,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let node = &tree[id];
    if node.words.iter().all(|w| w.is_line_break() || w.is_image()) {
        return Ok(());
    }
    let font = measure::font(tree, id, cx.fonts)?;
    let color = node.style.color;
    let rtl = node.style.direction == Direction::Rtl;

    for (index, word) in node.words.iter().enumerate() {
        if word.is_line_break() || word.is_image() {
            continue;
        }
        let rect = word.bounds().offset(offset.x, offset.y);
        if !rect.intersects(&g.clip()) {
            continue;
        }
        match word.selection {
            Some(selection) => {
                let word_ref = WordRef { box_id: id, index };
                let painter = WordPainter { word, font: &font, rect, rtl };
                painter.paint_selected(tree, word_ref, selection, color, g, cx);
            }
            None => draw_word(g, word, &font, color, rect, rtl),
        }
    }
    Ok(())
}

fn draw_word(g: &mut dyn GraphicsSurface, word: &Word, font: &Font, color: Color, rect: Rect, rtl: bool) {
    g.draw_string(
        word.content(),
        font,
        color,
        Point::new(rect.x, rect.y),
        rect.size(),
        rtl,
    );
}

/// A word being drawn, with its resolved font and on-surface rectangle.
struct WordPainter<'w> {
    word: &'w Word,
    font: &'w Font,
    rect: Rect,
    rtl: bool,
}

impl WordPainter<'_> {
    /// Draw the selection highlight, then the glyphs. With a selection
    /// foreground color and a partial selection, the glyphs are drawn
    /// twice: outside the highlight in the text color, inside it in the
    /// selection color.
    fn paint_selected(
        &self,
        tree: &BoxTree,
        word_ref: WordRef,
        selection: WordSelection,
        color: Color,
        g: &mut dyn GraphicsSurface,
        cx: &PaintContext<'_>,
    ) {
        let line = owning_line(tree, word_ref);
        let height = line.map_or(0.0, LineBox::line_height).max(self.rect.height);
        let is_last = line.is_none_or(|l| l.is_last_selected_word(tree, word_ref));
        let end = if is_last {
            selection.end_offset
        } else {
            let spacing = if self.word.has_space_after {
                g.measure_string(" ", self.font).width
            } else {
                0.0
            };
            self.rect.width + spacing
        };
        let highlight = Rect::new(
            self.rect.x + selection.start_offset,
            self.rect.y,
            (end - selection.start_offset).max(0.0),
            height,
        );
        let back = cx.settings.selection_back_color.unwrap_or(DEFAULT_SELECTION_BACK);
        g.fill_rectangle(&Brush::Solid(back), highlight);

        let partial = selection.start_offset > 0.0 || selection.end_offset < self.rect.width;
        match cx.settings.selection_fore_color {
            Some(fore) if partial => {
                g.push_clip_exclude(highlight);
                draw_word(g, self.word, self.font, color, self.rect, self.rtl);
                g.pop_clip();
                g.push_clip(highlight);
                draw_word(g, self.word, self.font, fore, self.rect, self.rtl);
                g.pop_clip();
            }
            Some(fore) => draw_word(g, self.word, self.font, fore, self.rect, self.rtl),
            None => draw_word(g, self.word, self.font, color, self.rect, self.rtl),
        }
    }
}

/// The line box that holds `word`, found on the owner or its ancestors.
fn owning_line(tree: &BoxTree, word: WordRef) -> Option<&LineBox> {
    std::iter::once(word.box_id)
        .chain(tree.ancestors(word.box_id))
        .flat_map(|b| tree[b].line_boxes.iter())
        .find(|line| line.words.contains(&word))
}

/// Image content: the loaded image, or a placeholder for a pending or
/// failed load.
fn paint_image(
    tree: &BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    offset: Point,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let node = &tree[id];
    let Some(word) = node.words.first() else {
        return Ok(());
    };
    let edges = measure::edges(tree, id, cx.fonts);
    let rect = Rect::new(
        word.left,
        word.top + edges.inner_top(),
        word.width,
        word.height - edges.inner_top() - edges.inner_bottom(),
    )
    .offset(offset.x, offset.y);

    match node.image.state() {
        ImageState::Loaded => {
            if let Some(image) = node.image.image() {
                g.draw_image(image, rect, node.image.source_rect())?;
            }
        }
        ImageState::Failed => {
            if rect.width > MIN_ERROR_MARK && rect.height > MIN_ERROR_MARK {
                let frame = Pen::solid(ERROR_FRAME, 2.0);
                g.draw_rectangle(&frame, Rect::new(rect.x + 1.0, rect.y + 1.0, rect.width - 2.0, rect.height - 2.0));
                let cross = Pen::solid(ERROR_CROSS, 2.0);
                let inner = Rect::new(rect.x + 4.0, rect.y + 4.0, rect.width - 8.0, rect.height - 8.0);
                g.draw_line(&cross, Point::new(inner.left(), inner.top()), Point::new(inner.right(), inner.bottom()));
                g.draw_line(&cross, Point::new(inner.right(), inner.top()), Point::new(inner.left(), inner.bottom()));
            }
        }
        ImageState::NotRequested | ImageState::Loading => {
            g.draw_rectangle(&Pen::solid(Color::LIGHT_GRAY, 1.0), rect);
        }
    }
    Ok(())
}

/// Frames are not rendered; they show as a framed panel.
fn paint_frame(tree: &BoxTree, id: BoxId, g: &mut dyn GraphicsSurface, offset: Point, cx: &PaintContext<'_>) {
    let Some(word) = tree[id].words.first() else {
        return;
    };
    let edges = measure::edges(tree, id, cx.fonts);
    let rect = Rect::new(
        word.left,
        word.top + edges.inner_top(),
        word.width,
        word.height - edges.inner_top() - edges.inner_bottom(),
    )
    .offset(offset.x, offset.y);
    g.fill_rectangle(&Brush::Solid(FRAME_PANEL), rect);
    g.draw_rectangle(&Pen::solid(Color::LIGHT_GRAY, 1.0), rect);
}

/// [§ 16.3.1 Underlining, overlining, striking, and blinking](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
///
/// Drawn for boxes that own text; an underlined inline element's text
/// boxes carry the decoration themselves.
fn paint_decorations(
    tree: &BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    offset: Point,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let node = &tree[id];
    let decoration = node.style.text_decoration;
    if decoration == TextDecoration::None || node.kind.is_replaced() {
        return Ok(());
    }
    let text_words: Vec<&Word> = node
        .words
        .iter()
        .filter(|w| !w.is_line_break() && !w.is_spaces())
        .collect();
    if text_words.is_empty() {
        return Ok(());
    }

    let font = measure::font(tree, id, cx.fonts)?;
    let pen = Pen::solid(node.style.color, 1.0);

    // (left, right, content top, content bottom) of each decorated span.
    let spans: Vec<(f32, f32, f32, f32)> = if node.rectangles.is_empty() {
        text_words
            .iter()
            .map(|w| (w.left, w.right(), w.top, w.bottom()))
            .collect()
    } else {
        let edges = measure::edges(tree, id, cx.fonts);
        let last = node.rectangles.len() - 1;
        node.rectangles
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let left = if i == 0 { r.left() + edges.inner_left() } else { r.left() };
                let right = if i == last { r.right() - edges.inner_right() } else { r.right() };
                (left, right, r.top() + edges.inner_top(), r.bottom() - edges.inner_bottom())
            })
            .collect()
    };

    for (left, right, top, bottom) in spans {
        let y = match decoration {
            TextDecoration::Underline => top + font.ascent + font.underline_offset,
            TextDecoration::LineThrough => (top + bottom) / 2.0,
            TextDecoration::Overline => top,
            TextDecoration::None => continue,
        };
        g.draw_line(
            &pen,
            Point::new(left + offset.x, y + offset.y),
            Point::new(right + offset.x, y + offset.y),
        );
    }
    Ok(())
}
