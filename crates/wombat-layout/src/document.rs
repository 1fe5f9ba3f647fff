//! The document root: owns the box tree and the per-document state that
//! layout and paint share.
//!
//! A [`Document`] drives whole-document passes. It serializes image
//! completions onto the thread that calls it: loaders answer into an
//! [`ImageQueue`], and results are applied only between passes, by
//! [`Document::process_image_completions`] or
//! [`Document::wait_for_images`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use wombat_common::report::{ErrorCategory, ErrorSink, TracingErrorSink};

use crate::error::{LayoutError, PaintError, TreeError};
use crate::font::{FontCache, FontProvider};
use crate::geometry::{EdgeSizes, Point, Rect, Size};
use crate::graphics::{GraphicsSurface, TextMeasure};
use crate::image::{CompletedLoad, ImageLoader, ImageQueue, ImageState, ImageTarget, NullImageLoader};
use crate::layout::line::WordRef;
use crate::layout::{LayoutContext, LayoutOutcome, layout_box, replaced};
use crate::measure;
use crate::paint::{PaintContext, PaintOutcome, paint_box};
use crate::snapshot::LayoutSnapshot;
use crate::style::Color;
use crate::tree::{BoxId, BoxTree, WordSelection};

/// Root width used to measure content when the document sizes to it.
const UNBOUNDED_WIDTH: f32 = 99_999.0;

/// Document-wide settings.
///
/// Every field has a default, so a settings file only needs to name what
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Page size for paged output; a zero height disables page breaks.
    pub page_size: Size,
    /// Page margins.
    pub margins: EdgeSizes,
    /// Position of the root box.
    pub location: Point,
    /// Maximum size. A width of zero or less sizes the document to its
    /// content.
    pub max_size: Size,
    /// Scroll offset added to everything except fixed boxes.
    pub scroll_offset: Point,
    /// Text color of selected glyphs; `None` keeps the text color.
    pub selection_fore_color: Option<Color>,
    /// Background of selected text.
    pub selection_back_color: Option<Color>,
    /// Family used when a box names none.
    pub default_font_family: String,
    /// Font size of the root box in pixels.
    pub default_font_size: f32,
    /// Load images synchronously during layout.
    pub avoid_async_image_loading: bool,
    /// Request background images at layout time instead of first paint.
    pub avoid_images_late_loading: bool,
    /// Draw rounded geometry without anti-aliasing.
    pub avoid_geometry_antialias: bool,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            page_size: Size::default(),
            margins: EdgeSizes::default(),
            location: Point::default(),
            max_size: Size::new(800.0, 0.0),
            scroll_offset: Point::default(),
            selection_fore_color: None,
            selection_back_color: None,
            default_font_family: "sans-serif".to_string(),
            default_font_size: 16.0,
            avoid_async_image_loading: false,
            avoid_images_late_loading: false,
            avoid_geometry_antialias: false,
        }
    }
}

impl DocumentSettings {
    /// Parse settings from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One end of a text selection: a character position inside a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    /// The word.
    pub word: WordRef,
    /// Character index inside the word; may equal its length.
    pub char_index: usize,
}

impl SelectionPoint {
    /// Character `char_index` of word `index` of `box_id`.
    #[must_use]
    pub const fn new(box_id: BoxId, index: usize, char_index: usize) -> Self {
        Self {
            word: WordRef { box_id, index },
            char_index,
        }
    }
}

/// A laid-out document and everything it owns.
pub struct Document {
    tree: BoxTree,
    settings: DocumentSettings,
    fonts: FontCache,
    text: Box<dyn TextMeasure>,
    loader: Box<dyn ImageLoader>,
    sink: Box<dyn ErrorSink>,
    queue: ImageQueue,
    actual_size: Size,
    refresh: Option<bool>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("boxes", &self.tree.len())
            .field("settings", &self.settings)
            .field("actual_size", &self.actual_size)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// A document over `tree`, measuring text with `text` and resolving
    /// fonts through `fonts`.
    ///
    /// Images are not loaded and errors are logged until
    /// [`Document::with_loader`] and [`Document::with_sink`] say otherwise.
    pub fn new(
        tree: BoxTree,
        settings: DocumentSettings,
        fonts: Box<dyn FontProvider>,
        text: Box<dyn TextMeasure>,
    ) -> Self {
        let fonts = FontCache::new(fonts, settings.default_font_family.clone(), settings.default_font_size);
        Self {
            tree,
            settings,
            fonts,
            text,
            loader: Box::new(NullImageLoader),
            sink: Box::new(TracingErrorSink),
            queue: ImageQueue::new(),
            actual_size: Size::default(),
            refresh: None,
        }
    }

    /// Use `loader` for images.
    #[must_use]
    pub fn with_loader(mut self, loader: Box<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Report content errors to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The box tree.
    #[must_use]
    pub const fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// The box tree, for mutation. Callers should request a layout
    /// refresh afterwards.
    pub fn tree_mut(&mut self) -> &mut BoxTree {
        &mut self.tree
    }

    /// Settings.
    #[must_use]
    pub const fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    /// Replace the settings. Font defaults only apply to fonts not yet
    /// cached.
    pub fn set_settings(&mut self, settings: DocumentSettings) {
        self.settings = settings;
        self.request_refresh(true);
    }

    /// The font cache.
    #[must_use]
    pub const fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    /// Size of the laid-out content from the last layout.
    #[must_use]
    pub const fn actual_size(&self) -> Size {
        self.actual_size
    }

    /// Ask the host to repaint, and to lay out again first when
    /// `layout` is set. Requests accumulate until taken.
    pub fn request_refresh(&mut self, layout: bool) {
        self.refresh = Some(self.refresh.unwrap_or(false) || layout);
        tracing::debug!(layout, "refresh requested");
    }

    /// Take the pending refresh request: `Some(true)` when layout is
    /// required, `Some(false)` for a repaint only.
    pub fn take_refresh(&mut self) -> Option<bool> {
        self.refresh.take()
    }

    /// Lay out the whole document and return the content size.
    ///
    /// With a `max_size` width of zero or less the document is laid out
    /// unbounded to measure its content, then again at that width.
    /// Synchronous image loads started during a pass are applied and the
    /// pass is repeated once.
    pub fn layout(&mut self) -> Result<Size, LayoutError> {
        let _span = tracing::debug_span!("layout", boxes = self.tree.len()).entered();

        let size_to_content = self.settings.max_size.width <= 0.0;
        let mut width = if size_to_content {
            UNBOUNDED_WIDTH
        } else {
            self.settings.max_size.width
        };

        let mut sync_loads = self.layout_pass(width)?;
        if size_to_content {
            width = self.actual_size.width.ceil().max(1.0);
            sync_loads += self.layout_pass(width)?;
        }
        if sync_loads > 0 && self.apply_completions(self.queue.drain()) {
            let _ = self.layout_pass(width)?;
        }
        if self.refresh == Some(true) {
            self.refresh = Some(false);
        }

        tracing::debug!(
            width = self.actual_size.width,
            height = self.actual_size.height,
            "document laid out"
        );
        Ok(self.actual_size)
    }

    fn layout_pass(&mut self, width: f32) -> Result<usize, LayoutError> {
        let root = self.tree.root();
        {
            let node = &mut self.tree[root];
            node.location = self.settings.location;
            node.size = Size::new(width, 0.0);
        }
        let mut cx = LayoutContext::new(
            &self.fonts,
            self.text.as_ref(),
            &self.settings,
            self.sink.as_ref(),
            self.loader.as_ref(),
            &self.queue,
        );
        if layout_box(&mut self.tree, root, &mut cx)? == LayoutOutcome::Failed {
            tracing::warn!("document root failed to lay out");
        }
        self.actual_size = cx.actual_size;
        Ok(cx.sync_loads)
    }

    /// Paint the document onto `g`.
    ///
    /// With a page size set, painting is clipped to the page inside its
    /// margins; fixed boxes are exempt.
    pub fn paint(&mut self, g: &mut dyn GraphicsSurface) -> Result<PaintOutcome, PaintError> {
        let _span = tracing::debug_span!("paint", boxes = self.tree.len()).entered();

        let page = self.settings.page_size;
        let paged = page.width > 0.0 && page.height > 0.0;
        if paged {
            let m = self.settings.margins;
            g.push_clip(Rect::new(m.left, m.top, page.width - m.horizontal(), page.height - m.vertical()));
        }
        let cx = PaintContext {
            fonts: &self.fonts,
            settings: &self.settings,
            sink: self.sink.as_ref(),
            loader: self.loader.as_ref(),
            queue: &self.queue,
        };
        let root = self.tree.root();
        let outcome = paint_box(&mut self.tree, root, g, &cx);
        if paged {
            g.pop_clip();
        }
        outcome
    }

    /// Apply image completions that have arrived. Returns whether any
    /// applied; if so a refresh is requested, with layout when a content
    /// image changed.
    pub fn process_image_completions(&mut self) -> bool {
        let completed = self.queue.drain();
        self.apply_completions(completed)
    }

    /// Block until every pending image load has completed or `timeout`
    /// passes, applying completions as they arrive. Returns whether any
    /// applied.
    pub fn wait_for_images(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut applied = self.process_image_completions();
        while self.pending_images() > 0 {
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(pending = self.pending_images(), "gave up waiting for images");
                break;
            }
            let Some(done) = self.queue.recv_timeout(deadline - now) else {
                break;
            };
            applied |= self.apply_completions(vec![done]);
        }
        applied
    }

    /// Number of image loads still in flight in the attached tree.
    #[must_use]
    pub fn pending_images(&self) -> usize {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .map(|id| {
                let node = &self.tree[id];
                usize::from(node.image.state() == ImageState::Loading)
                    + usize::from(node.background.state() == ImageState::Loading)
            })
            .sum()
    }

    fn apply_completions(&mut self, completed: Vec<CompletedLoad>) -> bool {
        let mut applied = false;
        let mut layout = false;
        for done in completed {
            if self.tree.get(done.box_id).is_none() {
                continue;
            }
            let failed = done.result.image.is_none();
            let slot = replaced::slot_mut(&mut self.tree, done.box_id, done.target);
            if !slot.apply(done.generation, done.result) {
                tracing::trace!(box_id = %done.box_id, generation = done.generation, "stale image completion");
                continue;
            }
            if failed || slot.state() == ImageState::Failed {
                self.sink
                    .report(ErrorCategory::Image, &format!("Image load failed for box {}", done.box_id), None);
            }
            if done.target == ImageTarget::Content {
                self.tree[done.box_id].invalidate_measure();
                layout = true;
            }
            applied = true;
        }
        if applied {
            self.request_refresh(layout);
        }
        applied
    }

    /// Select the text between two points, in document order.
    ///
    /// Any previous selection is cleared. Partially selected words get
    /// pixel offsets measured from their prefixes. Returns the number of
    /// words touched.
    pub fn select(&mut self, start: SelectionPoint, end: SelectionPoint) -> Result<usize, LayoutError> {
        self.clear_selection();

        let order = self.word_order();
        let position = |point: SelectionPoint| -> Result<usize, TreeError> {
            if self.tree.get(point.word.box_id).is_none() {
                return Err(TreeError::UnknownBox(point.word.box_id));
            }
            order
                .iter()
                .position(|&w| w == point.word)
                .ok_or(TreeError::UnknownWord {
                    box_id: point.word.box_id,
                    index: point.word.index,
                })
        };
        let (mut first, mut last) = (position(start)?, position(end)?);
        let (mut start, mut end) = (start, end);
        if first > last || (first == last && start.char_index > end.char_index) {
            std::mem::swap(&mut first, &mut last);
            std::mem::swap(&mut start, &mut end);
        }

        let mut touched = 0;
        for (i, &word_ref) in order.iter().enumerate().take(last + 1).skip(first) {
            let content = self.tree[word_ref.box_id].words[word_ref.index].content().to_string();
            let chars = content.chars().count();
            let from = if i == first { start.char_index.min(chars) } else { 0 };
            let to = if i == last { end.char_index.min(chars) } else { chars };
            if from >= to {
                continue;
            }
            let font = measure::font(&self.tree, word_ref.box_id, &self.fonts)?;
            let start_offset = self.text.measure_prefix(&content, &font, from);
            let end_offset = self.text.measure_prefix(&content, &font, to);
            self.tree[word_ref.box_id].words[word_ref.index].selection = Some(WordSelection {
                start_index: from,
                end_index: to,
                start_offset,
                end_offset,
            });
            touched += 1;
        }
        self.request_refresh(false);
        Ok(touched)
    }

    /// Remove any selection.
    pub fn clear_selection(&mut self) {
        let mut cleared = false;
        for id in self.tree.descendants(self.tree.root()) {
            for word in &mut self.tree[id].words {
                cleared |= word.selection.take().is_some();
            }
        }
        if cleared {
            self.request_refresh(false);
        }
    }

    /// Selected text, words joined as they were spaced in the source.
    #[must_use]
    pub fn selected_text(&self) -> String {
        let mut out = String::new();
        for word_ref in self.word_order() {
            let word = &self.tree[word_ref.box_id].words[word_ref.index];
            let Some(selection) = word.selection else {
                continue;
            };
            let text: String = word
                .content()
                .chars()
                .skip(selection.start_index)
                .take(selection.end_index - selection.start_index)
                .collect();
            out.push_str(&text);
            if word.has_space_after && selection.end_index == word.content().chars().count() {
                out.push(' ');
            }
        }
        out.trim_end().to_string()
    }

    /// Text words of the attached tree in document order.
    fn word_order(&self) -> Vec<WordRef> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .flat_map(|box_id| {
                self.tree[box_id]
                    .words
                    .iter()
                    .enumerate()
                    .filter(|(_, w)| !w.is_line_break() && !w.is_image())
                    .map(move |(index, _)| WordRef { box_id, index })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Snapshot of the current geometry.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::capture(&self.tree)
    }

    /// Release every resource: in-flight loads are cancelled, cached
    /// images and fonts dropped, and queued completions discarded.
    pub fn dispose(&mut self) {
        self.tree.dispose();
        self.fonts.clear();
        let discarded = self.queue.drain().len();
        self.refresh = None;
        tracing::debug!(discarded, "document disposed");
    }
}
