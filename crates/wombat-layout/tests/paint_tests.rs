//! Tests for paint dispatch, recorded through `RecordingSurface`.

use std::rc::Rc;

use wombat_common::image::LoadedImage;
use wombat_common::report::{CollectingErrorSink, ErrorCategory};
use wombat_layout::paint::DEFAULT_SELECTION_BACK;
use wombat_layout::{
    ApproximateFontProvider, BoxId, Brush, Color, DashStyle, Document, DocumentSettings,
    DrawCommand, EdgeSizes, Font, GraphicsError, GraphicsSurface, PaintOutcome, Path, Pen, Point,
    Rect, RecordingSurface, SelectionPoint, Size, StaticImageLoader, TextMeasure, tree_from_json,
};

const WIDTH: f32 = 400.0;

fn document(json: &str, settings: DocumentSettings) -> Document {
    let tree = tree_from_json(json).expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(WIDTH, 0.0),
        ..settings
    };
    Document::new(
        tree,
        settings,
        Box::new(ApproximateFontProvider),
        Box::new(RecordingSurface::new(WIDTH, 600.0)),
    )
}

fn paint(doc: &mut Document) -> RecordingSurface {
    let _ = doc.layout().expect("layout");
    let mut surface = RecordingSurface::new(WIDTH, 600.0);
    let outcome = doc.paint(&mut surface).expect("paint");
    assert_eq!(outcome, PaintOutcome::Complete);
    assert_eq!(surface.clip_depth(), 0, "clips are balanced after paint");
    surface
}

fn paint_json(json: &str) -> RecordingSurface {
    paint(&mut document(json, DocumentSettings::default()))
}

/// Index of the first command matching `pred`.
fn position(surface: &RecordingSurface, pred: impl Fn(&DrawCommand) -> bool) -> Option<usize> {
    surface.commands().iter().position(pred)
}

fn text_box(doc: &Document, path: &[usize]) -> BoxId {
    path.iter()
        .fold(doc.tree().root(), |id, &i| doc.tree().children(id)[i])
}

// ---------------------------------------------------------------------------
// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
// ---------------------------------------------------------------------------

#[test]
fn test_words_are_drawn_in_order() {
    let surface = paint_json(r#"{"tag": "p", "children": [{"text": "hello world"}]}"#);
    assert_eq!(surface.texts(), ["hello", "world"]);
}

#[test]
fn test_children_paint_in_three_passes() {
    let surface = paint_json(
        r#"{"tag": "div", "children": [
            {"tag": "div", "style": {"position": "fixed"}, "children": [{"text": "fixed"}]},
            {"tag": "div", "style": {"position": "absolute"}, "children": [{"text": "absolute"}]},
            {"tag": "div", "style": {"position": "relative"}, "children": [{"text": "relative"}]},
            {"tag": "div", "children": [{"text": "static"}]}
        ]}"#,
    );
    assert_eq!(
        surface.texts(),
        ["relative", "static", "absolute", "fixed"],
        "in-flow boxes first, then absolute, then fixed"
    );
}

#[test]
fn test_background_before_borders_before_text() {
    let surface = paint_json(
        r#"{"tag": "div", "style": {"background-color": "red", "border": "2px solid black"},
            "children": [{"text": "boxed"}]}"#,
    );
    let fill = position(&surface, |c| {
        matches!(c, DrawCommand::FillRect { brush: Brush::Solid(color), .. } if *color == Color::rgb(255, 0, 0))
    })
    .expect("background fill");
    let border = position(&surface, |c| matches!(c, DrawCommand::Line { pen, .. } if pen.width == 2.0))
        .expect("border line");
    let text = position(&surface, |c| matches!(c, DrawCommand::Text { .. })).expect("text");
    assert!(fill < border && border < text, "order was {fill}, {border}, {text}");
}

#[test]
fn test_solid_border_draws_four_sides() {
    let surface = paint_json(
        r#"{"tag": "div", "style": {"border": "3px dashed blue", "height": "20px"}}"#,
    );
    let sides = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Line { pen, .. } if pen.width == 3.0 && pen.dash == DashStyle::Dash))
        .count();
    assert_eq!(sides, 4);
}

#[test]
fn test_inset_border_uses_bevels() {
    let surface = paint_json(r#"{"tag": "div", "style": {"border": "4px inset gray", "height": "20px"}}"#);
    let bevels = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::FillPolygon { points, .. } if points.len() == 4))
        .count();
    assert_eq!(bevels, 4, "one trapezoid per side");
}

#[test]
fn test_rounded_background_fills_a_path() {
    let surface = paint_json(
        r#"{"tag": "div", "style": {"background-color": "blue", "corner-radius": "5px", "height": "20px"}}"#,
    );
    assert!(
        position(&surface, |c| matches!(c, DrawCommand::FillPath { .. })).is_some(),
        "rounded corners need a path fill"
    );
    assert!(position(&surface, |c| matches!(c, DrawCommand::FillRect { .. })).is_none());
}

#[test]
fn test_gradient_background() {
    let surface = paint_json(
        r#"{"tag": "div", "style": {"background-color": "white", "background-gradient": "black", "height": "20px"}}"#,
    );
    let gradient = surface.commands().iter().find_map(|c| match c {
        DrawCommand::FillRect {
            brush: Brush::LinearGradient { start, end, .. },
            ..
        } => Some((*start, *end)),
        _ => None,
    });
    assert_eq!(gradient, Some((Color::WHITE, Color::BLACK)));
}

#[test]
fn test_hidden_boxes_are_not_painted() {
    let surface = paint_json(
        r#"{"tag": "div", "children": [
            {"tag": "div", "style": {"visibility": "hidden"}, "children": [{"text": "hidden"}]},
            {"tag": "div", "style": {"display": "none"}, "children": [{"text": "gone"}]},
            {"tag": "div", "children": [{"text": "shown"}]}
        ]}"#,
    );
    assert_eq!(surface.texts(), ["shown"]);
}

#[test]
fn test_overflow_hidden_pushes_a_clip() {
    let surface = paint_json(
        r#"{"tag": "div", "style": {"overflow": "hidden", "height": "10px"},
            "children": [{"tag": "div", "children": [{"text": "inside"}]}]}"#,
    );
    let push = position(&surface, |c| matches!(c, DrawCommand::PushClip(_))).expect("clip pushed");
    let text = position(&surface, |c| matches!(c, DrawCommand::Text { .. })).expect("text drawn");
    let pop = position(&surface, |c| matches!(c, DrawCommand::PopClip)).expect("clip popped");
    assert!(push < text && text < pop);
}

#[test]
fn test_paged_output_clips_to_margins() {
    let settings = DocumentSettings {
        page_size: Size::new(WIDTH, 300.0),
        margins: EdgeSizes::uniform(10.0),
        ..DocumentSettings::default()
    };
    let surface = paint(&mut document(r#"{"tag": "p", "children": [{"text": "paged"}]}"#, settings));
    assert_eq!(
        surface.commands().first(),
        Some(&DrawCommand::PushClip(Rect::new(10.0, 10.0, WIDTH - 20.0, 280.0)))
    );
    assert_eq!(surface.commands().last(), Some(&DrawCommand::PopClip));
}

#[test]
fn test_scroll_offset_moves_content_but_not_fixed_boxes() {
    let settings = DocumentSettings {
        scroll_offset: Point::new(0.0, -50.0),
        ..DocumentSettings::default()
    };
    let mut doc = document(
        r#"{"tag": "div", "style": {"margin-top": "100px"}, "children": [
            {"tag": "div", "children": [{"text": "scrolled"}]},
            {"tag": "div", "style": {"position": "fixed", "top": "5px"}, "children": [{"text": "pinned"}]}
        ]}"#,
        settings,
    );
    let surface = paint(&mut doc);
    let origin = |text: &str| {
        surface
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Text { text: t, origin, .. } if t == text => Some(*origin),
                _ => None,
            })
            .unwrap_or_else(|| panic!("{text} not drawn"))
    };
    assert!((origin("scrolled").y - 50.0).abs() < 0.5, "scrolled text moves up by 50");
    assert!((origin("pinned").y - 5.0).abs() < 0.5, "fixed text stays put");
}

// ---------------------------------------------------------------------------
// Text selection
// ---------------------------------------------------------------------------

#[test]
fn test_selected_words_get_a_highlight() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "hello world"}]}"#, DocumentSettings::default());
    let _ = doc.layout().expect("layout");
    let text = text_box(&doc, &[0, 0]);
    let touched = doc
        .select(SelectionPoint::new(text, 0, 0), SelectionPoint::new(text, 1, 5))
        .expect("select");
    assert_eq!(touched, 2);
    assert_eq!(doc.selected_text(), "hello world");

    let surface = paint(&mut doc);
    let highlights = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::FillRect { brush: Brush::Solid(color), .. } if *color == DEFAULT_SELECTION_BACK))
        .count();
    assert_eq!(highlights, 2, "one highlight per selected word");
    assert_eq!(surface.texts(), ["hello", "world"]);
}

#[test]
fn test_partial_selection_splits_glyphs() {
    let settings = DocumentSettings {
        selection_fore_color: Some(Color::WHITE),
        ..DocumentSettings::default()
    };
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "hello world"}]}"#, settings);
    let _ = doc.layout().expect("layout");
    let text = text_box(&doc, &[0, 0]);
    let _ = doc
        .select(SelectionPoint::new(text, 0, 1), SelectionPoint::new(text, 0, 3))
        .expect("select");
    assert_eq!(doc.selected_text(), "el");

    let surface = paint(&mut doc);
    assert!(position(&surface, |c| matches!(c, DrawCommand::PushClipExclude(_))).is_some());
    assert_eq!(surface.texts(), ["hello", "hello", "world"], "selected word drawn twice");
    let highlight = surface.commands().iter().find_map(|c| match c {
        DrawCommand::FillRect { brush: Brush::Solid(color), rect } if *color == DEFAULT_SELECTION_BACK => Some(*rect),
        _ => None,
    });
    let highlight = highlight.expect("highlight");
    assert!((highlight.width - 2.0 * 9.6).abs() < 0.5, "two characters highlighted, got {}", highlight.width);
}

#[test]
fn test_reversed_selection_is_normalized() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "one two three"}]}"#, DocumentSettings::default());
    let _ = doc.layout().expect("layout");
    let text = text_box(&doc, &[0, 0]);
    let _ = doc
        .select(SelectionPoint::new(text, 2, 2), SelectionPoint::new(text, 0, 1))
        .expect("select");
    assert_eq!(doc.selected_text(), "ne two th");

    doc.clear_selection();
    assert_eq!(doc.selected_text(), "");
}

// ---------------------------------------------------------------------------
// [§ 16.3.1 Underlining, overlining, striking, and blinking](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
// ---------------------------------------------------------------------------

fn lines(surface: &RecordingSurface) -> Vec<(Point, Point)> {
    surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Line { from, to, pen } if pen.width == 1.0 => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_underline_drawn_once_below_baseline() {
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "u", "children": [{"text": "under"}]}]}"#,
        DocumentSettings::default(),
    );
    let surface = paint(&mut doc);
    let underlines = lines(&surface);
    assert_eq!(underlines.len(), 1, "decoration is not doubled: {underlines:?}");
    let word = doc.snapshot().boxes.iter().flat_map(|b| b.words.clone()).next().expect("word").bounds;
    let (from, to) = underlines[0];
    // ascent 0.9em plus underline offset 0.1em
    assert!((from.y - (word.y + 16.0)).abs() < 0.5, "underline at {} for word top {}", from.y, word.y);
    assert!(to.x >= from.x + word.width - 0.5, "underline spans the word");
}

#[test]
fn test_line_through_at_middle() {
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "s", "children": [{"text": "struck"}]}]}"#,
        DocumentSettings::default(),
    );
    let surface = paint(&mut doc);
    let struck = lines(&surface);
    assert_eq!(struck.len(), 1);
    let word = doc.snapshot().boxes.iter().flat_map(|b| b.words.clone()).next().expect("word").bounds;
    let middle = word.y + word.height / 2.0;
    assert!((struck[0].0.y - middle).abs() < 0.5, "line-through at {} not {middle}", struck[0].0.y);
}

// ---------------------------------------------------------------------------
// Replaced content
// ---------------------------------------------------------------------------

fn paint_sync(json: &str) -> RecordingSurface {
    let settings = DocumentSettings {
        avoid_async_image_loading: true,
        ..DocumentSettings::default()
    };
    paint(&mut document(json, settings))
}

#[test]
fn test_pending_image_draws_outline() {
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "later.png"}}]}"#,
        DocumentSettings::default(),
    );
    let surface = paint(&mut doc);
    assert!(
        position(&surface, |c| matches!(c, DrawCommand::StrokeRect { pen, .. } if pen.color == Color::LIGHT_GRAY)).is_some(),
        "an image still loading shows its outline"
    );
    assert!(doc.process_image_completions(), "the failed load is queued");
    assert_eq!(doc.take_refresh(), Some(true), "a content image change needs layout");
}

#[test]
fn test_failed_image_draws_error_mark() {
    let surface = paint_sync(r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "nope.png"}}]}"#);
    let frames = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::StrokeRect { pen, .. } if pen.color == Color::rgb(0xA0, 0xA0, 0xA0)))
        .count();
    let cross = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Line { pen, .. } if pen.color == Color::rgb(0xE3, 0xE3, 0xE3)))
        .count();
    assert_eq!((frames, cross), (1, 2), "frame and cross for a failed image");
}

#[test]
fn test_small_failed_image_draws_nothing() {
    let surface = paint_sync(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "nope.png", "width": "10", "height": "10"}}]}"#,
    );
    assert!(
        position(&surface, |c| matches!(c, DrawCommand::StrokeRect { .. } | DrawCommand::Line { .. })).is_none(),
        "no mark fits a 10px image"
    );
}

#[test]
fn test_loaded_image_is_drawn() {
    let settings = DocumentSettings {
        avoid_async_image_loading: true,
        ..DocumentSettings::default()
    };
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "dot.png"}}]}"#,
        settings,
    )
    .with_loader(Box::new(
        StaticImageLoader::new().with_image("dot.png", LoadedImage::solid(30, 20, [0, 255, 0, 255])),
    ));
    let surface = paint(&mut doc);
    let dest = surface.commands().iter().find_map(|c| match c {
        DrawCommand::Image { dest, .. } => Some(*dest),
        _ => None,
    });
    let dest = dest.expect("image drawn");
    assert!((dest.width - 30.0).abs() < 0.5 && (dest.height - 20.0).abs() < 0.5, "got {dest:?}");
}

#[test]
fn test_frame_draws_panel() {
    let surface = paint_json(r#"{"tag": "div", "children": [{"tag": "iframe"}]}"#);
    assert!(position(&surface, |c| {
        matches!(c, DrawCommand::FillRect { brush: Brush::Solid(color), .. } if *color == Color::rgb(0xF0, 0xF0, 0xF0))
    })
    .is_some());
}

#[test]
fn test_background_image_tiles_inside_a_clip() {
    let settings = DocumentSettings {
        avoid_async_image_loading: true,
        avoid_images_late_loading: true,
        ..DocumentSettings::default()
    };
    let mut doc = document(
        r#"{"tag": "div", "style": {"background-image": "url(tile.png)", "width": "40px", "height": "10px"}}"#,
        settings,
    )
    .with_loader(Box::new(
        StaticImageLoader::new().with_image("tile.png", LoadedImage::solid(10, 10, [0, 0, 255, 255])),
    ));
    let surface = paint(&mut doc);
    let tiles = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Image { .. }))
        .count();
    assert_eq!(tiles, 4, "a 40x10 box holds four 10x10 tiles");
    assert!(position(&surface, |c| matches!(c, DrawCommand::PushClip(_))).is_some());
}


/// Records like [`RecordingSurface`] but refuses every image.
struct ImageRejectingSurface(RecordingSurface);

impl TextMeasure for ImageRejectingSurface {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        self.0.measure_string(text, font)
    }
}

impl GraphicsSurface for ImageRejectingSurface {
    fn draw_string(&mut self, text: &str, font: &Font, color: Color, origin: Point, size: Size, rtl: bool) {
        self.0.draw_string(text, font, color, origin, size, rtl);
    }
    fn draw_line(&mut self, pen: &Pen, from: Point, to: Point) {
        self.0.draw_line(pen, from, to);
    }
    fn draw_rectangle(&mut self, pen: &Pen, rect: Rect) {
        self.0.draw_rectangle(pen, rect);
    }
    fn fill_rectangle(&mut self, brush: &Brush, rect: Rect) {
        self.0.fill_rectangle(brush, rect);
    }
    fn draw_path(&mut self, pen: &Pen, path: &Path) {
        self.0.draw_path(pen, path);
    }
    fn fill_path(&mut self, brush: &Brush, path: &Path) {
        self.0.fill_path(brush, path);
    }
    fn fill_polygon(&mut self, brush: &Brush, points: &[Point]) {
        self.0.fill_polygon(brush, points);
    }
    fn draw_image(&mut self, _image: &LoadedImage, _dest: Rect, _source: Option<Rect>) -> Result<(), GraphicsError> {
        Err(GraphicsError::InvalidImage("rejected".to_string()))
    }
    fn push_clip(&mut self, rect: Rect) {
        self.0.push_clip(rect);
    }
    fn push_clip_exclude(&mut self, rect: Rect) {
        self.0.push_clip_exclude(rect);
    }
    fn pop_clip(&mut self) {
        self.0.pop_clip();
    }
    fn suspend_clipping(&mut self) {
        self.0.suspend_clipping();
    }
    fn resume_clipping(&mut self) {
        self.0.resume_clipping();
    }
    fn clip(&self) -> Rect {
        self.0.clip()
    }
}

#[test]
fn test_paint_failure_is_contained() {
    let sink = Rc::new(CollectingErrorSink::new());
    let settings = DocumentSettings {
        avoid_async_image_loading: true,
        ..DocumentSettings::default()
    };
    let mut doc = document(
        r#"{"tag": "div", "children": [
            {"tag": "p", "children": [{"tag": "img", "attributes": {"src": "dot.png"}}]},
            {"tag": "p", "children": [{"text": "after"}]}
        ]}"#,
        settings,
    )
    .with_loader(Box::new(
        StaticImageLoader::new().with_image("dot.png", LoadedImage::solid(4, 4, [255, 0, 0, 255])),
    ))
    .with_sink(Box::new(Rc::clone(&sink)));
    let _ = doc.layout().expect("layout");

    let mut surface = ImageRejectingSurface(RecordingSurface::new(WIDTH, 600.0));
    let outcome = doc.paint(&mut surface).expect("paint");
    assert_eq!(outcome, PaintOutcome::Complete, "the root survives a failed child");
    assert_eq!(sink.count(ErrorCategory::Paint), 1, "reports: {:?}", sink.reports());
    assert_eq!(sink.reports()[0].message, "Exception in box paint");
    assert_eq!(surface.0.texts(), ["after"], "siblings still paint");
    assert_eq!(surface.0.clip_depth(), 0);
}
