//! Tests for the document root: settings, refresh requests, image
//! completions, selection and disposal.

use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wombat_common::image::LoadedImage;
use wombat_common::report::{CollectingErrorSink, ErrorCategory};
use wombat_layout::{
    ApproximateFontProvider, Color, Document, DocumentSettings, ImageCompletion, ImageLoadResult,
    ImageLoader, ImageRequest, LayoutError, RecordingSurface, SelectionPoint, Size, TreeError,
    WordKind, tree_from_json,
};

fn document(json: &str) -> Document {
    let tree = tree_from_json(json).expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(400.0, 0.0),
        ..DocumentSettings::default()
    };
    Document::new(
        tree,
        settings,
        Box::new(ApproximateFontProvider),
        Box::new(RecordingSurface::new(400.0, 600.0)),
    )
}

/// Completes every request from a worker thread after a short delay.
struct ThreadedLoader {
    image: LoadedImage,
}

impl ImageLoader for ThreadedLoader {
    fn load(&self, _request: ImageRequest, sync: bool, completion: ImageCompletion) {
        let result = ImageLoadResult::loaded(Arc::new(self.image.clone()));
        if sync {
            completion.complete(result);
            return;
        }
        let _ = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completion.complete(result);
        });
    }
}

fn image_width(doc: &Document) -> f32 {
    doc.snapshot()
        .by_tag("img")
        .next()
        .and_then(|b| b.words.iter().find(|w| w.kind == WordKind::Image))
        .map(|w| w.bounds.width)
        .expect("image word")
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[test]
fn test_settings_defaults() {
    let settings = DocumentSettings::default();
    assert_eq!(settings.max_size, Size::new(800.0, 0.0));
    assert_eq!(settings.default_font_family, "sans-serif");
    assert_eq!(settings.default_font_size, 16.0);
    assert!(settings.selection_back_color.is_none());
    assert!(!settings.avoid_async_image_loading);
}

#[test]
fn test_settings_from_partial_json() {
    let settings = DocumentSettings::from_json(
        r##"{"default_font_size": 20, "avoid_async_image_loading": true,
            "selection_back_color": "#0000ff"}"##,
    )
    .expect("parse settings");
    assert_eq!(settings.default_font_size, 20.0);
    assert!(settings.avoid_async_image_loading);
    assert_eq!(settings.selection_back_color, Some(Color::rgb(0, 0, 255)));
    assert_eq!(settings.max_size, Size::new(800.0, 0.0), "unnamed fields keep defaults");
}

#[test]
fn test_settings_reject_malformed_json() {
    assert!(DocumentSettings::from_json("{\"max_size\": 3").is_err());
}

// ---------------------------------------------------------------------------
// Refresh requests
// ---------------------------------------------------------------------------

#[test]
fn test_refresh_requests_accumulate() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    assert_eq!(doc.take_refresh(), None);

    doc.request_refresh(false);
    doc.request_refresh(true);
    doc.request_refresh(false);
    assert_eq!(doc.take_refresh(), Some(true), "a layout request is never downgraded");
    assert_eq!(doc.take_refresh(), None, "taking clears the request");
}

#[test]
fn test_new_settings_need_layout() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    let settings = DocumentSettings {
        default_font_size: 24.0,
        ..doc.settings().clone()
    };
    doc.set_settings(settings);
    assert_eq!(doc.settings().default_font_size, 24.0);
    assert_eq!(doc.take_refresh(), Some(true));
}

#[test]
fn test_layout_satisfies_a_layout_request() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    doc.request_refresh(true);
    let _ = doc.layout().expect("layout");
    assert_eq!(doc.take_refresh(), Some(false), "only the repaint remains");
}

// ---------------------------------------------------------------------------
// Image completions
// ---------------------------------------------------------------------------

#[test]
fn test_async_image_completes_between_passes() {
    let mut doc = document(r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "pic.png"}}]}"#)
        .with_loader(Box::new(ThreadedLoader {
            image: LoadedImage::solid(50, 25, [0, 0, 0, 255]),
        }));
    let _ = doc.layout().expect("layout");
    assert_eq!(doc.pending_images(), 1, "the load is still in flight");
    assert!((image_width(&doc) - 20.0).abs() < 0.5, "placeholder while loading");

    assert!(doc.wait_for_images(Duration::from_secs(5)), "the completion applies");
    assert_eq!(doc.pending_images(), 0);
    assert_eq!(doc.take_refresh(), Some(true), "content images change layout");

    let _ = doc.layout().expect("layout");
    assert!((image_width(&doc) - 50.0).abs() < 0.5, "natural width after load");
    assert!(!doc.process_image_completions(), "nothing more to apply");
}

#[test]
fn test_failed_image_is_reported() {
    let sink = Rc::new(CollectingErrorSink::new());
    let mut doc = document(r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "gone.png"}}]}"#)
        .with_sink(Box::new(Rc::clone(&sink)));
    let _ = doc.layout().expect("layout");
    assert!(sink.is_empty(), "nothing is applied during layout");

    assert!(doc.process_image_completions());
    assert_eq!(sink.count(ErrorCategory::Image), 1, "reports: {:?}", sink.reports());
    assert_eq!(doc.pending_images(), 0);
}

#[test]
fn test_wait_without_pending_loads_returns_at_once() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "no images"}]}"#);
    let _ = doc.layout().expect("layout");
    assert!(!doc.wait_for_images(Duration::from_secs(5)));
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn test_selection_spans_boxes() {
    let mut doc = document(
        r#"{"tag": "div", "children": [
            {"tag": "p", "children": [{"text": "alpha beta"}]},
            {"tag": "p", "children": [{"text": "gamma delta"}]}
        ]}"#,
    );
    let _ = doc.layout().expect("layout");
    let root = doc.tree().root();
    let div = doc.tree().children(root)[0];
    let first = doc.tree().children(doc.tree().children(div)[0])[0];
    let second = doc.tree().children(doc.tree().children(div)[1])[0];

    let touched = doc
        .select(SelectionPoint::new(first, 1, 2), SelectionPoint::new(second, 0, 5))
        .expect("select");
    assert_eq!(touched, 2);
    assert_eq!(doc.selected_text(), "tagamma");
    assert_eq!(doc.take_refresh(), Some(false), "selection only needs a repaint");

    doc.clear_selection();
    assert_eq!(doc.selected_text(), "");
}

#[test]
fn test_select_unknown_box_is_structural() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    let _ = doc.layout().expect("layout");
    let missing = wombat_layout::BoxId(9_999);
    let result = doc.select(SelectionPoint::new(missing, 0, 0), SelectionPoint::new(missing, 0, 1));
    match result {
        Err(err @ LayoutError::Tree(TreeError::UnknownBox(id))) => {
            assert_eq!(id, missing);
            assert!(err.is_structural());
        }
        other => panic!("expected an unknown box error, got {other:?}"),
    }
}

#[test]
fn test_select_unknown_word() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    let _ = doc.layout().expect("layout");
    let p = doc.tree().children(doc.tree().root())[0];
    let text = doc.tree().children(p)[0];
    let result = doc.select(SelectionPoint::new(text, 0, 0), SelectionPoint::new(text, 7, 0));
    assert!(
        matches!(result, Err(LayoutError::Tree(TreeError::UnknownWord { index: 7, .. }))),
        "got {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Snapshot and disposal
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_serializes_tags() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    let _ = doc.layout().expect("layout");
    let json = doc.snapshot().to_json().expect("serialize");
    assert!(json.contains("\"p\""), "snapshot json names the tag: {json}");
}

#[test]
fn test_dispose_drops_cached_fonts() {
    let mut doc = document(r#"{"tag": "p", "children": [{"text": "x"}]}"#);
    let _ = doc.layout().expect("layout");
    assert!(!doc.fonts().is_empty(), "layout resolves fonts");

    doc.dispose();
    assert!(doc.fonts().is_empty());
    assert_eq!(doc.take_refresh(), None);
}
