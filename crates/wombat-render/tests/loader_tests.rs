//! Tests for the file and data-URL image loader.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use wombat_common::report::{CollectingErrorSink, ErrorCategory};
use wombat_layout::{ApproximateFontProvider, Document, DocumentSettings, RecordingSurface, Size, tree_from_json};
use wombat_render::{DecodeError, FileImageLoader, ImagePipeline, LoadError};

const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="3"><rect width="4" height="3" fill="red"/></svg>"#;

/// A fresh directory holding a 3×2 green PNG named `green.png`.
fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wombat-loader-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create fixture dir");
    image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 255, 0, 255]))
        .save(dir.join("green.png"))
        .expect("write fixture png");
    dir
}

fn document(json: &str, loader: FileImageLoader, sync: bool) -> Document {
    let tree = tree_from_json(json).expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(400.0, 0.0),
        avoid_async_image_loading: sync,
        ..DocumentSettings::default()
    };
    Document::new(
        tree,
        settings,
        Box::new(ApproximateFontProvider),
        Box::new(RecordingSurface::new(400.0, 300.0)),
    )
    .with_loader(Box::new(loader))
}

fn assert_image_size(doc: &Document, width: f32, height: f32) {
    let bounds = doc
        .snapshot()
        .by_tag("img")
        .next()
        .and_then(|b| b.words.first())
        .map(|w| w.bounds)
        .expect("image word");
    assert!(
        (bounds.width - width).abs() < 0.5 && (bounds.height - height).abs() < 0.5,
        "expected {width}x{height}, got {bounds:?}"
    );
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_loads_relative_png() {
    let dir = fixture_dir("relative");
    let image = ImagePipeline::new().load(&dir, "green.png").expect("load png");
    assert_eq!((image.width(), image.height()), (3, 2));
    assert_eq!(&image.rgba_data()[..4], &[0, 255, 0, 255]);
}

#[test]
fn test_query_and_fragment_are_ignored() {
    let dir = fixture_dir("decorated");
    let image = ImagePipeline::new().load(&dir, "green.png?v=2#top").expect("load png");
    assert_eq!(image.width(), 3);
}

#[test]
fn test_svg_data_url_is_rasterized() {
    let source = format!("data:image/svg+xml,{SVG}");
    let image = ImagePipeline::new().load(&PathBuf::from("."), &source).expect("load svg");
    assert_eq!((image.width(), image.height()), (4, 3));
    assert_eq!(&image.rgba_data()[..4], &[255, 0, 0, 255], "straight alpha red");
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = fixture_dir("missing");
    let result = ImagePipeline::new().load(&dir, "nope.png");
    assert!(matches!(result, Err(LoadError::Read { .. })), "got {result:?}");
}

#[test]
fn test_garbage_is_a_decode_error() {
    let dir = fixture_dir("garbage");
    fs::write(dir.join("bad.png"), b"definitely not a png").expect("write garbage");
    let result = ImagePipeline::new().load(&dir, "bad.png");
    assert!(
        matches!(result, Err(LoadError::Decode(DecodeError::Raster(_)))),
        "got {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Through the document
// ---------------------------------------------------------------------------

#[test]
fn test_sync_load_sizes_the_image() {
    let dir = fixture_dir("sync");
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "green.png"}}]}"#,
        FileImageLoader::new(&dir),
        true,
    );
    let _ = doc.layout().expect("layout");
    assert_image_size(&doc, 3.0, 2.0);
    assert_eq!(doc.pending_images(), 0);
}

#[test]
fn test_async_load_completes_on_a_worker() {
    let dir = fixture_dir("async");
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "green.png"}}]}"#,
        FileImageLoader::new(&dir),
        false,
    );
    let _ = doc.layout().expect("layout");
    assert!(doc.wait_for_images(Duration::from_secs(10)), "the worker delivers the image");
    assert_eq!(doc.take_refresh(), Some(true));

    let _ = doc.layout().expect("relayout");
    assert_image_size(&doc, 3.0, 2.0);
}

#[test]
fn test_failed_load_is_reported() {
    let dir = fixture_dir("reported");
    let sink = Rc::new(CollectingErrorSink::new());
    let mut doc = document(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "absent.png"}}]}"#,
        FileImageLoader::new(&dir),
        true,
    )
    .with_sink(Box::new(Rc::clone(&sink)));
    let _ = doc.layout().expect("layout");
    assert_eq!(sink.count(ErrorCategory::Image), 1, "reports: {:?}", sink.reports());
}
