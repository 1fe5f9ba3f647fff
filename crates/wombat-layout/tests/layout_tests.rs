//! Tests for block flow, line boxes, replaced boxes and positioning.

use std::rc::Rc;

use wombat_common::image::LoadedImage;
use wombat_common::report::{CollectingErrorSink, ErrorCategory};
use wombat_layout::{
    ApproximateFontProvider, BoxKind, Document, DocumentSettings, Font, FontProvider, FontStyle,
    LayoutSnapshot, Rect, RecordingSurface, Size, StaticImageLoader, WordKind, tree_from_json,
};

/// 16px text advances 9.6px per character.
const ADVANCE: f32 = 9.6;

fn document(json: &str, width: f32) -> Document {
    let tree = tree_from_json(json).expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(width, 0.0),
        ..DocumentSettings::default()
    };
    Document::new(
        tree,
        settings,
        Box::new(ApproximateFontProvider),
        Box::new(RecordingSurface::new(width.max(1.0), 600.0)),
    )
}

fn lay_out(json: &str, width: f32) -> LayoutSnapshot {
    let mut doc = document(json, width);
    let _ = doc.layout().expect("layout");
    doc.snapshot()
}

/// Text words in document order with their bounds.
fn words(snapshot: &LayoutSnapshot) -> Vec<(String, Rect)> {
    snapshot
        .boxes
        .iter()
        .flat_map(|b| &b.words)
        .filter_map(|w| match &w.kind {
            WordKind::Text(text) => Some((text.clone(), w.bounds)),
            WordKind::LineBreak | WordKind::Image => None,
        })
        .collect()
}

fn word<'a>(words: &'a [(String, Rect)], text: &str) -> &'a Rect {
    &words
        .iter()
        .find(|(t, _)| t == text)
        .unwrap_or_else(|| panic!("no word {text:?} in {words:?}"))
        .1
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.5
}

// ---------------------------------------------------------------------------
// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//
// "In a block formatting context, boxes are laid out one after the other,
// vertically, beginning at the top of a containing block."
// ---------------------------------------------------------------------------

#[test]
fn test_blocks_stack_vertically() {
    let snapshot = lay_out(
        r#"{"tag": "div", "children": [
            {"tag": "div", "children": [{"text": "first"}]},
            {"tag": "div", "children": [{"text": "second"}]}
        ]}"#,
        400.0,
    );
    let divs: Vec<_> = snapshot.by_tag("div").collect();
    let (first, second) = (divs[1], divs[2]);
    assert!(
        second.location.y >= first.bottom,
        "second block at {} overlaps the first ending at {}",
        second.location.y,
        first.bottom
    );
    assert!(first.bottom > first.location.y, "a block with text has height");
    assert!(close(first.size.width, 400.0), "auto width fills the container");
}

#[test]
fn test_auto_width_subtracts_margins() {
    let snapshot = lay_out(
        r#"{"tag": "body", "children": [{"tag": "div", "children": [{"text": "x"}]}]}"#,
        400.0,
    );
    let body = snapshot.by_tag("body").next().expect("body");
    assert!(close(body.location.x, 8.0), "body margin is 8px, got {}", body.location.x);
    assert!(close(body.size.width, 384.0), "body width is 400 - 16, got {}", body.size.width);
}

// ---------------------------------------------------------------------------
// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
//
// "When two or more margins collapse, the resulting margin width is the
// maximum of the collapsing margins' widths."
// ---------------------------------------------------------------------------

#[test]
fn test_sibling_margins_collapse() {
    let snapshot = lay_out(
        r#"{"tag": "div", "children": [
            {"tag": "p", "children": [{"text": "one"}]},
            {"tag": "p", "style": {"margin-top": "24px"}, "children": [{"text": "two"}]}
        ]}"#,
        400.0,
    );
    let paragraphs: Vec<_> = snapshot.by_tag("p").collect();
    let gap = paragraphs[1].location.y - paragraphs[0].bottom;
    assert!(close(gap, 24.0), "gap should be max(16, 24), got {gap}");
}

#[test]
fn test_display_none_takes_no_space() {
    let snapshot = lay_out(
        r#"{"tag": "div", "children": [
            {"tag": "div", "style": {"display": "none"}, "children": [{"text": "hidden"}]},
            {"tag": "div", "children": [{"text": "shown"}]}
        ]}"#,
        400.0,
    );
    let divs: Vec<_> = snapshot.by_tag("div").collect();
    let (outer, shown) = (divs[0], divs[2]);
    assert!(close(shown.location.y, outer.location.y), "hidden sibling leaves no gap");
}

#[test]
fn test_explicit_height() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"height": "100px"}, "children": [{"text": "short"}]}"#,
        400.0,
    );
    let div = snapshot.by_tag("div").next().expect("div");
    assert!(div.bottom - div.location.y >= 99.5, "height {} below 100", div.bottom - div.location.y);
}

// ---------------------------------------------------------------------------
// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//
// "When the total width of the inline boxes on a line is less than the
// width of the line box containing them, their horizontal distribution
// within the line box is determined by the 'text-align' property."
// ---------------------------------------------------------------------------

#[test]
fn test_words_share_a_line() {
    let snapshot = lay_out(r#"{"tag": "p", "children": [{"text": "hello world"}]}"#, 400.0);
    let words = words(&snapshot);
    let (hello, world) = (word(&words, "hello"), word(&words, "world"));
    assert!(close(hello.y, world.y), "both words on the first line");
    assert!(close(hello.width, 5.0 * ADVANCE));
    assert!(world.x > hello.right(), "a space separates the words");
}

#[test]
fn test_words_wrap_at_content_edge() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"width": "60px"}, "children": [{"text": "aaaa bbbb cccc"}]}"#,
        400.0,
    );
    let words = words(&snapshot);
    let tops: Vec<f32> = ["aaaa", "bbbb", "cccc"].iter().map(|t| word(&words, t).y).collect();
    assert!(tops[0] < tops[1] && tops[1] < tops[2], "one word per line, got tops {tops:?}");
    let div = snapshot.by_tag("div").next().expect("div");
    for (text, rect) in &words {
        assert!(close(rect.x, div.location.x), "{text} starts its line");
    }
}

#[test]
fn test_nowrap_keeps_one_line() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"width": "60px", "white-space": "nowrap"},
            "children": [{"text": "aaaa bbbb cccc"}]}"#,
        400.0,
    );
    let words = words(&snapshot);
    let top = word(&words, "aaaa").y;
    assert!(words.iter().all(|(_, r)| close(r.y, top)), "nowrap text stays on one line");
}

#[test]
fn test_line_break_element() {
    let snapshot = lay_out(
        r#"{"tag": "p", "children": [{"text": "above"}, {"tag": "br"}, {"text": "below"}]}"#,
        400.0,
    );
    let words = words(&snapshot);
    let (above, below) = (word(&words, "above"), word(&words, "below"));
    assert!(below.y >= above.bottom() - 0.5, "br forces a new line");
    assert!(close(below.x, above.x));
}

#[test]
fn test_text_align_center() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"width": "200px", "text-align": "center"},
            "children": [{"text": "ab"}]}"#,
        400.0,
    );
    let div = snapshot.by_tag("div").next().expect("div");
    let ab = *word(&words(&snapshot), "ab");
    let left_gap = ab.x - div.location.x;
    let right_gap = div.bounds().right() - ab.right();
    assert!(close(left_gap, right_gap), "centered: {left_gap} vs {right_gap}");
}

#[test]
fn test_text_align_right() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"width": "200px", "text-align": "right"},
            "children": [{"text": "ab"}]}"#,
        400.0,
    );
    let div = snapshot.by_tag("div").next().expect("div");
    let ab = *word(&words(&snapshot), "ab");
    assert!(close(ab.right(), div.bounds().right()), "flush right");
}

#[test]
fn test_justify_fills_all_but_last_line() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"width": "100px", "text-align": "justify"},
            "children": [{"text": "aa bb cc dd ee ff"}]}"#,
        400.0,
    );
    let div = snapshot.by_tag("div").next().expect("div");
    let words = words(&snapshot);
    let first_top = words[0].1.y;
    let first_line: Vec<_> = words.iter().filter(|(_, r)| close(r.y, first_top)).collect();
    assert!(first_line.len() > 1, "several words fit the first line");
    let last = first_line.last().expect("last word").1;
    assert!(close(last.right(), div.bounds().right()), "justified line reaches the right edge");
    let final_word = word(&words, "ff");
    assert!(final_word.right() < div.bounds().right() - 1.0, "the last line is not stretched");
}

#[test]
fn test_pre_text_is_one_fragment() {
    let snapshot = lay_out(r#"{"tag": "pre", "children": [{"text": "a  b"}]}"#, 400.0);
    let words = words(&snapshot);
    assert_eq!(words.len(), 1, "pre keeps the run whole: {words:?}");
    assert!(close(words[0].1.width, 4.0 * ADVANCE));
}

// ---------------------------------------------------------------------------
// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
// ---------------------------------------------------------------------------

#[test]
fn test_ordered_list_markers() {
    let snapshot = lay_out(
        r#"{"tag": "ol", "children": [
            {"tag": "li", "children": [{"text": "one"}]},
            {"tag": "li", "children": [{"text": "two"}]}
        ]}"#,
        400.0,
    );
    let markers: Vec<_> = snapshot
        .boxes
        .iter()
        .filter(|b| b.kind == BoxKind::ListMarker)
        .collect();
    assert_eq!(markers.len(), 2);
    let texts: Vec<_> = markers
        .iter()
        .map(|m| match &m.words[0].kind {
            WordKind::Text(text) => text.as_str(),
            WordKind::LineBreak | WordKind::Image => "",
        })
        .collect();
    assert_eq!(texts, ["1.", "2."]);

    let items: Vec<_> = snapshot.by_tag("li").collect();
    for (marker, item) in markers.iter().zip(items) {
        assert!(
            marker.words[0].bounds.right() <= item.location.x - 4.5,
            "marker sits left of its item"
        );
        assert!(close(marker.location.y, item.location.y));
    }
}

#[test]
fn test_list_start_attribute() {
    let snapshot = lay_out(
        r#"{"tag": "ol", "attributes": {"start": "5"}, "style": {"list-style-type": "upper-roman"},
            "children": [{"tag": "li", "children": [{"text": "x"}]}]}"#,
        400.0,
    );
    let marker = snapshot
        .boxes
        .iter()
        .find(|b| b.kind == BoxKind::ListMarker)
        .expect("marker");
    assert_eq!(marker.words[0].kind, WordKind::Text("V.".to_string()));
}

// ---------------------------------------------------------------------------
// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
// ---------------------------------------------------------------------------

fn image_word(snapshot: &LayoutSnapshot) -> Rect {
    snapshot
        .by_tag("img")
        .next()
        .and_then(|b| b.words.first())
        .map(|w| w.bounds)
        .expect("image word")
}

#[test]
fn test_image_explicit_size() {
    let snapshot = lay_out(
        r#"{"tag": "p", "children": [
            {"tag": "img", "attributes": {"src": "x.png", "width": "40", "height": "30"}}
        ]}"#,
        400.0,
    );
    let image = image_word(&snapshot);
    assert!(close(image.width, 40.0) && close(image.height, 30.0), "got {image:?}");
}

#[test]
fn test_missing_image_uses_placeholder() {
    let snapshot = lay_out(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "missing.png"}}]}"#,
        400.0,
    );
    let image = image_word(&snapshot);
    assert!(close(image.width, 20.0), "placeholder width, got {}", image.width);
    assert!(close(image.height, 22.8), "placeholder height, got {}", image.height);
}

#[test]
fn test_loaded_image_sets_natural_size() {
    let tree = tree_from_json(
        r#"{"tag": "p", "children": [{"tag": "img", "attributes": {"src": "pic.png"}}]}"#,
    )
    .expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(400.0, 0.0),
        avoid_async_image_loading: true,
        ..DocumentSettings::default()
    };
    let loader = StaticImageLoader::new().with_image("pic.png", LoadedImage::solid(50, 25, [255, 0, 0, 255]));
    let mut doc = Document::new(
        tree,
        settings,
        Box::new(ApproximateFontProvider),
        Box::new(RecordingSurface::new(400.0, 600.0)),
    )
    .with_loader(Box::new(loader));
    let _ = doc.layout().expect("layout");

    let image = image_word(&doc.snapshot());
    assert!(close(image.width, 50.0) && close(image.height, 25.0), "natural size, got {image:?}");
}

#[test]
fn test_image_width_keeps_aspect_ratio() {
    let tree = tree_from_json(
        r#"{"tag": "p", "children": [
            {"tag": "img", "attributes": {"src": "pic.png", "width": "100"}}
        ]}"#,
    )
    .expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(400.0, 0.0),
        avoid_async_image_loading: true,
        ..DocumentSettings::default()
    };
    let loader = StaticImageLoader::new().with_image("pic.png", LoadedImage::solid(50, 25, [0, 0, 0, 255]));
    let mut doc = Document::new(
        tree,
        settings,
        Box::new(ApproximateFontProvider),
        Box::new(RecordingSurface::new(400.0, 600.0)),
    )
    .with_loader(Box::new(loader));
    let _ = doc.layout().expect("layout");

    let image = image_word(&doc.snapshot());
    assert!(close(image.height, 50.0), "height follows the 2:1 ratio, got {}", image.height);
}

#[test]
fn test_horizontal_rule_spans_container() {
    let snapshot = lay_out(
        r#"{"tag": "div", "children": [{"tag": "hr"}]}"#,
        400.0,
    );
    let hr = snapshot.by_tag("hr").next().expect("hr");
    assert!(hr.size.width > 390.0, "rule spans the container, got {}", hr.size.width);
    assert!(hr.size.height >= 2.0);
}

// ---------------------------------------------------------------------------
// [§ 9.3.1 Choosing a positioning scheme](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
// ---------------------------------------------------------------------------

#[test]
fn test_absolute_box_offsets_from_positioned_ancestor() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"position": "relative", "margin-top": "50px"}, "children": [
            {"tag": "div", "style": {"position": "absolute", "left": "10px", "top": "20px"},
             "children": [{"text": "abs"}]}
        ]}"#,
        400.0,
    );
    let divs: Vec<_> = snapshot.by_tag("div").collect();
    let (anchor, absolute) = (divs[0], divs[1]);
    assert!(close(absolute.location.x, anchor.location.x + 10.0), "left offset");
    assert!(close(absolute.location.y, anchor.location.y + 20.0), "top offset");
}

#[test]
fn test_fixed_box_ignores_flow() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"margin-top": "100px"}, "children": [
            {"tag": "div", "style": {"position": "fixed", "left": "5px", "top": "7px"},
             "children": [{"text": "pinned"}]}
        ]}"#,
        400.0,
    );
    let fixed = snapshot.by_tag("div").nth(1).expect("fixed div");
    assert!(close(fixed.location.x, 5.0) && close(fixed.location.y, 7.0), "got {:?}", fixed.location);
}

// ---------------------------------------------------------------------------
// Whole-document passes
// ---------------------------------------------------------------------------

#[test]
fn test_size_to_content() {
    let mut doc = document(r#"{"tag": "div", "children": [{"text": "hello"}]}"#, 0.0);
    let size = doc.layout().expect("layout");
    assert!(
        size.width >= 5.0 * ADVANCE - 0.5 && size.width < 100.0,
        "document shrinks to its text, got {}",
        size.width
    );
    assert_eq!(doc.actual_size(), size);
}

#[test]
fn test_layout_is_idempotent() {
    let mut doc = document(
        r#"{"tag": "body", "children": [
            {"tag": "h1", "children": [{"text": "Title"}]},
            {"tag": "p", "children": [{"text": "some "}, {"tag": "b", "children": [{"text": "bold"}]}, {"text": " text"}]},
            {"tag": "ul", "children": [
                {"tag": "li", "children": [{"text": "item"}]}
            ]},
            {"tag": "img", "attributes": {"width": "10", "height": "10"}}
        ]}"#,
        300.0,
    );
    let first_size = doc.layout().expect("first layout");
    let first = doc.snapshot();
    let second_size = doc.layout().expect("second layout");
    assert_eq!(first_size, second_size);
    assert_eq!(first, doc.snapshot(), "a second pass moves nothing");
}

#[test]
fn test_table_layout_is_idempotent() {
    let mut doc = document(
        r#"{"tag": "body", "children": [
            {"tag": "table", "attributes": {"border": "1"}, "children": [
                {"tag": "tr", "children": [
                    {"tag": "td", "attributes": {"rowspan": "2", "valign": "middle"}, "children": [
                        {"text": "middle "}, {"tag": "b", "children": [{"text": "cell"}]}
                    ]},
                    {"tag": "td", "children": [{"text": "top"}]}
                ]},
                {"tag": "tr", "children": [
                    {"tag": "td", "attributes": {"valign": "bottom"}, "children": [
                        {"tag": "div", "style": {"height": "60px"}}
                    ]}
                ]}
            ]},
            {"tag": "ul", "children": [{"tag": "li", "children": [{"text": "after"}]}]}
        ]}"#,
        300.0,
    );
    let _ = doc.layout().expect("first layout");
    let first = doc.snapshot();
    for pass in 2..=3 {
        let _ = doc.layout().expect("re-layout");
        assert_eq!(first, doc.snapshot(), "pass {pass} moved a box");
    }
}

#[test]
fn test_inline_box_gets_one_rectangle_per_line() {
    let snapshot = lay_out(
        r#"{"tag": "div", "style": {"width": "60px"}, "children": [
            {"tag": "span", "children": [{"text": "aaaa bbbb"}]}
        ]}"#,
        400.0,
    );
    let span = snapshot.by_tag("span").next().expect("span");
    assert_eq!(span.rectangles.len(), 2, "span wraps onto two lines: {:?}", span.rectangles);
}

// ---------------------------------------------------------------------------
// Per-box failure isolation
// ---------------------------------------------------------------------------

/// Has no face larger than 30px in any family.
struct SmallFontsOnly;

impl FontProvider for SmallFontsOnly {
    fn create_font(&self, family: &str, size: f32, style: FontStyle) -> Option<Font> {
        (size <= 30.0)
            .then(|| ApproximateFontProvider.create_font(family, size, style))
            .flatten()
    }
}

#[test]
fn test_layout_failure_is_contained() {
    let tree = tree_from_json(
        r#"{"tag": "div", "children": [
            {"tag": "p", "style": {"font-size": "40px"}, "children": [{"text": "huge"}]},
            {"tag": "p", "children": [{"text": "after"}]}
        ]}"#,
    )
    .expect("build tree");
    let sink = Rc::new(CollectingErrorSink::new());
    let settings = DocumentSettings {
        max_size: Size::new(400.0, 0.0),
        ..DocumentSettings::default()
    };
    let mut doc = Document::new(
        tree,
        settings,
        Box::new(SmallFontsOnly),
        Box::new(RecordingSurface::new(400.0, 600.0)),
    )
    .with_sink(Box::new(Rc::clone(&sink)));
    let _ = doc.layout().expect("content errors do not abort the document");
    assert_eq!(sink.count(ErrorCategory::Layout), 1, "reports: {:?}", sink.reports());
    assert_eq!(sink.reports()[0].message, "Exception in box layout");

    let snapshot = doc.snapshot();
    let after = words(&snapshot)
        .into_iter()
        .find(|(text, _)| text == "after")
        .expect("sibling words");
    assert!(close(after.1.width, 5.0 * ADVANCE), "the sibling is still measured: {:?}", after.1);
}
