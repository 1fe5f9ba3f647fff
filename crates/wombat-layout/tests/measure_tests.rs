//! Tests for content width measurement.

use wombat_layout::measure::{measure_subtree, min_max_width, minimum_width};
use wombat_layout::{ApproximateFontProvider, BoxId, BoxTree, FontCache, RecordingSurface, tree_from_json};

/// 16px text advances 9.6px per character.
const ADVANCE: f32 = 9.6;

fn measured(json: &str) -> (BoxTree, FontCache, RecordingSurface, BoxId) {
    let mut tree = tree_from_json(json).expect("build tree");
    let fonts = FontCache::new(Box::new(ApproximateFontProvider), "sans-serif", 16.0);
    let surface = RecordingSurface::new(400.0, 400.0);
    let root = tree.root();
    measure_subtree(&mut tree, root, &fonts, &surface).expect("measure");
    let element = tree.children(root)[0];
    (tree, fonts, surface, element)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

// ---------------------------------------------------------------------------
// [§ 17.5.2.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
//
// "Calculate the minimum content width (MCW) of each cell: the formatted
// content may span any number of lines but may not overflow the cell box."
// ---------------------------------------------------------------------------

const NESTED: &str = r#"{"tag": "div", "style": {"padding": "5px"}, "children": [
    {"tag": "span", "style": {"padding-left": "3px", "padding-right": "3px"}, "children": [
        {"text": "bbbb"}
    ]},
    {"tag": "span", "children": [{"text": "aa"}]}
]}"#;

#[test]
fn test_minimum_width_adds_owner_padding_below_the_box() {
    let (tree, fonts, surface, div) = measured(NESTED);
    let min = minimum_width(&tree, div, &fonts, &surface).expect("minimum width");
    // The widest word plus the padded span, but not the div's own padding.
    assert!(close(min, 4.0 * ADVANCE + 6.0), "got {min}");
}

#[test]
fn test_min_max_width_of_one_unbroken_line() {
    let (tree, fonts, surface, div) = measured(NESTED);
    let (min, max) = min_max_width(&tree, div, &fonts, &surface).expect("min/max width");
    let padding = 10.0 + 6.0;
    assert!(close(min, 4.0 * ADVANCE + padding), "min {min}");
    assert!(close(max, 6.0 * ADVANCE + padding), "max {max}");
}

#[test]
fn test_block_children_restart_the_line() {
    let (tree, fonts, surface, div) = measured(
        r#"{"tag": "div", "children": [
            {"tag": "div", "children": [{"text": "aaaaa"}]},
            {"tag": "div", "children": [{"text": "bbb"}]}
        ]}"#,
    );
    let (min, max) = min_max_width(&tree, div, &fonts, &surface).expect("min/max width");
    assert!(close(min, 5.0 * ADVANCE), "min {min}");
    assert!(close(max, 5.0 * ADVANCE), "the longer block line wins, got {max}");
}

#[test]
fn test_line_break_restarts_the_line() {
    let (tree, fonts, surface, p) = measured(
        r#"{"tag": "p", "children": [
            {"text": "aaaa"},
            {"tag": "br"},
            {"text": "bb"}
        ]}"#,
    );
    let (_, max) = min_max_width(&tree, p, &fonts, &surface).expect("min/max width");
    assert!(close(max, 4.0 * ADVANCE), "max {max}");
}
