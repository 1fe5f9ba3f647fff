//! Tests for the box tree arena and its normalization.

use wombat_layout::style::DisplayKind;
use wombat_layout::{BoxKind, BoxTree, HtmlTag, TreeError, tree_from_json};

fn tag(name: &str) -> HtmlTag {
    HtmlTag::new(name)
}

// ---------------------------------------------------------------------------
// Arena operations
// ---------------------------------------------------------------------------

#[test]
fn test_create_appends_in_order() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let a = tree.create_box(tag("div"), root).expect("create a");
    let b = tree.create_box(tag("div"), root).expect("create b");
    assert_eq!(tree.children(root), &[a, b]);
    assert_eq!(tree.parent(a), Some(root));
}

#[test]
fn test_create_before_sibling() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let a = tree.create_box(tag("div"), root).expect("create a");
    let b = tree
        .create_box_before(root, Some(tag("p")), Some(a))
        .expect("create before a");
    assert_eq!(tree.children(root), &[b, a], "b should sit before a");
}

#[test]
fn test_create_before_missing_sibling_fails() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let a = tree.create_box(tag("div"), root).expect("create a");
    let inner = tree.create_box(tag("span"), a).expect("create inner");
    let result = tree.create_box_before(root, Some(tag("p")), Some(inner));
    assert!(
        matches!(result, Err(TreeError::SiblingNotFound { .. })),
        "inserting before a non-child is a structural error, got {result:?}"
    );
}

#[test]
fn test_remove_detaches_subtree() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let a = tree.create_box(tag("div"), root).expect("create a");
    let _ = tree.create_box(tag("div"), root).expect("create b");
    let _ = tree.create_text(a, "hello").expect("create text");
    let before = tree.children(root).len();

    tree.remove(a).expect("remove");
    assert_eq!(tree.children(root).len(), before - 1);
    assert_eq!(tree.parent(a), None);
    assert!(!tree.descendants(root).contains(&a));
}

#[test]
fn test_set_parent_rejects_cycles() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let outer = tree.create_box(tag("div"), root).expect("create outer");
    let inner = tree.create_box(tag("div"), outer).expect("create inner");
    assert!(matches!(tree.set_parent(outer, inner), Err(TreeError::Cycle(..))));
}

#[test]
fn test_set_before_box_moves_between_parents() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let first = tree.create_box(tag("div"), root).expect("create first");
    let second = tree.create_box(tag("div"), root).expect("create second");
    let moved = tree.create_box(tag("span"), second).expect("create moved");

    tree.set_before_box(moved, first).expect("move");
    assert_eq!(tree.children(root), &[moved, first, second]);
    assert!(tree.children(second).is_empty());
}

#[test]
fn test_set_before_box_rejects_moving_before_own_child() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let outer = tree.create_box(tag("div"), root).expect("create outer");
    let child = tree.create_box(tag("span"), outer).expect("create child");

    assert!(matches!(tree.set_before_box(outer, child), Err(TreeError::Cycle(..))));
    assert_eq!(tree.parent(outer), Some(root), "the box keeps its parent");
    assert_eq!(tree.children(root), &[outer]);
    assert_eq!(tree.children(outer), &[child]);
}

#[test]
fn test_set_all_boxes_reparents_every_child() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let from = tree.create_box(tag("div"), root).expect("create from");
    let target = tree.create_box(tag("div"), root).expect("create target");
    let kept = tree.create_box(tag("p"), target).expect("create kept");
    let a = tree.create_box(tag("span"), from).expect("create a");
    let b = tree.create_box(tag("span"), from).expect("create b");

    tree.set_all_boxes(target, from).expect("reparent");
    assert!(tree.children(from).is_empty(), "the source list is cleared");
    assert_eq!(tree.children(target), &[kept, a, b]);
    assert_eq!(tree.parent(a), Some(target));
    assert_eq!(tree.parent(b), Some(target));
}

#[test]
fn test_set_all_boxes_rejects_moving_into_a_descendant() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let outer = tree.create_box(tag("div"), root).expect("create outer");
    let inner = tree.create_box(tag("div"), outer).expect("create inner");
    assert!(matches!(tree.set_all_boxes(inner, outer), Err(TreeError::Cycle(..))));
    assert_eq!(tree.children(outer), &[inner], "nothing moved");
}

#[test]
fn test_elements_inherit_from_parent() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let div = tree
        .create_box(tag("div").with_attribute("style", "color: red"), root)
        .expect("create div");
    let span = tree.create_box(tag("span"), div).expect("create span");
    assert_eq!(tree[span].style.color, tree[div].style.color);
}

#[test]
fn test_kind_follows_tag() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let img = tree.create_box(tag("img"), root).expect("create img");
    let hr = tree.create_box(tag("hr"), root).expect("create hr");
    let br = tree.create_box(tag("br"), root).expect("create br");
    assert_eq!(tree[img].kind, BoxKind::Image);
    assert_eq!(tree[hr].kind, BoxKind::HorizontalRule);
    assert!(tree[br].words.first().is_some_and(|w| w.is_line_break()));
}

#[test]
fn test_containing_block_of_detached_box() {
    let mut tree = BoxTree::new();
    let root = tree.root();
    let a = tree.create_box(tag("div"), root).expect("create a");
    let span = tree.create_box(tag("span"), a).expect("create span");
    assert_eq!(tree.containing_block(span), Ok(a));

    tree.remove(a).expect("remove");
    assert!(tree.containing_block(span).is_err(), "no block ancestor remains");
}

// ---------------------------------------------------------------------------
// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
//
// "if a container box has a block-level box inside it, then we force it
// to have only block-level boxes inside it."
// ---------------------------------------------------------------------------

#[test]
fn test_mixed_content_is_wrapped() {
    let tree = tree_from_json(
        r#"{"tag": "div", "children": [
            {"text": "before"},
            {"tag": "p", "children": [{"text": "para"}]},
            {"text": "after"}
        ]}"#,
    )
    .expect("build tree");
    let div = tree.children(tree.root())[0];
    for &child in tree.children(div) {
        assert!(
            tree[child].display().is_block_level(),
            "child {child} of a mixed container should be block-level, got {}",
            tree[child].display()
        );
    }
}

#[test]
fn test_inline_only_content_is_left_alone() {
    let tree = tree_from_json(
        r#"{"tag": "p", "children": [
            {"text": "a "},
            {"tag": "b", "children": [{"text": "bold"}]}
        ]}"#,
    )
    .expect("build tree");
    let p = tree.children(tree.root())[0];
    assert_eq!(tree.children(p).len(), 2);
    assert!(tree.contains_inlines_only(p));
    assert_eq!(tree[tree.children(p)[1]].display(), DisplayKind::Inline);
}
