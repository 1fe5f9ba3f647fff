//! Tests for splitting box text into words.

use quickcheck_macros::quickcheck;
use wombat_layout::style::{WhiteSpace, WordBreak};
use wombat_layout::tree::parse_to_words;

// ---------------------------------------------------------------------------
// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
//
// "If 'white-space' is set to 'normal', 'nowrap', or 'pre-line', ... any
// space (U+0020) following another space (U+0020) ... is removed."
// ---------------------------------------------------------------------------

#[test]
fn test_normal_collapses_into_flags() {
    let words = parse_to_words("a b", WhiteSpace::Normal, WordBreak::Normal);
    assert_eq!(words.len(), 2, "two words: {words:?}");
    assert_eq!(words[0].content(), "a");
    assert!(words[0].has_space_after);
    assert!(!words[0].has_space_before);
    assert_eq!(words[1].content(), "b");
    assert!(words[1].has_space_before);
    assert!(!words[1].has_space_after);
}

#[test]
fn test_pre_keeps_one_fragment() {
    let words = parse_to_words("a b", WhiteSpace::Pre, WordBreak::Normal);
    assert_eq!(words.len(), 1, "pre text between breaks is one fragment");
    assert_eq!(words[0].content(), "a b");
}

#[test]
fn test_pre_breaks_on_newlines() {
    let words = parse_to_words("one\ntwo", WhiteSpace::Pre, WordBreak::Normal);
    let kinds: Vec<bool> = words.iter().map(|w| w.is_line_break()).collect();
    assert_eq!(kinds, [false, true, false]);
}

#[test]
fn test_normal_ignores_newlines() {
    let words = parse_to_words("one\ntwo", WhiteSpace::Normal, WordBreak::Normal);
    assert!(words.iter().all(|w| !w.is_line_break()));
    assert_eq!(words.len(), 2);
}

#[test]
fn test_break_all_splits_characters() {
    let words = parse_to_words("abc", WhiteSpace::Normal, WordBreak::BreakAll);
    let contents: Vec<&str> = words.iter().map(|w| w.content()).collect();
    assert_eq!(contents, ["a", "b", "c"]);
}

#[test]
fn test_carriage_returns_are_dropped() {
    let words = parse_to_words("a\r\nb", WhiteSpace::PreLine, WordBreak::Normal);
    let contents: Vec<&str> = words.iter().map(|w| w.content()).collect();
    assert_eq!(contents, ["a", "", "b"], "a, break, b");
    assert!(words[1].is_line_break());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn visible(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[quickcheck]
fn prop_normal_keeps_visible_characters(text: String) -> bool {
    let words = parse_to_words(&text, WhiteSpace::Normal, WordBreak::Normal);
    let joined: String = words.iter().map(|w| w.content()).collect();
    visible(&joined) == visible(&text) && words.iter().all(|w| !w.content().is_empty())
}

#[quickcheck]
fn prop_pre_wrap_keeps_everything_but_newlines(text: String) -> bool {
    let words = parse_to_words(&text, WhiteSpace::PreWrap, WordBreak::Normal);
    let joined: String = words.iter().map(|w| w.content()).collect();
    let expected: String = text.chars().filter(|&c| c != '\n' && c != '\r').collect();
    joined == expected
}
