//! Word fragments and text splitting.
//!
//! [§ 16.6 Whitespace: the 'white-space' property](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
//!
//! A box's text is split into [`Word`]s, the smallest units the line-box
//! builder places. Collapsible whitespace is not stored as fragments; it is
//! remembered through the `has_space_before` / `has_space_after` flags.

use serde::Serialize;

use crate::geometry::Rect;
use crate::style::{WhiteSpace, WordBreak};

/// What a fragment holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "kebab-case")]
pub enum WordKind {
    /// A run of text.
    Text(String),
    /// A forced line break with no width.
    LineBreak,
    /// The replaced content of an image box.
    Image,
}

/// Selected part of a word, by character index and pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WordSelection {
    /// First selected character.
    pub start_index: usize,
    /// One past the last selected character.
    pub end_index: usize,
    /// Pixel offset of `start_index` from the word's left edge.
    pub start_offset: f32,
    /// Pixel offset of `end_index` from the word's left edge.
    pub end_offset: f32,
}

/// One layout fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Word {
    /// Content.
    pub kind: WordKind,
    /// Whitespace preceded this fragment in the source.
    pub has_space_before: bool,
    /// Whitespace followed this fragment in the source.
    pub has_space_after: bool,
    /// Left edge, set by line layout.
    pub left: f32,
    /// Top edge, set by line layout.
    pub top: f32,
    /// Measured width.
    pub width: f32,
    /// Measured height.
    pub height: f32,
    /// Selection state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<WordSelection>,
}

impl Word {
    /// A text fragment.
    #[must_use]
    pub fn text(text: impl Into<String>, has_space_before: bool, has_space_after: bool) -> Self {
        Self::with_kind(WordKind::Text(text.into()), has_space_before, has_space_after)
    }

    /// A forced line break.
    #[must_use]
    pub fn line_break() -> Self {
        Self::with_kind(WordKind::LineBreak, false, false)
    }

    /// An image placeholder.
    #[must_use]
    pub fn image() -> Self {
        Self::with_kind(WordKind::Image, false, false)
    }

    fn with_kind(kind: WordKind, has_space_before: bool, has_space_after: bool) -> Self {
        Self {
            kind,
            has_space_before,
            has_space_after,
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            selection: None,
        }
    }

    /// Text content; empty for breaks and images.
    #[must_use]
    pub fn content(&self) -> &str {
        match &self.kind {
            WordKind::Text(text) => text,
            WordKind::LineBreak | WordKind::Image => "",
        }
    }

    /// Whether this is a forced line break.
    #[must_use]
    pub const fn is_line_break(&self) -> bool {
        matches!(self.kind, WordKind::LineBreak)
    }

    /// Whether this is an image placeholder.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.kind, WordKind::Image)
    }

    /// Whether this fragment is preserved whitespace only.
    #[must_use]
    pub fn is_spaces(&self) -> bool {
        match &self.kind {
            WordKind::Text(text) => text.chars().all(char::is_whitespace),
            WordKind::LineBreak | WordKind::Image => false,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// Whether any part of the word is selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selection.is_some()
    }
}

/// Wide characters that allow a break on either side.
///
/// CJK ideographs, kana, Hangul, compatibility ideographs and fullwidth forms.
#[must_use]
pub fn is_wide_char(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3040..=0x30FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFFEF
    )
}

fn is_space(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n'
}

/// Split `text` into fragments.
///
/// - `normal`, `nowrap`, `pre-line`: whitespace runs collapse into the
///   neighbours' space flags.
/// - `pre-wrap`: whitespace runs become their own fragments so lines can
///   wrap between them.
/// - `pre`: each newline-free run is one fragment, spaces included.
///
/// Words also end after a hyphen and on both sides of a wide character.
/// `word-break: break-all` makes every character its own fragment. A `\n`
/// produces a [`WordKind::LineBreak`] only when `white_space` preserves
/// newlines; `\r` is dropped.
#[must_use]
pub fn parse_to_words(text: &str, white_space: WhiteSpace, word_break: WordBreak) -> Vec<Word> {
    let chars: Vec<char> = text.chars().filter(|&c| c != '\r').collect();
    let preserve_spaces = white_space.preserves_spaces();
    let respect_newlines = white_space.preserves_newlines();
    let mut words = Vec::new();

    let mut start = 0;
    while start < chars.len() {
        let mut end = start;
        while end < chars.len() && is_space(chars[end]) {
            end += 1;
        }

        if end > start {
            if preserve_spaces {
                let run: String = chars[start..end].iter().collect();
                words.push(Word::text(run, false, false));
            }
        } else if chars[start] != '\n' {
            // STEP 1: scan a word.
            if word_break == WordBreak::BreakAll || is_wide_char(chars[start]) {
                end = start + 1;
            } else {
                while end < chars.len()
                    && !chars[end].is_whitespace()
                    && !is_wide_char(chars[end])
                {
                    end += 1;
                    if chars[end - 1] == '-' {
                        break;
                    }
                }
            }

            // STEP 2: record adjacent whitespace.
            let (before, after) = if preserve_spaces {
                (false, false)
            } else {
                (
                    start > 0 && chars[start - 1].is_whitespace(),
                    end < chars.len() && chars[end].is_whitespace(),
                )
            };
            let word: String = chars[start..end].iter().collect();
            words.push(Word::text(word, before, after));
        }

        if end < chars.len() && chars[end] == '\n' {
            end += 1;
            if respect_newlines {
                words.push(Word::line_break());
            }
        }
        start = end;
    }

    if white_space == WhiteSpace::Pre {
        merge_runs(words)
    } else {
        words
    }
}

/// Join adjacent text fragments between line breaks into one.
fn merge_runs(words: Vec<Word>) -> Vec<Word> {
    let mut merged: Vec<Word> = Vec::with_capacity(words.len());
    for word in words {
        match (merged.last_mut(), &word.kind) {
            (Some(Word { kind: WordKind::Text(prev), .. }), WordKind::Text(next)) => {
                prev.push_str(next);
            }
            _ => merged.push(word),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(words: &[Word]) -> Vec<&str> {
        words
            .iter()
            .map(|w| if w.is_line_break() { "\\n" } else { w.content() })
            .collect()
    }

    #[test]
    fn hyphen_ends_word() {
        let words = parse_to_words("well-known", WhiteSpace::Normal, WordBreak::Normal);
        assert_eq!(contents(&words), ["well-", "known"]);
        assert!(!words[0].has_space_after);
    }

    #[test]
    fn wide_chars_break_both_sides() {
        let words = parse_to_words("ab中文cd", WhiteSpace::Normal, WordBreak::Normal);
        assert_eq!(contents(&words), ["ab", "中", "文", "cd"]);
    }

    #[test]
    fn pre_line_keeps_newlines_only() {
        let words = parse_to_words("a  b\nc", WhiteSpace::PreLine, WordBreak::Normal);
        assert_eq!(contents(&words), ["a", "b", "\\n", "c"]);
    }

    #[test]
    fn pre_wrap_keeps_space_fragments() {
        let words = parse_to_words("a  b", WhiteSpace::PreWrap, WordBreak::Normal);
        assert_eq!(contents(&words), ["a", "  ", "b"]);
    }

    #[test]
    fn leading_newline_makes_no_empty_word() {
        let words = parse_to_words("\nb", WhiteSpace::Normal, WordBreak::Normal);
        assert_eq!(contents(&words), ["b"]);
        let words = parse_to_words("\nb", WhiteSpace::Pre, WordBreak::Normal);
        assert_eq!(contents(&words), ["\\n", "b"]);
    }
}
