//! Keyword-valued CSS properties.
//!
//! Every enum parses from its CSS spelling with [`std::str::FromStr`]
//! (kebab-case, ASCII case-insensitive) and prints back the same way.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// [§ 9.2.4 The 'display' property](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display, AsRefStr, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DisplayKind {
    /// "This value causes an element to generate one or more inline boxes."
    #[default]
    Inline,
    /// "This value causes an element to generate a block box."
    Block,
    /// "This value causes an element to generate a principal block box and a marker box."
    ListItem,
    /// Laid out as inline content.
    InlineBlock,
    /// "Specifies that an element defines a block-level table."
    Table,
    /// "Specifies that an element defines an inline-level table."
    InlineTable,
    /// "Specifies a caption for the table."
    TableCaption,
    /// "Specifies that an element groups one or more rows."
    TableRowGroup,
    /// "Like 'table-row-group', but … displayed before all other rows."
    TableHeaderGroup,
    /// "Like 'table-row-group', but … displayed after all other rows."
    TableFooterGroup,
    /// "Specifies that an element is a row of cells."
    TableRow,
    /// "Specifies that an element describes a column of cells."
    TableColumn,
    /// "Specifies that an element groups one or more columns."
    TableColumnGroup,
    /// "Specifies that an element represents a table cell."
    TableCell,
    /// "This value causes an element to not appear in the formatting structure."
    None,
}

impl DisplayKind {
    /// Inline-level boxes that participate in line boxes.
    #[must_use]
    pub const fn is_inline(self) -> bool {
        matches!(self, Self::Inline | Self::InlineBlock)
    }

    /// Boxes that establish their own width and position from the
    /// containing block.
    #[must_use]
    pub const fn is_block_level(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::ListItem
                | Self::Table
                | Self::InlineTable
                | Self::TableCell
                | Self::TableCaption
        )
    }

    /// Boxes whose geometry is assigned by the table algorithm.
    #[must_use]
    pub const fn is_table_part(self) -> bool {
        matches!(
            self,
            Self::TableCaption
                | Self::TableRowGroup
                | Self::TableHeaderGroup
                | Self::TableFooterGroup
                | Self::TableRow
                | Self::TableColumn
                | Self::TableColumnGroup
                | Self::TableCell
        )
    }

    /// `table` or `inline-table`.
    #[must_use]
    pub const fn is_table(self) -> bool {
        matches!(self, Self::Table | Self::InlineTable)
    }
}

/// [§ 9.3.1 Choosing a positioning scheme](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Position {
    /// "The box is a normal box, laid out according to the normal flow."
    #[default]
    Static,
    /// Laid out in normal flow.
    Relative,
    /// "The box's position … is specified with the 'top', 'right', 'bottom', and 'left' properties."
    Absolute,
    /// "The box's position is calculated according to the 'absolute' model,
    /// but in addition, the box is fixed with respect to some reference."
    Fixed,
}

/// [§ 11.2 Visibility](https://www.w3.org/TR/CSS2/visufx.html#visibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Visibility {
    /// "The generated box is visible."
    #[default]
    Visible,
    /// "The generated box is invisible (fully transparent, nothing is drawn),
    /// but still affects layout."
    Hidden,
    /// Treated as hidden.
    Collapse,
}

/// [§ 11.1.1 Overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Overflow {
    /// "This value indicates that content is not clipped."
    #[default]
    Visible,
    /// "This value indicates that the content is clipped."
    Hidden,
    /// Clipped; scrolling is left to the host.
    Scroll,
    /// Not clipped.
    Auto,
}

/// [§ 16.6 White space](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WhiteSpace {
    /// "collapse sequences of white space, and break lines as necessary"
    #[default]
    Normal,
    /// "collapses white space as for 'normal', but suppresses line breaks"
    Nowrap,
    /// "prevents user agents from collapsing sequences of white space"
    Pre,
    /// "prevents user agents from collapsing sequences of white space.
    /// Lines are broken at preserved newline characters, and as necessary"
    PreWrap,
    /// "directs user agents to collapse sequences of white space. Lines are
    /// broken at preserved newline characters, and as necessary"
    PreLine,
}

impl WhiteSpace {
    /// Whether runs of spaces survive as content.
    #[must_use]
    pub const fn preserves_spaces(self) -> bool {
        matches!(self, Self::Pre | Self::PreWrap)
    }

    /// Whether `\n` in the source forces a line break.
    #[must_use]
    pub const fn preserves_newlines(self) -> bool {
        matches!(self, Self::Pre | Self::PreWrap | Self::PreLine)
    }

    /// Whether lines may wrap at soft opportunities.
    #[must_use]
    pub const fn wraps(self) -> bool {
        matches!(self, Self::Normal | Self::PreWrap | Self::PreLine)
    }
}

/// [§ 5.2 Breaking Rules for Letters](https://www.w3.org/TR/css-text-3/#word-break-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WordBreak {
    /// Words break at spaces, hyphens and around CJK characters.
    #[default]
    Normal,
    /// "Breaking is allowed within 'words'."
    BreakAll,
    /// CJK characters are not split from their neighbours either.
    KeepAll,
}

/// [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Flush right.
    Right,
    /// Centered.
    Center,
    /// Stretched, except for the last line.
    Justify,
}

/// [§ 10.8.1 vertical-align](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum VerticalAlign {
    /// "Align the baseline of the box with the baseline of the parent box."
    #[default]
    Baseline,
    /// "Lower the baseline of the box to the proper position for subscripts."
    Sub,
    /// "Raise the baseline of the box to the proper position for superscripts."
    Super,
    /// "Align the top of the box with the top of the parent's content area."
    TextTop,
    /// "Align the bottom of the box with the bottom of the parent's content area."
    TextBottom,
    /// "Align the top of the aligned subtree with the top of the line box."
    Top,
    /// "Align the vertical midpoint of the box with the baseline of the parent
    /// box plus half the x-height of the parent."
    Middle,
    /// "Align the bottom of the aligned subtree with the bottom of the line box."
    Bottom,
}

/// [§ 9.10 Text direction](https://www.w3.org/TR/CSS2/visuren.html#direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// [§ 12.5.1 Lists](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style-type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ListStyleType {
    /// No marker.
    None,
    /// A filled circle.
    #[default]
    Disc,
    /// A hollow circle.
    Circle,
    /// A filled square.
    Square,
    /// Decimal numbers, beginning with 1.
    Decimal,
    /// Decimal numbers padded by initial zeros (01, 02, …).
    DecimalLeadingZero,
    /// Lowercase ascii letters (a, b, c, … z, aa, …).
    LowerAlpha,
    /// Uppercase ascii letters.
    UpperAlpha,
    /// Same as lower-alpha.
    LowerLatin,
    /// Same as upper-alpha.
    UpperLatin,
    /// Lowercase roman numerals.
    LowerRoman,
    /// Uppercase roman numerals.
    UpperRoman,
    /// Lowercase classical Greek letters.
    LowerGreek,
}

/// [§ 17.6 Borders](https://www.w3.org/TR/CSS2/tables.html#borders)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BorderCollapse {
    /// Cells keep their own borders, separated by border-spacing.
    #[default]
    Separate,
    /// Adjacent cells share borders.
    Collapse,
}

/// [§ 8.5.3 Border style](https://www.w3.org/TR/CSS2/box.html#border-style-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BorderStyle {
    /// "No border; the computed border width is zero."
    #[default]
    None,
    /// "Same as 'none', except in terms of border conflict resolution."
    Hidden,
    /// "The border is a series of dots."
    Dotted,
    /// "The border is a series of short line segments."
    Dashed,
    /// "The border is a single line segment."
    Solid,
    /// Drawn as solid.
    Double,
    /// Drawn as inset.
    Groove,
    /// Drawn as outset.
    Ridge,
    /// "The border makes the box look as though it were embedded in the canvas."
    Inset,
    /// "The border makes the box look as though it were coming out of the canvas."
    Outset,
}

impl BorderStyle {
    /// Whether the style draws anything.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::None | Self::Hidden)
    }
}

/// [§ 13.3.2 page-break-inside](https://www.w3.org/TR/CSS2/page.html#page-break-props)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PageBreakInside {
    /// Breaks allowed.
    #[default]
    Auto,
    /// "Avoid a page break inside the generated box."
    Avoid,
}

/// [§ 16.3.1 text-decoration](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// "Each line of text is underlined."
    Underline,
    /// "Each line of text has a line above it."
    Overline,
    /// "Each line of text has a line through the middle."
    LineThrough,
}

/// [§ 15.4 Font styling](https://www.w3.org/TR/CSS2/fonts.html#font-styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FontSlant {
    /// Upright.
    #[default]
    Normal,
    /// Italic face.
    Italic,
    /// Slanted face; rendered as italic.
    Oblique,
}

/// [§ 14.2.1 background-repeat](https://www.w3.org/TR/CSS2/colors.html#propdef-background-repeat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BackgroundRepeat {
    /// "The image is repeated both horizontally and vertically."
    #[default]
    Repeat,
    /// "The image is repeated horizontally only."
    RepeatX,
    /// "The image is repeated vertically only."
    RepeatY,
    /// "The image is not repeated: only one copy of the image is drawn."
    NoRepeat,
}
