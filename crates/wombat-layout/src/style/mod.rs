//! Box style model.
//!
//! [§ 6 Assigning property values, Cascading, and Inheritance](https://www.w3.org/TR/CSS2/cascade.html)
//!
//! Cascading happens upstream; this module stores the resulting declared
//! values of one box in typed form, handles inheritance from the parent box,
//! and parses property strings (`set_property("margin", "4px 8px")`).
//! Length resolution against a containing block happens at layout time.

pub mod color;
pub mod keywords;
pub mod ua;

use serde::Serialize;
use wombat_common::warning::warn_once;

use crate::length::CssLength;

pub use color::Color;
pub use keywords::{
    BackgroundRepeat, BorderCollapse, BorderStyle, Direction, DisplayKind, FontSlant,
    ListStyleType, Overflow, PageBreakInside, Position, TextAlign, TextDecoration, VerticalAlign,
    Visibility, WhiteSpace, WordBreak,
};

/// A length that may also be `auto`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum AutoLength {
    /// Resolved by the layout algorithm.
    #[default]
    Auto,
    /// An explicit length.
    Length(CssLength),
}

impl AutoLength {
    /// Parse `auto` (or `none`, for max-width) or a length.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") || value.eq_ignore_ascii_case("none") {
            Self::Auto
        } else {
            Self::Length(CssLength::parse(value))
        }
    }

    /// Whether the value is `auto`.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// The explicit length, if any.
    #[must_use]
    pub const fn length(&self) -> Option<&CssLength> {
        match self {
            Self::Auto => None,
            Self::Length(len) => Some(len),
        }
    }

    /// Resolve to pixels, with `auto` as 0.
    #[must_use]
    pub fn to_px(&self, hundred_percent: f32, em: f32) -> f32 {
        self.length().map_or(0.0, |len| len.to_px(hundred_percent, em))
    }
}

/// [§ 15.7 Font size](https://www.w3.org/TR/CSS2/fonts.html#font-size-props)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum FontSize {
    /// The parent's computed size.
    #[default]
    Inherit,
    /// An absolute-size keyword, already in pixels.
    Absolute(f32),
    /// `larger`/`smaller`: a factor on the parent's computed size.
    Scale(f32),
    /// A length; ems and percentages are relative to the parent's size.
    Length(CssLength),
}

impl FontSize {
    /// Parse a `font-size` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        let size = match value.as_str() {
            "xx-small" => Self::Absolute(9.0),
            "x-small" => Self::Absolute(10.0),
            "small" => Self::Absolute(13.0),
            "medium" => Self::Absolute(16.0),
            "large" => Self::Absolute(18.0),
            "x-large" => Self::Absolute(24.0),
            "xx-large" => Self::Absolute(32.0),
            "larger" => Self::Scale(1.2),
            "smaller" => Self::Scale(1.0 / 1.2),
            "inherit" => Self::Inherit,
            other => {
                let len = CssLength::parse(other);
                if len.has_error() {
                    return None;
                }
                Self::Length(len)
            }
        };
        Some(size)
    }

    /// Compute the size in pixels given the parent's computed size.
    #[must_use]
    pub fn resolve(&self, parent_px: f32) -> f32 {
        match self {
            Self::Inherit => parent_px,
            Self::Absolute(px) => *px,
            Self::Scale(factor) => parent_px * factor,
            Self::Length(len) => len.to_px(parent_px, parent_px),
        }
    }
}

/// [§ 10.8 line-height](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum LineHeight {
    /// Use the font's own line spacing.
    #[default]
    Normal,
    /// A multiple of the element's font size.
    Number(f32),
    /// An explicit length; percentages refer to the font size.
    Length(CssLength),
}

/// Per-side values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Sides<T> {
    /// Top side.
    pub top: T,
    /// Right side.
    pub right: T,
    /// Bottom side.
    pub bottom: T,
    /// Left side.
    pub left: T,
}

impl<T: Clone> Sides<T> {
    /// The same value on all four sides.
    #[must_use]
    pub fn all(value: T) -> Self {
        Self {
            top: value.clone(),
            right: value.clone(),
            bottom: value.clone(),
            left: value,
        }
    }

    /// Expand one to four values using the CSS shorthand rule.
    ///
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    ///
    /// "If there is only one component value, it applies to all sides. If
    /// there are two values, the top and bottom margins are set to the first
    /// value and the right and left margins are set to the second. If there
    /// are three values, the top is set to the first value, the left and
    /// right are set to the second, and the bottom is set to the third."
    #[must_use]
    pub fn expand(values: &[T]) -> Option<Self> {
        let (top, right, bottom, left) = match values {
            [a] => (a, a, a, a),
            [a, b] => (a, b, a, b),
            [a, b, c] => (a, b, c, b),
            [a, b, c, d] => (a, b, c, d),
            _ => return None,
        };
        Some(Self {
            top: top.clone(),
            right: right.clone(),
            bottom: bottom.clone(),
            left: left.clone(),
        })
    }

    fn set(&mut self, side: Side, value: T) {
        match side {
            Side::Top => self.top = value,
            Side::Right => self.right = value,
            Side::Bottom => self.bottom = value,
            Side::Left => self.left = value,
        }
    }

    /// Value for one side.
    #[must_use]
    pub const fn get(&self, side: Side) -> &T {
        match side {
            Side::Top => &self.top,
            Side::Right => &self.right,
            Side::Bottom => &self.bottom,
            Side::Left => &self.left,
        }
    }
}

/// A box side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Top side.
    Top,
    /// Right side.
    Right,
    /// Bottom side.
    Bottom,
    /// Left side.
    Left,
}

impl Side {
    /// All sides in CSS order.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "top" => Some(Self::Top),
            "right" => Some(Self::Right),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            _ => None,
        }
    }
}

/// Corner radii (north-west, north-east, south-east, south-west).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Corners {
    /// Top-left.
    pub nw: CssLength,
    /// Top-right.
    pub ne: CssLength,
    /// Bottom-right.
    pub se: CssLength,
    /// Bottom-left.
    pub sw: CssLength,
}

/// The declared style of one box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStyle {
    /// `display`
    pub display: DisplayKind,
    /// `position`
    pub position: Position,
    /// `visibility` (inherited)
    pub visibility: Visibility,
    /// `overflow`
    pub overflow: Overflow,
    /// `white-space` (inherited)
    pub white_space: WhiteSpace,
    /// `word-break` (inherited)
    pub word_break: WordBreak,
    /// `text-align` (inherited)
    pub text_align: TextAlign,
    /// `vertical-align`
    pub vertical_align: VerticalAlign,
    /// `direction` (inherited)
    pub direction: Direction,
    /// `list-style-type` (inherited)
    pub list_style_type: ListStyleType,
    /// `border-collapse` (inherited)
    pub border_collapse: BorderCollapse,
    /// `border-spacing` horizontal component (inherited)
    pub border_spacing_h: CssLength,
    /// `border-spacing` vertical component (inherited)
    pub border_spacing_v: CssLength,
    /// `page-break-inside`
    pub page_break_inside: PageBreakInside,
    /// `text-decoration`
    pub text_decoration: TextDecoration,
    /// `text-indent` (inherited)
    pub text_indent: CssLength,
    /// `word-spacing`; `None` is `normal` (inherited)
    pub word_spacing: Option<CssLength>,
    /// `line-height` (inherited)
    pub line_height: LineHeight,

    /// `width`
    pub width: AutoLength,
    /// `height`
    pub height: AutoLength,
    /// `max-width`; `auto` is `none`
    pub max_width: AutoLength,
    /// `left`
    pub left: AutoLength,
    /// `top`
    pub top: AutoLength,
    /// `margin-*`
    pub margin: Sides<AutoLength>,
    /// `padding-*`
    pub padding: Sides<CssLength>,
    /// `border-*-width`
    pub border_width: Sides<CssLength>,
    /// `border-*-style`
    pub border_style: Sides<BorderStyle>,
    /// `border-*-color`; `None` is `currentColor`
    pub border_color: Sides<Option<Color>>,
    /// `corner-*-radius`
    pub corner_radius: Corners,

    /// `color` (inherited)
    pub color: Color,
    /// `background-color`
    pub background_color: Color,
    /// `background-gradient`: end color of a linear gradient from the
    /// background color
    pub background_gradient: Option<Color>,
    /// `background-gradient-angle` in degrees
    pub background_gradient_angle: f32,
    /// `background-image` source
    pub background_image: Option<String>,
    /// `background-repeat`
    pub background_repeat: BackgroundRepeat,
    /// `background-position` (x, y)
    pub background_position: (CssLength, CssLength),

    /// `font-family`; empty means the document default (inherited)
    pub font_family: String,
    /// `font-size`
    pub font_size: FontSize,
    /// `font-weight` as a number (inherited)
    pub font_weight: u16,
    /// `font-style` (inherited)
    pub font_slant: FontSlant,
}

/// `medium` border width in pixels.
const MEDIUM_BORDER: f32 = 2.0;

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            display: DisplayKind::Inline,
            position: Position::Static,
            visibility: Visibility::Visible,
            overflow: Overflow::Visible,
            white_space: WhiteSpace::Normal,
            word_break: WordBreak::Normal,
            text_align: TextAlign::Left,
            vertical_align: VerticalAlign::Baseline,
            direction: Direction::Ltr,
            list_style_type: ListStyleType::Disc,
            border_collapse: BorderCollapse::Separate,
            border_spacing_h: CssLength::zero(),
            border_spacing_v: CssLength::zero(),
            page_break_inside: PageBreakInside::Auto,
            text_decoration: TextDecoration::None,
            text_indent: CssLength::zero(),
            word_spacing: None,
            line_height: LineHeight::Normal,
            width: AutoLength::Auto,
            height: AutoLength::Auto,
            max_width: AutoLength::Auto,
            left: AutoLength::Auto,
            top: AutoLength::Auto,
            margin: Sides::all(AutoLength::Length(CssLength::zero())),
            padding: Sides::all(CssLength::zero()),
            border_width: Sides::all(CssLength::px(MEDIUM_BORDER)),
            border_style: Sides::all(BorderStyle::None),
            border_color: Sides::all(None),
            corner_radius: Corners::default(),
            color: Color::BLACK,
            background_color: Color::TRANSPARENT,
            background_gradient: None,
            background_gradient_angle: 90.0,
            background_image: None,
            background_repeat: BackgroundRepeat::Repeat,
            background_position: (CssLength::percent(0.0), CssLength::percent(0.0)),
            font_family: String::new(),
            font_size: FontSize::Inherit,
            font_weight: 400,
            font_slant: FontSlant::Normal,
        }
    }
}

impl BoxStyle {
    /// Initial values for a child of `parent`, with inherited properties copied.
    ///
    /// [§ 6.2 Inheritance](https://www.w3.org/TR/CSS2/cascade.html#inheritance)
    #[must_use]
    pub fn inherit_from(parent: &Self) -> Self {
        Self {
            visibility: parent.visibility,
            white_space: parent.white_space,
            word_break: parent.word_break,
            text_align: parent.text_align,
            direction: parent.direction,
            list_style_type: parent.list_style_type,
            border_collapse: parent.border_collapse,
            border_spacing_h: parent.border_spacing_h.clone(),
            border_spacing_v: parent.border_spacing_v.clone(),
            text_indent: parent.text_indent.clone(),
            word_spacing: parent.word_spacing.clone(),
            line_height: parent.line_height.clone(),
            color: parent.color,
            font_family: parent.font_family.clone(),
            font_weight: parent.font_weight,
            font_slant: parent.font_slant,
            ..Self::default()
        }
    }

    /// Style for an anonymous box synthesized under `parent`.
    ///
    /// Anonymous boxes carry the parent's text decoration so underlines
    /// reach the text they wrap.
    #[must_use]
    pub fn anonymous(parent: &Self) -> Self {
        Self {
            text_decoration: parent.text_decoration,
            ..Self::inherit_from(parent)
        }
    }

    /// Whether any corner has a radius.
    #[must_use]
    pub fn is_rounded(&self) -> bool {
        let c = &self.corner_radius;
        [&c.nw, &c.ne, &c.se, &c.sw]
            .iter()
            .any(|len| len.number() > 0.0)
    }

    /// Whether the box is out of normal flow (absolute or fixed).
    #[must_use]
    pub const fn is_out_of_flow(&self) -> bool {
        matches!(self.position, Position::Absolute | Position::Fixed)
    }

    /// Whether the font is bold (weight 600 or more).
    #[must_use]
    pub const fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }

    /// Apply a `name: value; name: value` declaration block.
    pub fn apply_declarations(&mut self, block: &str) {
        for declaration in block.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                let _ = self.set_property(name, value);
            }
        }
    }

    /// Set one property from its CSS text. Returns whether it was applied.
    ///
    /// Unknown properties and unparseable values are warned about once and
    /// otherwise ignored.
    pub fn set_property(&mut self, name: &str, value: &str) -> bool {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches("!important").trim();
        let applied = self.apply(&name, value);
        match applied {
            Some(true) => true,
            Some(false) => {
                warn_once("CSS", &format!("invalid value '{value}' for '{name}'"));
                false
            }
            None => {
                warn_once("CSS", &format!("unsupported property '{name}'"));
                false
            }
        }
    }

    /// `None` if the property is unknown, `Some(applied)` otherwise.
    fn apply(&mut self, name: &str, value: &str) -> Option<bool> {
        let ok = match name {
            "display" => set_keyword(&mut self.display, value),
            "position" => set_keyword(&mut self.position, value),
            "visibility" => set_keyword(&mut self.visibility, value),
            "overflow" => set_keyword(&mut self.overflow, value),
            "white-space" => set_keyword(&mut self.white_space, value),
            "word-break" => set_keyword(&mut self.word_break, value),
            "text-align" => set_keyword(&mut self.text_align, value),
            "vertical-align" => set_keyword(&mut self.vertical_align, value),
            "direction" => set_keyword(&mut self.direction, value),
            "list-style-type" => set_keyword(&mut self.list_style_type, value),
            "list-style" => value
                .split_whitespace()
                .any(|token| set_keyword(&mut self.list_style_type, token)),
            "border-collapse" => set_keyword(&mut self.border_collapse, value),
            "page-break-inside" => set_keyword(&mut self.page_break_inside, value),
            "text-decoration" => value
                .split_whitespace()
                .any(|token| set_keyword(&mut self.text_decoration, token)),
            "font-style" => set_keyword(&mut self.font_slant, value),
            "background-repeat" => set_keyword(&mut self.background_repeat, value),
            "border-spacing" => self.set_border_spacing(value),
            "text-indent" => set_length(&mut self.text_indent, value),
            "word-spacing" => {
                if value.eq_ignore_ascii_case("normal") {
                    self.word_spacing = None;
                    true
                } else {
                    let mut len = CssLength::zero();
                    let ok = set_length(&mut len, value);
                    self.word_spacing = Some(len);
                    ok
                }
            }
            "line-height" => self.set_line_height(value),
            "width" => set_auto_length(&mut self.width, value),
            "height" => set_auto_length(&mut self.height, value),
            "max-width" => set_auto_length(&mut self.max_width, value),
            "left" => set_auto_length(&mut self.left, value),
            "top" => set_auto_length(&mut self.top, value),
            "margin" => match parse_all(value, |v| Some(AutoLength::parse(v)))
                .and_then(|values| Sides::expand(&values))
            {
                Some(sides) => {
                    self.margin = sides;
                    true
                }
                None => false,
            },
            "padding" => match parse_all(value, parse_length).and_then(|v| Sides::expand(&v)) {
                Some(sides) => {
                    self.padding = sides;
                    true
                }
                None => false,
            },
            "border-width" => {
                match parse_all(value, parse_border_width).and_then(|v| Sides::expand(&v)) {
                    Some(sides) => {
                        self.border_width = sides;
                        true
                    }
                    None => false,
                }
            }
            "border-style" => {
                match parse_all(value, |v| v.parse().ok()).and_then(|v| Sides::expand(&v)) {
                    Some(sides) => {
                        self.border_style = sides;
                        true
                    }
                    None => false,
                }
            }
            "border-color" => {
                match parse_all(value, |v| Color::parse(v).map(Some)).and_then(|v| Sides::expand(&v))
                {
                    Some(sides) => {
                        self.border_color = sides;
                        true
                    }
                    None => false,
                }
            }
            "border" => Side::ALL
                .iter()
                .all(|side| self.set_border_side(*side, value)),
            "corner-radius" => match parse_all(value, parse_length) {
                Some(values) => match Sides::expand(&values) {
                    Some(s) => {
                        self.corner_radius = Corners {
                            nw: s.top,
                            ne: s.right,
                            se: s.bottom,
                            sw: s.left,
                        };
                        true
                    }
                    None => false,
                },
                None => false,
            },
            "corner-nw-radius" => set_length(&mut self.corner_radius.nw, value),
            "corner-ne-radius" => set_length(&mut self.corner_radius.ne, value),
            "corner-se-radius" => set_length(&mut self.corner_radius.se, value),
            "corner-sw-radius" => set_length(&mut self.corner_radius.sw, value),
            "color" => set_color(&mut self.color, value),
            "background-color" => set_color(&mut self.background_color, value),
            "background-gradient" => {
                if value.eq_ignore_ascii_case("none") {
                    self.background_gradient = None;
                    true
                } else {
                    Color::parse(value).is_some_and(|c| {
                        self.background_gradient = Some(c);
                        true
                    })
                }
            }
            "background-gradient-angle" => value.parse::<f32>().is_ok_and(|angle| {
                self.background_gradient_angle = angle;
                true
            }),
            "background-image" => {
                self.background_image = parse_url(value);
                self.background_image.is_some() || value.eq_ignore_ascii_case("none")
            }
            "background-position" => self.set_background_position(value),
            "background" => self.set_background(value),
            "font-family" => {
                self.font_family = value.to_string();
                true
            }
            "font-size" => FontSize::parse(value).is_some_and(|size| {
                self.font_size = size;
                true
            }),
            "font-weight" => parse_font_weight(value).is_some_and(|weight| {
                self.font_weight = weight;
                true
            }),
            other => return self.apply_side_property(other, value),
        };
        Some(ok)
    }

    /// `margin-top`, `border-left-color`, `border-bottom`, …
    fn apply_side_property(&mut self, name: &str, value: &str) -> Option<bool> {
        let (group, rest) = name.split_once('-')?;
        let (side_name, field) = rest.split_once('-').unwrap_or((rest, ""));
        let side = Side::parse(side_name)?;
        let ok = match (group, field) {
            ("margin", "") => {
                self.margin.set(side, AutoLength::parse(value));
                true
            }
            ("padding", "") => parse_length(value).is_some_and(|len| {
                self.padding.set(side, len);
                true
            }),
            ("border", "") => self.set_border_side(side, value),
            ("border", "width") => parse_border_width(value).is_some_and(|len| {
                self.border_width.set(side, len);
                true
            }),
            ("border", "style") => value.parse().is_ok_and(|style| {
                self.border_style.set(side, style);
                true
            }),
            ("border", "color") => Color::parse(value).is_some_and(|color| {
                self.border_color.set(side, Some(color));
                true
            }),
            _ => return None,
        };
        Some(ok)
    }

    /// `border-<side>: <width> || <style> || <color>`
    fn set_border_side(&mut self, side: Side, value: &str) -> bool {
        let mut any = false;
        for token in value.split_whitespace() {
            if let Ok(style) = token.parse::<BorderStyle>() {
                self.border_style.set(side, style);
                any = true;
            } else if let Some(color) = Color::parse(token) {
                self.border_color.set(side, Some(color));
                any = true;
            } else if let Some(width) = parse_border_width(token) {
                self.border_width.set(side, width);
                any = true;
            }
        }
        any
    }

    fn set_border_spacing(&mut self, value: &str) -> bool {
        let Some(values) = parse_all(value, parse_length) else {
            return false;
        };
        match values.as_slice() {
            [both] => {
                self.border_spacing_h = both.clone();
                self.border_spacing_v = both.clone();
            }
            [h, v] => {
                self.border_spacing_h = h.clone();
                self.border_spacing_v = v.clone();
            }
            _ => return false,
        }
        true
    }

    fn set_line_height(&mut self, value: &str) -> bool {
        if value.eq_ignore_ascii_case("normal") {
            self.line_height = LineHeight::Normal;
            return true;
        }
        if let Ok(number) = value.parse::<f32>() {
            self.line_height = LineHeight::Number(number);
            return true;
        }
        match parse_length(value) {
            Some(len) => {
                self.line_height = LineHeight::Length(len);
                true
            }
            None => false,
        }
    }

    fn set_background_position(&mut self, value: &str) -> bool {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        let position = |token: &str| -> Option<CssLength> {
            match token.to_ascii_lowercase().as_str() {
                "left" | "top" => Some(CssLength::percent(0.0)),
                "center" => Some(CssLength::percent(50.0)),
                "right" | "bottom" => Some(CssLength::percent(100.0)),
                other => parse_length(other),
            }
        };
        let parsed = match tokens.as_slice() {
            [one] => position(one).map(|x| (x, CssLength::percent(50.0))),
            [x, y] => position(x).zip(position(y)),
            _ => None,
        };
        parsed.is_some_and(|pos| {
            self.background_position = pos;
            true
        })
    }

    /// `background: <color> || <image> || <repeat>`
    fn set_background(&mut self, value: &str) -> bool {
        let mut any = false;
        for token in value.split_whitespace() {
            if let Some(url) = parse_url(token) {
                self.background_image = Some(url);
                any = true;
            } else if let Ok(repeat) = token.parse::<BackgroundRepeat>() {
                self.background_repeat = repeat;
                any = true;
            } else if let Some(color) = Color::parse(token) {
                self.background_color = color;
                any = true;
            }
        }
        any
    }
}

fn set_keyword<T: std::str::FromStr>(field: &mut T, value: &str) -> bool {
    value.parse().is_ok_and(|parsed| {
        *field = parsed;
        true
    })
}

fn set_length(field: &mut CssLength, value: &str) -> bool {
    parse_length(value).is_some_and(|len| {
        *field = len;
        true
    })
}

fn set_auto_length(field: &mut AutoLength, value: &str) -> bool {
    let parsed = AutoLength::parse(value);
    let ok = parsed.length().is_none_or(|len| !len.has_error());
    *field = parsed;
    ok
}

fn set_color(field: &mut Color, value: &str) -> bool {
    Color::parse(value).is_some_and(|color| {
        *field = color;
        true
    })
}

fn parse_length(value: &str) -> Option<CssLength> {
    let len = CssLength::parse(value);
    (!len.has_error()).then_some(len)
}

/// [§ 8.5.1 Border width](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
///
/// "'thin' <= 'medium' <= 'thick'"
fn parse_border_width(value: &str) -> Option<CssLength> {
    match value.to_ascii_lowercase().as_str() {
        "thin" => Some(CssLength::px(1.0)),
        "medium" => Some(CssLength::px(MEDIUM_BORDER)),
        "thick" => Some(CssLength::px(4.0)),
        other => parse_length(other),
    }
}

fn parse_font_weight(value: &str) -> Option<u16> {
    match value.to_ascii_lowercase().as_str() {
        "normal" | "lighter" => Some(400),
        "bold" | "bolder" => Some(700),
        other => other.parse::<u16>().ok().filter(|w| (1..=1000).contains(w)),
    }
}

/// `url(foo.png)`, `url("foo.png")`, or `none`.
fn parse_url(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix("url(")?.strip_suffix(')')?;
    let inner = inner.trim().trim_matches(|c| c == '"' || c == '\'');
    (!inner.is_empty()).then(|| inner.to_string())
}

fn parse_all<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    value.split_whitespace().map(parse).collect()
}
