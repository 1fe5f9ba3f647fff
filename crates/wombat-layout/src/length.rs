//! CSS length parsing and unit conversion.
//!
//! [§ 4.1 Lengths](https://www.w3.org/TR/CSS2/syndata.html#length-units)
//!
//! "The format of a length value is a <number> (with or without a decimal
//! point) immediately followed by a unit identifier (e.g., px, em, etc.).
//! After a zero length, the unit identifier is optional."
//!
//! Parsing never fails: malformed input produces a [`CssLength`] with its
//! error flag set and whatever number could be salvaged, so style code can
//! keep going with a best-effort value.

use std::fmt;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::LengthError;

/// Pixels per inch, the CSS reference resolution.
pub const PIXELS_PER_INCH: f32 = 96.0;

/// A length unit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum LengthUnit {
    /// No unit: unit-less zero, bare numbers, and error values.
    #[default]
    #[strum(serialize = "")]
    None,
    /// "the 'font-size' of the relevant font"
    #[strum(serialize = "em")]
    Em,
    /// "the 'x-height' of the relevant font"
    #[strum(serialize = "ex")]
    Ex,
    /// "pixel units"
    #[strum(serialize = "px")]
    Px,
    /// "inches — 1in is equal to 2.54cm"
    #[strum(serialize = "in")]
    In,
    /// "centimeters"
    #[strum(serialize = "cm")]
    Cm,
    /// "millimeters"
    #[strum(serialize = "mm")]
    Mm,
    /// "points — the points used by CSS are equal to 1/72nd of 1in"
    #[strum(serialize = "pt")]
    Pt,
    /// "picas — 1pc is equal to 12pt"
    #[strum(serialize = "pc")]
    Pc,
}

impl LengthUnit {
    /// Coarse classification used by callers that only care about the family.
    #[must_use]
    pub const fn class(self) -> UnitClass {
        match self {
            Self::None => UnitClass::None,
            Self::Em | Self::Ex | Self::Px => UnitClass::PixelLike,
            Self::In | Self::Cm | Self::Mm | Self::Pt | Self::Pc => UnitClass::Absolute,
        }
    }

    /// Pixels per one unit for absolute and pixel units.
    ///
    /// Font-relative units return `None`; they need a font size.
    #[must_use]
    pub const fn pixels_per_unit(self) -> Option<f32> {
        match self {
            Self::None | Self::Px => Some(1.0),
            Self::In => Some(PIXELS_PER_INCH),
            Self::Cm => Some(PIXELS_PER_INCH / 2.54),
            Self::Mm => Some(PIXELS_PER_INCH / 25.4),
            Self::Pt => Some(PIXELS_PER_INCH / 72.0),
            Self::Pc => Some(PIXELS_PER_INCH / 6.0),
            Self::Em | Self::Ex => None,
        }
    }
}

/// Unit families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitClass {
    /// No unit, or an error value.
    None,
    /// A percentage of some reference length.
    Percentage,
    /// Screen-relative units (px, em, ex).
    PixelLike,
    /// Physical units (in, cm, mm, pt, pc).
    Absolute,
}

/// A parsed CSS length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssLength {
    number: f32,
    unit: LengthUnit,
    is_percentage: bool,
    has_error: bool,
}

impl Default for CssLength {
    fn default() -> Self {
        Self::zero()
    }
}

impl CssLength {
    /// Unit-less zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            number: 0.0,
            unit: LengthUnit::None,
            is_percentage: false,
            has_error: false,
        }
    }

    /// A pixel length.
    #[must_use]
    pub const fn px(number: f32) -> Self {
        Self {
            number,
            unit: LengthUnit::Px,
            is_percentage: false,
            has_error: false,
        }
    }

    /// A length in `unit`.
    #[must_use]
    pub const fn with_unit(number: f32, unit: LengthUnit) -> Self {
        Self {
            number,
            unit,
            is_percentage: false,
            has_error: false,
        }
    }

    /// A percentage.
    #[must_use]
    pub const fn percent(number: f32) -> Self {
        Self {
            number,
            unit: LengthUnit::None,
            is_percentage: true,
            has_error: false,
        }
    }

    /// Parse a length string.
    ///
    /// `""` and `"0"` are zero without error. A trailing `%` marks a
    /// percentage. Otherwise the last two characters are the unit; anything
    /// shorter than three characters, or with a suffix that is not a known
    /// unit, is flagged as an error but still carries the leading number.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let text = input.trim();

        // STEP 1: Unit-less zero short-circuits.
        if text.is_empty() || text == "0" {
            return Self::zero();
        }

        // STEP 2: Percentages short-circuit without a unit lookup.
        if let Some(number) = text.strip_suffix('%') {
            return match number.trim().parse::<f32>() {
                Ok(n) => Self::percent(n),
                Err(_) => Self {
                    number: leading_number(number),
                    is_percentage: true,
                    has_error: true,
                    ..Self::zero()
                },
            };
        }

        // STEP 3: Too short to carry a two-letter unit.
        if text.chars().count() < 3 {
            return Self::error(leading_number(text));
        }

        // STEP 4: Split off the unit suffix.
        let split = text
            .char_indices()
            .rev()
            .nth(1)
            .map_or(0, |(index, _)| index);
        let (number, suffix) = text.split_at(split);
        let Ok(unit) = suffix.parse::<LengthUnit>() else {
            return Self::error(leading_number(text));
        };
        if unit == LengthUnit::None {
            return Self::error(leading_number(text));
        }

        match number.trim().parse::<f32>() {
            Ok(n) => Self::with_unit(n, unit),
            Err(_) => Self {
                number: leading_number(number),
                unit,
                is_percentage: false,
                has_error: true,
            },
        }
    }

    fn error(number: f32) -> Self {
        Self {
            number,
            has_error: true,
            ..Self::zero()
        }
    }

    /// The numeric part.
    #[must_use]
    pub const fn number(&self) -> f32 {
        self.number
    }

    /// The unit (`None` for percentages and errors).
    #[must_use]
    pub const fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// Whether the value ended in `%`.
    #[must_use]
    pub const fn is_percentage(&self) -> bool {
        self.is_percentage
    }

    /// Whether the value is font-relative (em/ex).
    #[must_use]
    pub const fn is_relative(&self) -> bool {
        matches!(self.unit, LengthUnit::Em | LengthUnit::Ex)
    }

    /// Whether parsing flagged the value as malformed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.has_error
    }

    /// Unit classification of the value.
    #[must_use]
    pub const fn class(&self) -> UnitClass {
        if self.has_error {
            UnitClass::None
        } else if self.is_percentage {
            UnitClass::Percentage
        } else {
            self.unit.class()
        }
    }

    /// Convert an em length to points, given the em size in points.
    ///
    /// # Errors
    ///
    /// Fails for error values and for any unit other than `em`.
    pub fn to_points(&self, em_size: f32) -> Result<Self, LengthError> {
        self.ensure_ems()?;
        Ok(Self::with_unit(self.number * em_size, LengthUnit::Pt))
    }

    /// Convert an em length to pixels, given the pixels per em.
    ///
    /// # Errors
    ///
    /// Fails for error values and for any unit other than `em`.
    pub fn to_pixels(&self, pixel_factor: f32) -> Result<Self, LengthError> {
        self.ensure_ems()?;
        Ok(Self::px(self.number * pixel_factor))
    }

    fn ensure_ems(&self) -> Result<(), LengthError> {
        if self.has_error {
            return Err(LengthError::Invalid(self.to_string()));
        }
        if self.unit != LengthUnit::Em {
            return Err(LengthError::NotEms(self.to_string()));
        }
        Ok(())
    }

    /// Resolve to pixels.
    ///
    /// Percentages resolve against `hundred_percent`; `em` against `em`;
    /// `ex` against half of it. Bare numbers and error values are taken as
    /// pixels, the way HTML dimension attributes are.
    #[must_use]
    pub fn to_px(&self, hundred_percent: f32, em: f32) -> f32 {
        if self.is_percentage {
            return self.number * hundred_percent / 100.0;
        }
        let factor = match self.unit {
            LengthUnit::Em => em,
            LengthUnit::Ex => em / 2.0,
            unit => unit.pixels_per_unit().unwrap_or(1.0),
        };
        self.number * factor
    }

    /// Whether the value is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.number == 0.0
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_percentage {
            write!(f, "{}%", self.number)
        } else {
            write!(f, "{}{}", self.number, self.unit.as_ref())
        }
    }
}

/// Parse the longest numeric prefix of `text`, or 0.
fn leading_number(text: &str) -> f32 {
    let text = text.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (index, ch) in text.char_indices() {
        match ch {
            '+' | '-' if index == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = index + ch.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    text[..end].trim_end_matches('.').parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_number_salvages_prefix() {
        assert_eq!(leading_number("12xx"), 12.0);
        assert_eq!(leading_number("-1.5em"), -1.5);
        assert_eq!(leading_number("abc"), 0.0);
        assert_eq!(leading_number("3."), 3.0);
    }
}
