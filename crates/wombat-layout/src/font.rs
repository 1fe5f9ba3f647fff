//! Font handles, the font-provider capability, and the per-document font cache.
//!
//! [§ 15 Fonts](https://www.w3.org/TR/CSS2/fonts.html)
//!
//! "In CSS, font properties are used to select a font face that is used to
//! render text." Selection itself is delegated to a [`FontProvider`]; the
//! [`FontCache`] guarantees a single shared handle per (family, size, style).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::FontError;

bitflags! {
    /// Face variant requested from a [`FontProvider`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        /// `font-weight` of 600 or more.
        const BOLD = 1 << 0;
        /// `font-style: italic | oblique`.
        const ITALIC = 1 << 1;
    }
}

/// A resolved font handle.
///
/// `face` is an opaque provider-defined index that concrete graphics
/// surfaces use to find the glyph source again.
#[derive(Clone, PartialEq)]
pub struct Font {
    /// Family actually selected.
    pub family: String,
    /// Size in pixels.
    pub size: f32,
    /// Style actually selected; may be plainer than requested.
    pub style: FontStyle,
    /// Provider-defined face index.
    pub face: u32,
    /// Line spacing in pixels.
    pub height: f32,
    /// Distance from the top of the line to the baseline.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line.
    pub descent: f32,
    /// Offset below the baseline at which to draw underlines.
    pub underline_offset: f32,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Font({} {}px {:?})", self.family, self.size, self.style)
    }
}

impl Font {
    /// Line spacing of the font.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Top of the font's ascent relative to the top of its line.
    #[must_use]
    pub fn baseline(&self) -> f32 {
        self.ascent
    }
}

/// Font lookup capability.
pub trait FontProvider {
    /// Return a font for a single family name, or `None` if the family or
    /// the requested style is not available.
    fn create_font(&self, family: &str, size: f32, style: FontStyle) -> Option<Font>;
}

impl<T: FontProvider + ?Sized> FontProvider for Rc<T> {
    fn create_font(&self, family: &str, size: f32, style: FontStyle) -> Option<Font> {
        (**self).create_font(family, size, style)
    }
}

/// Deterministic metrics that need no font files.
///
/// Advance is `0.6 × size` per character, line height `1.2 × size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontProvider;

impl ApproximateFontProvider {
    /// Advance width of one character at `size`.
    #[must_use]
    pub fn advance(size: f32) -> f32 {
        size * 0.6
    }
}

impl FontProvider for ApproximateFontProvider {
    fn create_font(&self, family: &str, size: f32, style: FontStyle) -> Option<Font> {
        Some(Font {
            family: family.to_string(),
            size,
            style,
            face: 0,
            height: size * 1.2,
            ascent: size * 0.9,
            descent: size * 0.3,
            underline_offset: size * 0.1,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    size_bits: u32,
    style: FontStyle,
}

/// Per-document font cache.
///
/// Grows for the lifetime of the document; dropped wholesale with it.
pub struct FontCache {
    provider: Box<dyn FontProvider>,
    default_family: String,
    default_size: f32,
    fonts: RefCell<HashMap<FontKey, Rc<Font>>>,
}

impl fmt::Debug for FontCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCache")
            .field("default_family", &self.default_family)
            .field("default_size", &self.default_size)
            .field("len", &self.fonts.borrow().len())
            .finish_non_exhaustive()
    }
}

impl FontCache {
    /// Create an empty cache over `provider`.
    ///
    /// `default_family` and `default_size` apply to the root box and to
    /// boxes whose families are all unavailable.
    pub fn new(
        provider: Box<dyn FontProvider>,
        default_family: impl Into<String>,
        default_size: f32,
    ) -> Self {
        Self {
            provider,
            default_family: default_family.into(),
            default_size,
            fonts: RefCell::new(HashMap::new()),
        }
    }

    /// Family used when a box names none, or none of its families resolve.
    #[must_use]
    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Font size of the root box in pixels.
    #[must_use]
    pub const fn default_size(&self) -> f32 {
        self.default_size
    }

    /// Number of distinct fonts handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fonts.borrow().len()
    }

    /// Whether no font has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.borrow().is_empty()
    }

    /// Drop every cached font.
    pub fn clear(&self) {
        self.fonts.borrow_mut().clear();
    }

    /// Get the font for a comma-separated family list.
    ///
    /// [§ 15.3 Font family](https://www.w3.org/TR/CSS2/fonts.html#font-family-prop)
    ///
    /// "The property value is a prioritized list of font family names and/or
    /// generic family names." Each family is tried with the requested style,
    /// then with the plain style; the default family closes the list.
    /// Identical requests return the same `Rc`.
    pub fn get(&self, families: &str, size: f32, style: FontStyle) -> Result<Rc<Font>, FontError> {
        let key = FontKey {
            family: families.to_string(),
            size_bits: size.to_bits(),
            style,
        };
        if let Some(font) = self.fonts.borrow().get(&key) {
            return Ok(Rc::clone(font));
        }

        let candidates = families
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
            .chain(std::iter::once(self.default_family.as_str()));

        let mut found = None;
        for family in candidates {
            found = self
                .provider
                .create_font(family, size, style)
                .or_else(|| {
                    (!style.is_empty())
                        .then(|| self.provider.create_font(family, size, FontStyle::empty()))
                        .flatten()
                });
            if found.is_some() {
                break;
            }
        }

        let font = Rc::new(found.ok_or_else(|| FontError::Unavailable {
            family: families.to_string(),
            size: size.to_string(),
        })?);
        let _ = self.fonts.borrow_mut().insert(key, Rc::clone(&font));
        Ok(font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnlyPlain;

    impl FontProvider for OnlyPlain {
        fn create_font(&self, family: &str, size: f32, style: FontStyle) -> Option<Font> {
            (family == "Plain" && style.is_empty())
                .then(|| ApproximateFontProvider.create_font(family, size, style))
                .flatten()
        }
    }

    #[test]
    fn identical_keys_share_one_handle() {
        let cache = FontCache::new(Box::new(ApproximateFontProvider), "serif", 16.0);
        let a = cache.get("serif", 16.0, FontStyle::BOLD).unwrap();
        let b = cache.get("serif", 16.0, FontStyle::BOLD).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn falls_back_to_plain_style_then_default_family() {
        let cache = FontCache::new(Box::new(OnlyPlain), "Plain", 16.0);
        let font = cache.get("Missing, Plain", 12.0, FontStyle::ITALIC).unwrap();
        assert_eq!(font.family, "Plain");
        assert!(font.style.is_empty());

        let fallback = cache.get("Missing", 12.0, FontStyle::empty()).unwrap();
        assert_eq!(fallback.family, "Plain");
    }

    #[test]
    fn unavailable_everywhere_is_an_error() {
        let cache = FontCache::new(Box::new(OnlyPlain), "Nope", 16.0);
        assert!(cache.get("Missing", 12.0, FontStyle::empty()).is_err());
    }
}
