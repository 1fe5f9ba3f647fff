//! System fonts backed by fontdue.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! Faces are registered per (family, style). Generic families without a
//! face of their own fall back to `sans-serif`; other unknown families are
//! reported as unavailable so the font cache moves on down the family list.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use fontdue::FontSettings;
use wombat_common::warning::warn_once;
use wombat_layout::{ApproximateFontProvider, Font, FontProvider, FontStyle, Size, TextMeasure};

use crate::error::FontLoadError;

const BOLD_ITALIC: FontStyle = FontStyle::BOLD.union(FontStyle::ITALIC);

/// Where to look for each face, in order of preference.
const SEARCH_PATHS: &[(&str, FontStyle, &[&str])] = &[
    (
        "sans-serif",
        FontStyle::empty(),
        &[
            // macOS
            "/System/Library/Fonts/Helvetica.ttc",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            // Linux
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
            // Windows
            "C:\\Windows\\Fonts\\arial.ttf",
            "C:\\Windows\\Fonts\\segoeui.ttf",
        ],
    ),
    (
        "sans-serif",
        FontStyle::BOLD,
        &[
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "/Library/Fonts/Arial Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
            "C:\\Windows\\Fonts\\arialbd.ttf",
        ],
    ),
    (
        "sans-serif",
        FontStyle::ITALIC,
        &[
            "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
            "/Library/Fonts/Arial Italic.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
            "C:\\Windows\\Fonts\\ariali.ttf",
        ],
    ),
    (
        "sans-serif",
        BOLD_ITALIC,
        &[
            "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
            "/Library/Fonts/Arial Bold Italic.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
            "C:\\Windows\\Fonts\\arialbi.ttf",
        ],
    ),
    (
        "serif",
        FontStyle::empty(),
        &[
            "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
            "/usr/share/fonts/TTF/DejaVuSerif.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
            "C:\\Windows\\Fonts\\times.ttf",
        ],
    ),
    (
        "monospace",
        FontStyle::empty(),
        &[
            "/System/Library/Fonts/Supplemental/Courier New.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
            "C:\\Windows\\Fonts\\cour.ttf",
        ],
    ),
];

/// [§ 15.3 Font family](https://www.w3.org/TR/CSS2/fonts.html#generic-font-families)
const GENERIC_FAMILIES: &[&str] = &["serif", "sans-serif", "cursive", "fantasy", "monospace", "system-ui"];

/// fontdue faces keyed by family and style.
#[derive(Default)]
pub struct SystemFonts {
    faces: Vec<fontdue::Font>,
    families: HashMap<(String, FontStyle), u32>,
}

impl fmt::Debug for SystemFonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.families.keys().collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.bits().cmp(&b.1.bits())));
        f.debug_struct("SystemFonts")
            .field("faces", &self.faces.len())
            .field("families", &keys)
            .finish()
    }
}

impl SystemFonts {
    /// No faces at all. Text measures with approximate metrics and draws
    /// nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the first readable face for every entry of the built-in search
    /// list.
    #[must_use]
    pub fn discover() -> Self {
        let mut fonts = Self::empty();
        for &(family, style, paths) in SEARCH_PATHS {
            for path in paths {
                match fonts.add_file(family, style, path) {
                    Ok(_) => {
                        tracing::debug!(family, ?style, path, "loaded font");
                        break;
                    }
                    Err(err) => tracing::trace!(path, error = %err, "font candidate skipped"),
                }
            }
        }
        if !fonts.has_family("sans-serif") {
            warn_once("fonts", "no system font found, text will not be rendered");
        }
        fonts
    }

    /// Register a face from a file.
    ///
    /// # Errors
    ///
    /// Returns [`FontLoadError`] if the file cannot be read or parsed.
    pub fn add_file(
        &mut self,
        family: &str,
        style: FontStyle,
        path: impl AsRef<Path>,
    ) -> Result<u32, FontLoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| FontLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_face(family, style, data)
    }

    /// Register a face from font file bytes. Returns its face index.
    ///
    /// # Errors
    ///
    /// Returns [`FontLoadError::Parse`] if fontdue rejects the data.
    pub fn add_face(&mut self, family: &str, style: FontStyle, data: Vec<u8>) -> Result<u32, FontLoadError> {
        let face = fontdue::Font::from_bytes(data, FontSettings::default()).map_err(FontLoadError::Parse)?;
        let index = self.faces.len() as u32;
        self.faces.push(face);
        let _ = self
            .families
            .insert((family.to_ascii_lowercase(), style), index);
        Ok(index)
    }

    /// Whether any face is registered under `family`.
    #[must_use]
    pub fn has_family(&self, family: &str) -> bool {
        let family = family.to_ascii_lowercase();
        self.families.keys().any(|(f, _)| *f == family)
    }

    /// Number of registered faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The face behind a [`Font::face`] index.
    #[must_use]
    pub fn face(&self, index: u32) -> Option<&fontdue::Font> {
        self.faces.get(index as usize)
    }

    fn lookup(&self, family: &str, style: FontStyle) -> Option<u32> {
        let family = family.to_ascii_lowercase();
        if let Some(&index) = self.families.get(&(family.clone(), style)) {
            return Some(index);
        }
        if GENERIC_FAMILIES.contains(&family.as_str()) && !self.has_family(&family) {
            return self.families.get(&("sans-serif".to_string(), style)).copied();
        }
        None
    }
}

impl FontProvider for SystemFonts {
    fn create_font(&self, family: &str, size: f32, style: FontStyle) -> Option<Font> {
        let index = self.lookup(family, style)?;
        let face = self.face(index)?;
        let (ascent, descent, gap) = face
            .horizontal_line_metrics(size)
            .map_or((size * 0.9, size * 0.3, 0.0), |m| (m.ascent, -m.descent, m.line_gap));
        Some(Font {
            family: family.to_string(),
            size,
            style,
            face: index,
            height: ascent + descent + gap,
            ascent: ascent + gap / 2.0,
            descent: descent + gap / 2.0,
            underline_offset: (descent / 3.0).max(1.0),
        })
    }
}

impl TextMeasure for SystemFonts {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        let visible = text.chars().filter(|ch| !ch.is_control());
        let width = match self.face(font.face) {
            // Same cursor advance as glyph drawing in the raster surface.
            Some(face) => visible.map(|ch| face.metrics(ch, font.size).advance_width).sum(),
            None => visible.count() as f32 * ApproximateFontProvider::advance(font.size),
        };
        Size::new(width, font.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_fonts() {
        let fonts = SystemFonts::empty();
        assert!(fonts.create_font("sans-serif", 16.0, FontStyle::empty()).is_none());
        assert_eq!(fonts.face_count(), 0);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let mut fonts = SystemFonts::empty();
        let result = fonts.add_face("broken", FontStyle::empty(), vec![0, 1, 2, 3]);
        assert!(matches!(result, Err(FontLoadError::Parse(_))));
        assert!(!fonts.has_family("broken"));
    }

    #[test]
    fn test_measure_without_face_is_approximate() {
        let fonts = SystemFonts::empty();
        let font = ApproximateFontProvider
            .create_font("sans-serif", 10.0, FontStyle::empty())
            .expect("approximate font");
        let size = fonts.measure_string("abc", &font);
        assert!((size.width - 18.0).abs() < 0.01, "got {}", size.width);
        assert!((size.height - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let mut fonts = SystemFonts::empty();
        let result = fonts.add_file("x", FontStyle::empty(), "/nonexistent/font.ttf");
        assert!(matches!(result, Err(FontLoadError::Read { .. })));
    }
}
