//! Concrete collaborators for the Wombat engine.
//!
//! # Scope
//!
//! This crate provides:
//! - **Fonts** - system font discovery and fontdue measurement
//!   ([`SystemFonts`])
//! - **Raster Surface** - a tiny-skia [`GraphicsSurface`] with a mask-based
//!   clip stack, gradients, dashed pens and scaled images
//!   ([`RasterSurface`])
//! - **Images** - a file and `data:` URL loader decoding raster formats via
//!   `image` and SVG via usvg/resvg ([`FileImageLoader`])
//!
//! # Not Yet Implemented
//!
//! - Network fetches for `http(s)` image sources
//! - Font family matching by face name; faces are registered per family

pub mod error;
pub mod fonts;
pub mod loader;
pub mod surface;

use std::rc::Rc;

use wombat_layout::{Document, GraphicsSurface, PaintOutcome};

pub use error::{DecodeError, FontLoadError, LoadError, RenderError};
pub use fonts::SystemFonts;
pub use loader::{FileImageLoader, ImageDecoder, ImageFormat, ImagePipeline, RasterDecoder, SvgDecoder};
pub use surface::RasterSurface;

/// Paint `document` onto a fresh `width × height` raster surface.
///
/// The document should already be laid out. Boxes that fail to paint are
/// reported through the document's error sink and left blank.
///
/// # Errors
///
/// Returns [`RenderError`] if the surface cannot be created or paint fails
/// structurally.
pub fn render(
    document: &mut Document,
    fonts: Rc<SystemFonts>,
    width: u32,
    height: u32,
) -> Result<RasterSurface, RenderError> {
    let mut surface = RasterSurface::new(width, height, fonts)?;
    let outcome = document.paint(&mut surface)?;
    if outcome == PaintOutcome::Failed {
        tracing::warn!("parts of the document failed to paint");
    }
    if surface.clip_depth() != 0 {
        tracing::warn!(depth = surface.clip_depth(), "unbalanced clip stack after paint");
        while surface.clip_depth() > 0 {
            surface.pop_clip();
        }
    }
    Ok(surface)
}
