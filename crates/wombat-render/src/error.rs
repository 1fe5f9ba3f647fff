//! Error types for the render crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use wombat_common::data_url::DataUrlError;
use wombat_layout::PaintError;

/// A font file could not be used.
#[derive(Debug, Error)]
pub enum FontLoadError {
    /// The file could not be read.
    #[error("failed to read font '{}': {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// fontdue rejected the data.
    #[error("failed to parse font: {0}")]
    Parse(&'static str),
}

/// Image bytes could not be turned into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// usvg rejected the document.
    #[error("failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),
    /// The SVG has no area to rasterize.
    #[error("SVG has zero-size dimensions")]
    EmptySvg,
    /// tiny-skia could not allocate the target.
    #[error("failed to allocate a {width}x{height} pixmap")]
    Pixmap {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The `image` crate could not decode the data.
    #[error("could not decode image ({0})")]
    Raster(#[from] image::ImageError),
}

/// An image source could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A local file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        /// Resolved path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An inline `data:` URL was malformed.
    #[error(transparent)]
    DataUrl(#[from] DataUrlError),
    /// The source names a scheme this loader does not fetch.
    #[error("unsupported image source '{0}'")]
    UnsupportedScheme(String),
    /// The bytes could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Rendering a document to pixels failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested surface has no pixels or is too large.
    #[error("cannot create a {width}x{height} surface")]
    SurfaceSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Paint failed structurally.
    #[error(transparent)]
    Paint(#[from] PaintError),
    /// The image could not be encoded or written.
    #[error("failed to save '{}': {source}", path.display())]
    Save {
        /// Output path.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },
}
