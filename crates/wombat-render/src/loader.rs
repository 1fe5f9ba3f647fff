//! Image loading pipeline: fetch, detect format, and decode.
//!
//! [§ 4.8.3 The img element](https://html.spec.whatwg.org/multipage/embedded-content.html#the-img-element)
//!
//! 1. **Fetch**: [`fetch_image_bytes`] reads local files relative to a base
//!    directory and decodes inline `data:` URLs.
//! 2. **Detect**: [`detect_format`] tells SVG from raster data by extension,
//!    MIME type, and magic bytes.
//! 3. **Decode**: [`ImageDecoder`] implementations turn bytes into
//!    [`LoadedImage`] pixels.
//!
//! [`FileImageLoader`] runs the pipeline inline for synchronous requests
//! and on a worker thread otherwise.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use wombat_common::data_url::decode_data_url;
use wombat_common::image::LoadedImage;
use wombat_common::warning::warn_once;
use wombat_layout::{ImageCompletion, ImageLoadResult, ImageLoader, ImageRequest};

use crate::error::{DecodeError, LoadError};

/// Detected image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// SVG vector image (decoded via usvg + resvg).
    Svg,
    /// Raster image (PNG, JPEG, GIF, … decoded via the `image` crate).
    Raster,
}

/// Strip the query string and fragment so the extension can be checked.
#[must_use]
pub fn strip_url_decorations(source: &str) -> &str {
    let without_fragment = source.split_once('#').map_or(source, |(b, _)| b);
    without_fragment
        .split_once('?')
        .map_or(without_fragment, |(b, _)| b)
}

fn warn_url_decorations(source: &str) {
    if source.starts_with("data:") {
        return;
    }
    if let Some((_, fragment)) = source.split_once('#') {
        warn_once(
            "image",
            &format!("ignoring fragment identifier '#{fragment}' in '{source}'"),
        );
    }
    let without_fragment = source.split_once('#').map_or(source, |(b, _)| b);
    if let Some((_, query)) = without_fragment.split_once('?') {
        warn_once("image", &format!("ignoring query string '?{query}' in '{source}'"));
    }
}

/// Whether `bytes` hold an SVG or a raster image.
///
/// A `.svg` extension or an `image/svg` data URL wins; otherwise the
/// first 256 non-whitespace bytes are sniffed for `<?xml` or `<svg`.
#[must_use]
pub fn detect_format(path_for_ext: &str, source: &str, bytes: &[u8]) -> ImageFormat {
    if Path::new(path_for_ext)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
    {
        return ImageFormat::Svg;
    }
    if source.starts_with("data:image/svg") {
        return ImageFormat::Svg;
    }
    let head: Vec<u8> = bytes
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take(256)
        .copied()
        .collect();
    if head.starts_with(b"<?xml") || head.starts_with(b"<svg") {
        return ImageFormat::Svg;
    }
    ImageFormat::Raster
}

/// Turns raw bytes into a [`LoadedImage`].
pub trait ImageDecoder: Send + Sync {
    /// Human-readable name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this decoder handles `format`.
    fn supports(&self, format: ImageFormat) -> bool;

    /// Decode `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes cannot be decoded.
    fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, DecodeError>;
}

/// Rasterizes SVG documents at their intrinsic size via usvg and resvg.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgDecoder;

impl ImageDecoder for SvgDecoder {
    fn name(&self) -> &'static str {
        "SVG (resvg)"
    }

    fn supports(&self, format: ImageFormat) -> bool {
        format == ImageFormat::Svg
    }

    fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, DecodeError> {
        let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())?;
        let size = tree.size();
        let (width, height) = (size.width().ceil() as u32, size.height().ceil() as u32);
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptySvg);
        }
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(DecodeError::Pixmap { width, height })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        // LoadedImage carries straight alpha; resvg renders premultiplied.
        let rgba = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Ok(LoadedImage::new(width, height, rgba))
    }
}

/// Decodes PNG, JPEG, GIF, … via the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn name(&self) -> &'static str {
        "Raster (image crate)"
    }

    fn supports(&self, format: ImageFormat) -> bool {
        format == ImageFormat::Raster
    }

    fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, DecodeError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(LoadedImage::new(width, height, rgba.into_raw()))
    }
}

/// Read the bytes behind `source`.
///
/// `data:` URLs are decoded in place. Anything else that names a URL
/// scheme is refused; the rest are file paths, resolved against
/// `base_dir` when relative.
///
/// # Errors
///
/// Returns [`LoadError`] if the data URL is malformed, the scheme is
/// unsupported, or the file cannot be read.
pub fn fetch_image_bytes(base_dir: &Path, source: &str) -> Result<Vec<u8>, LoadError> {
    if source.starts_with("data:") {
        return Ok(decode_data_url(source)?);
    }
    let path = strip_url_decorations(source);
    let path = path.strip_prefix("file://").unwrap_or(path);
    if path.contains("://") {
        return Err(LoadError::UnsupportedScheme(source.to_string()));
    }
    let path = base_dir.join(path);
    fs::read(&path).map_err(|source| LoadError::Read { path, source })
}

/// Format detection plus a list of decoders.
pub struct ImagePipeline {
    decoders: Vec<Box<dyn ImageDecoder>>,
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.decoders.iter().map(|d| d.name()).collect();
        f.debug_struct("ImagePipeline").field("decoders", &names).finish()
    }
}

impl ImagePipeline {
    /// A pipeline with the SVG and raster decoders.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: vec![Box::new(SvgDecoder), Box::new(RasterDecoder)],
        }
    }

    /// Detect the format of `bytes` and decode them.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the chosen decoder fails.
    pub fn decode(&self, bytes: &[u8], path_for_ext: &str, source: &str) -> Result<LoadedImage, DecodeError> {
        let format = detect_format(path_for_ext, source, bytes);
        match self.decoders.iter().find(|d| d.supports(format)) {
            Some(decoder) => {
                tracing::trace!(decoder = decoder.name(), "decoding image");
                decoder.decode(bytes)
            }
            // Both formats are covered by the default decoders.
            None => RasterDecoder.decode(bytes),
        }
    }

    /// Fetch and decode `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if fetching or decoding fails.
    pub fn load(&self, base_dir: &Path, source: &str) -> Result<LoadedImage, LoadError> {
        let source = source.trim();
        warn_url_decorations(source);
        let bytes = fetch_image_bytes(base_dir, source)?;
        Ok(self.decode(&bytes, strip_url_decorations(source), source)?)
    }
}

impl Default for ImagePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ImageLoader`] over local files and `data:` URLs.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    base_dir: PathBuf,
    pipeline: Arc<ImagePipeline>,
}

impl FileImageLoader {
    /// Resolve relative sources against `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            pipeline: Arc::new(ImagePipeline::new()),
        }
    }

    /// Directory relative sources resolve against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn resolve(pipeline: &ImagePipeline, base_dir: &Path, request: &ImageRequest) -> ImageLoadResult {
    match pipeline.load(base_dir, &request.source) {
        Ok(image) => {
            tracing::debug!(source = %request.source, width = image.width(), height = image.height(), "image loaded");
            ImageLoadResult::loaded(Arc::new(image))
        }
        Err(err) => {
            tracing::warn!(source = %request.source, error = %err, "image load failed");
            ImageLoadResult::failed()
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, request: ImageRequest, sync: bool, completion: ImageCompletion) {
        if sync {
            completion.complete(resolve(&self.pipeline, &self.base_dir, &request));
            return;
        }
        let pipeline = Arc::clone(&self.pipeline);
        let base_dir = self.base_dir.clone();
        let _ = thread::spawn(move || {
            if completion.is_cancelled() {
                return;
            }
            completion.complete(resolve(&pipeline, &base_dir, &request));
        });
    }
}
