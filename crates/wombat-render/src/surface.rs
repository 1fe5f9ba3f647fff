//! Raster graphics surface backed by tiny-skia.
//!
//! Geometry goes through tiny-skia paths and shaders; glyphs are
//! rasterized by fontdue and blended straight into the pixmap. Clipping
//! keeps a stack of coverage masks, each the intersection of its parent
//! with the pushed region, so push-exclude composes like any other clip.

use std::path::Path as FsPath;
use std::rc::Rc;

use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, GradientStop, LinearGradient, Mask, Paint, PathBuilder, Pattern, Pixmap,
    SpreadMode, Stroke, StrokeDash, Transform,
};
use wombat_common::image::LoadedImage;
use wombat_common::warning::warn_once;
use wombat_layout::graphics::PathSegment;
use wombat_layout::{
    Brush, Color, DashStyle, Font, GraphicsError, GraphicsSurface, Path, Pen, Point, Rect, Size, TextMeasure,
};

use crate::error::RenderError;
use crate::fonts::SystemFonts;

struct Clip {
    rect: Rect,
    /// `None` when the mask could not be allocated; drawing is unclipped.
    mask: Option<Mask>,
}

/// A pixel buffer that implements [`GraphicsSurface`].
pub struct RasterSurface {
    pixmap: Pixmap,
    fonts: Rc<SystemFonts>,
    clips: Vec<Clip>,
    suspended: bool,
    antialias: bool,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("clip_depth", &self.clips.len())
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}

impl RasterSurface {
    /// A white surface of `width × height` pixels drawing text with `fonts`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SurfaceSize`] if either dimension is zero or
    /// the buffer cannot be allocated.
    pub fn new(width: u32, height: u32, fonts: Rc<SystemFonts>) -> Result<Self, RenderError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::SurfaceSize { width, height })?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Ok(Self {
            pixmap,
            fonts,
            clips: Vec::new(),
            suspended: false,
            antialias: false,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Number of clips currently pushed.
    #[must_use]
    pub fn clip_depth(&self) -> usize {
        self.clips.len()
    }

    /// Color of one pixel, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Straight-alpha copy of the pixels.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let data = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        // The buffer is exactly width × height × 4 by construction.
        RgbaImage::from_raw(self.width(), self.height(), data).unwrap_or_else(|| RgbaImage::new(1, 1))
    }

    /// Encode the pixels as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Save`] if the file cannot be written.
    pub fn save_png(&self, path: &FsPath) -> Result<(), RenderError> {
        self.to_rgba_image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| RenderError::Save {
                path: path.to_path_buf(),
                source,
            })
    }

    fn full_mask(&self) -> Option<Mask> {
        let mut mask = Mask::new(self.width(), self.height())?;
        mask.data_mut().fill(255);
        Some(mask)
    }

    /// A copy of the current coverage to narrow down.
    fn base_mask(&self) -> Option<Mask> {
        match self.clips.last() {
            Some(clip) => clip.mask.clone(),
            None => self.full_mask(),
        }
    }

    fn paint(&self, brush: &Brush) -> Paint<'static> {
        let mut paint = Paint {
            anti_alias: self.antialias,
            ..Paint::default()
        };
        match *brush {
            Brush::Solid(color) => paint.set_color(skia_color(color)),
            Brush::LinearGradient { rect, start, end, angle } => {
                let (from, to) = Brush::gradient_axis(rect, angle);
                match LinearGradient::new(
                    skia_point(from),
                    skia_point(to),
                    vec![
                        GradientStop::new(0.0, skia_color(start)),
                        GradientStop::new(1.0, skia_color(end)),
                    ],
                    SpreadMode::Pad,
                    Transform::identity(),
                ) {
                    Some(shader) => paint.shader = shader,
                    None => paint.set_color(skia_color(start)),
                }
            }
        }
        paint
    }

    fn stroke_skia_path(&mut self, pen: &Pen, path: &tiny_skia::Path) {
        if pen.width <= 0.0 || pen.color.a == 0 {
            return;
        }
        let mut paint = Paint {
            anti_alias: self.antialias,
            ..Paint::default()
        };
        paint.set_color(skia_color(pen.color));
        let mask = active_mask(&self.clips, self.suspended);
        self.pixmap
            .stroke_path(path, &paint, &stroke(pen), Transform::identity(), mask);
    }

    fn fill_skia_path(&mut self, brush: &Brush, path: &tiny_skia::Path, rule: FillRule) {
        let paint = self.paint(brush);
        let mask = active_mask(&self.clips, self.suspended);
        self.pixmap
            .fill_path(path, &paint, rule, Transform::identity(), mask);
    }

    /// Source-over blend of a glyph coverage bitmap in `color`.
    #[allow(clippy::cast_possible_wrap)]
    fn blend_coverage(&mut self, left: i32, top: i32, width: usize, coverage: &[u8], color: Color) {
        if width == 0 || color.a == 0 {
            return;
        }
        let (w, h) = (self.pixmap.width() as i32, self.pixmap.height() as i32);
        let mask = active_mask(&self.clips, self.suspended);
        let data = self.pixmap.data_mut();
        for (row, line) in coverage.chunks_exact(width).enumerate() {
            let y = top + row as i32;
            if y < 0 || y >= h {
                continue;
            }
            for (col, &cov) in line.iter().enumerate() {
                let x = left + col as i32;
                if x < 0 || x >= w || cov == 0 {
                    continue;
                }
                let index = (y * w + x) as usize;
                let mut alpha = u32::from(cov) * u32::from(color.a) / 255;
                if let Some(mask) = mask {
                    alpha = alpha * u32::from(mask.data()[index]) / 255;
                }
                if alpha == 0 {
                    continue;
                }
                let o = index * 4;
                let inverse = 255 - alpha;
                for (i, channel) in [color.r, color.g, color.b].into_iter().enumerate() {
                    let src = u32::from(channel) * alpha / 255;
                    data[o + i] = (src + u32::from(data[o + i]) * inverse / 255) as u8;
                }
                data[o + 3] = (alpha + u32::from(data[o + 3]) * inverse / 255) as u8;
            }
        }
    }
}

fn active_mask(clips: &[Clip], suspended: bool) -> Option<&Mask> {
    if suspended {
        return None;
    }
    clips.last().and_then(|c| c.mask.as_ref())
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn skia_point(point: Point) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(point.x, point.y)
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

fn stroke(pen: &Pen) -> Stroke {
    let dash = match pen.dash {
        DashStyle::Solid => None,
        DashStyle::Dash => StrokeDash::new(vec![pen.width * 3.0, pen.width * 3.0], 0.0),
        DashStyle::Dot => StrokeDash::new(vec![pen.width, pen.width], 0.0),
    };
    Stroke {
        width: pen.width,
        dash,
        ..Stroke::default()
    }
}

fn skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
            PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
            PathSegment::CubicTo(c1, c2, to) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y),
            PathSegment::Close => pb.close(),
        }
    }
    pb.finish()
}

fn polygon_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

/// Premultiplied copy of straight RGBA pixels.
fn to_pixmap(image: &LoadedImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (px, rgba) in pixmap.pixels_mut().iter_mut().zip(image.rgba_data().chunks_exact(4)) {
        *px = ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
    }
    Some(pixmap)
}

impl TextMeasure for RasterSurface {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        self.fonts.measure_string(text, font)
    }
}

impl GraphicsSurface for RasterSurface {
    #[allow(clippy::cast_possible_wrap)]
    fn draw_string(&mut self, text: &str, font: &Font, color: Color, origin: Point, _size: Size, rtl: bool) {
        let fonts = Rc::clone(&self.fonts);
        let Some(face) = fonts.face(font.face) else {
            warn_once("fonts", &format!("no face for {font:?}, text skipped"));
            return;
        };
        let baseline = (origin.y + font.ascent).round() as i32;
        let mut glyphs: Vec<char> = text.chars().filter(|ch| !ch.is_control()).collect();
        if rtl {
            glyphs.reverse();
        }
        let mut cursor = origin.x;
        for ch in glyphs {
            let (metrics, bitmap) = face.rasterize(ch, font.size);
            let left = cursor.round() as i32 + metrics.xmin;
            let top = baseline - metrics.ymin - metrics.height as i32;
            self.blend_coverage(left, top, metrics.width, &bitmap, color);
            cursor += metrics.advance_width;
        }
    }

    fn draw_line(&mut self, pen: &Pen, from: Point, to: Point) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        if let Some(path) = pb.finish() {
            self.stroke_skia_path(pen, &path);
        }
    }

    fn draw_rectangle(&mut self, pen: &Pen, rect: Rect) {
        if let Some(r) = skia_rect(rect) {
            self.stroke_skia_path(pen, &PathBuilder::from_rect(r));
        }
    }

    fn fill_rectangle(&mut self, brush: &Brush, rect: Rect) {
        let Some(r) = skia_rect(rect) else {
            return;
        };
        let paint = self.paint(brush);
        let mask = active_mask(&self.clips, self.suspended);
        self.pixmap.fill_rect(r, &paint, Transform::identity(), mask);
    }

    fn draw_path(&mut self, pen: &Pen, path: &Path) {
        if let Some(path) = skia_path(path) {
            self.stroke_skia_path(pen, &path);
        }
    }

    fn fill_path(&mut self, brush: &Brush, path: &Path) {
        if let Some(path) = skia_path(path) {
            self.fill_skia_path(brush, &path, FillRule::Winding);
        }
    }

    fn fill_polygon(&mut self, brush: &Brush, points: &[Point]) {
        if let Some(path) = polygon_path(points) {
            self.fill_skia_path(brush, &path, FillRule::Winding);
        }
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: Rect, source: Option<Rect>) -> Result<(), GraphicsError> {
        if !image.is_well_formed() || image.width() == 0 || image.height() == 0 {
            return Err(GraphicsError::InvalidImage(format!("{image:?}")));
        }
        let Some(target) = skia_rect(dest) else {
            return Ok(());
        };
        let (w, h) = image.dimensions_f32();
        let src = source.unwrap_or(Rect::new(0.0, 0.0, w, h));
        if src.width <= 0.0 || src.height <= 0.0 {
            return Err(GraphicsError::InvalidGeometry(format!("empty source rectangle {src:?}")));
        }
        let pixmap = to_pixmap(image).ok_or_else(|| GraphicsError::InvalidImage(format!("{image:?}")))?;

        let (sx, sy) = (dest.width / src.width, dest.height / src.height);
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, dest.x - src.x * sx, dest.y - src.y * sy);
        let paint = Paint {
            shader: Pattern::new(pixmap.as_ref(), SpreadMode::Pad, FilterQuality::Bilinear, 1.0, transform),
            anti_alias: self.antialias,
            ..Paint::default()
        };
        let mask = active_mask(&self.clips, self.suspended);
        self.pixmap
            .fill_rect(target, &paint, Transform::identity(), mask);
        Ok(())
    }

    fn push_clip(&mut self, rect: Rect) {
        let bounds = self.clip().intersect(&rect);
        let mut mask = self.base_mask();
        if let Some(mask) = &mut mask {
            match skia_rect(bounds) {
                Some(r) => mask.intersect_path(
                    &PathBuilder::from_rect(r),
                    FillRule::Winding,
                    false,
                    Transform::identity(),
                ),
                None => mask.data_mut().fill(0),
            }
        }
        self.clips.push(Clip { rect: bounds, mask });
    }

    fn push_clip_exclude(&mut self, rect: Rect) {
        let bounds = self.clip();
        let mut mask = self.base_mask();
        let canvas = skia_rect(Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32));
        if let (Some(mask), Some(canvas), Some(hole)) = (&mut mask, canvas, skia_rect(rect)) {
            let mut pb = PathBuilder::new();
            pb.push_rect(canvas);
            pb.push_rect(hole);
            if let Some(path) = pb.finish() {
                mask.intersect_path(&path, FillRule::EvenOdd, false, Transform::identity());
            }
        }
        self.clips.push(Clip { rect: bounds, mask });
    }

    fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            tracing::warn!("pop_clip without a matching push");
        }
    }

    fn suspend_clipping(&mut self) {
        self.suspended = true;
    }

    fn resume_clipping(&mut self) {
        self.suspended = false;
    }

    fn clip(&self) -> Rect {
        let full = Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32);
        match self.clips.last() {
            Some(clip) if !self.suspended => clip.rect,
            _ => full,
        }
    }

    fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
    }
}
