//! Graphics-surface capability.
//!
//! Layout only needs text measurement ([`TextMeasure`]); paint needs the
//! full [`GraphicsSurface`]. Brushes, pens and paths are plain values so any
//! backend can interpret them.

use std::rc::Rc;

use wombat_common::image::LoadedImage;

use crate::error::GraphicsError;
use crate::font::{ApproximateFontProvider, Font};
use crate::geometry::{Point, Rect, Size};
use crate::style::Color;

/// Line pattern of a [`Pen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashStyle {
    /// Continuous.
    #[default]
    Solid,
    /// Dashes three widths long.
    Dash,
    /// Dots one width long.
    Dot,
}

/// Stroke parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f32,
    /// Dash pattern.
    pub dash: DashStyle,
}

impl Pen {
    /// A solid pen.
    #[must_use]
    pub const fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: DashStyle::Solid,
        }
    }
}

/// Fill parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Brush {
    /// Uniform color.
    Solid(Color),
    /// Linear gradient across `rect` at `angle` degrees (90 is left to right).
    LinearGradient {
        /// Area the gradient spans.
        rect: Rect,
        /// Color at the start edge.
        start: Color,
        /// Color at the end edge.
        end: Color,
        /// Direction in degrees.
        angle: f32,
    },
}

impl Brush {
    /// Start and end points of a gradient brush's axis.
    ///
    /// The axis passes through the center of `rect`; 0° runs bottom to top,
    /// 90° left to right.
    #[must_use]
    pub fn gradient_axis(rect: Rect, angle: f32) -> (Point, Point) {
        let radians = angle.to_radians();
        let (dx, dy) = (radians.sin(), -radians.cos());
        let half = (rect.width * dx.abs() + rect.height * dy.abs()) / 2.0;
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        (
            Point::new(cx - dx * half, cy - dy * half),
            Point::new(cx + dx * half, cy + dy * half),
        )
    }
}

/// One path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Start a subpath.
    MoveTo(Point),
    /// Straight line.
    LineTo(Point),
    /// Cubic Bézier with two control points.
    CubicTo(Point, Point, Point),
    /// Close the subpath.
    Close,
}

/// A vector path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Start a subpath.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::MoveTo(Point::new(x, y)));
        self
    }

    /// Straight line.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::LineTo(Point::new(x, y)));
        self
    }

    /// Cubic Bézier.
    pub fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        self.segments.push(PathSegment::CubicTo(c1, c2, to));
        self
    }

    /// Close the subpath.
    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self
    }
}

/// Control-point distance for a quarter circle as a fraction of its radius.
const KAPPA: f32 = 0.552_284_8;

/// Rounded rectangle with per-corner radii (clockwise from top-left).
#[must_use]
pub fn rounded_rect_path(rect: Rect, nw: f32, ne: f32, se: f32, sw: f32) -> Path {
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let max = rect.width.min(rect.height) / 2.0;
    let (nw, ne, se, sw) = (nw.min(max), ne.min(max), se.min(max), sw.min(max));
    let mut path = Path::new();
    let _ = path.move_to(l + nw, t).line_to(r - ne, t);
    if ne > 0.0 {
        let _ = path.cubic_to(
            Point::new(r - ne + ne * KAPPA, t),
            Point::new(r, t + ne - ne * KAPPA),
            Point::new(r, t + ne),
        );
    }
    let _ = path.line_to(r, b - se);
    if se > 0.0 {
        let _ = path.cubic_to(
            Point::new(r, b - se + se * KAPPA),
            Point::new(r - se + se * KAPPA, b),
            Point::new(r - se, b),
        );
    }
    let _ = path.line_to(l + sw, b);
    if sw > 0.0 {
        let _ = path.cubic_to(
            Point::new(l + sw - sw * KAPPA, b),
            Point::new(l, b - sw + sw * KAPPA),
            Point::new(l, b - sw),
        );
    }
    let _ = path.line_to(l, t + nw);
    if nw > 0.0 {
        let _ = path.cubic_to(
            Point::new(l, t + nw - nw * KAPPA),
            Point::new(l + nw - nw * KAPPA, t),
            Point::new(l + nw, t),
        );
    }
    let _ = path.close();
    path
}

/// Text measurement, all that layout needs from a surface.
pub trait TextMeasure {
    /// Extent of `text` set in `font`.
    fn measure_string(&self, text: &str, font: &Font) -> Size;

    /// Width of the first `chars` characters of `text`.
    fn measure_prefix(&self, text: &str, font: &Font, chars: usize) -> f32 {
        let end = text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i);
        self.measure_string(&text[..end], font).width
    }
}

impl<T: TextMeasure + ?Sized> TextMeasure for Rc<T> {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        (**self).measure_string(text, font)
    }

    fn measure_prefix(&self, text: &str, font: &Font, chars: usize) -> f32 {
        (**self).measure_prefix(text, font, chars)
    }
}

/// Drawing capability used by paint.
pub trait GraphicsSurface: TextMeasure {
    /// Draw `text` with its top-left at `origin`. `size` is the measured
    /// extent; `rtl` requests right-to-left shaping.
    fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        color: Color,
        origin: Point,
        size: Size,
        rtl: bool,
    );
    /// Stroke a line.
    fn draw_line(&mut self, pen: &Pen, from: Point, to: Point);
    /// Stroke a rectangle outline.
    fn draw_rectangle(&mut self, pen: &Pen, rect: Rect);
    /// Fill a rectangle.
    fn fill_rectangle(&mut self, brush: &Brush, rect: Rect);
    /// Stroke a path.
    fn draw_path(&mut self, pen: &Pen, path: &Path);
    /// Fill a path.
    fn fill_path(&mut self, brush: &Brush, path: &Path);
    /// Fill a closed polygon.
    fn fill_polygon(&mut self, brush: &Brush, points: &[Point]);
    /// Draw `source` (or the whole image) of `image` scaled into `dest`.
    fn draw_image(
        &mut self,
        image: &LoadedImage,
        dest: Rect,
        source: Option<Rect>,
    ) -> Result<(), GraphicsError>;
    /// Intersect the clip with `rect` and push it.
    fn push_clip(&mut self, rect: Rect);
    /// Push the current clip minus `rect`.
    fn push_clip_exclude(&mut self, rect: Rect);
    /// Restore the clip before the last push.
    fn pop_clip(&mut self);
    /// Disable clipping until [`GraphicsSurface::resume_clipping`].
    fn suspend_clipping(&mut self);
    /// Re-enable the clip stack.
    fn resume_clipping(&mut self);
    /// Bounds of the current clip.
    fn clip(&self) -> Rect;
    /// Toggle anti-aliasing of geometry (not text).
    fn set_antialias(&mut self, _enabled: bool) {}
}

/// A draw call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// `draw_string`
    Text {
        /// Text drawn.
        text: String,
        /// Top-left origin.
        origin: Point,
        /// Fill color.
        color: Color,
    },
    /// `draw_line`
    Line {
        /// Pen used.
        pen: Pen,
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
    },
    /// `draw_rectangle`
    StrokeRect {
        /// Pen used.
        pen: Pen,
        /// Rectangle.
        rect: Rect,
    },
    /// `fill_rectangle`
    FillRect {
        /// Brush used.
        brush: Brush,
        /// Rectangle.
        rect: Rect,
    },
    /// `draw_path`
    StrokePath {
        /// Pen used.
        pen: Pen,
        /// Path.
        path: Path,
    },
    /// `fill_path`
    FillPath {
        /// Brush used.
        brush: Brush,
        /// Path.
        path: Path,
    },
    /// `fill_polygon`
    FillPolygon {
        /// Brush used.
        brush: Brush,
        /// Vertices.
        points: Vec<Point>,
    },
    /// `draw_image`
    Image {
        /// Destination.
        dest: Rect,
        /// Source sub-rectangle.
        source: Option<Rect>,
    },
    /// `push_clip`
    PushClip(Rect),
    /// `push_clip_exclude`
    PushClipExclude(Rect),
    /// `pop_clip`
    PopClip,
}

/// Surface that records draw calls and measures with approximate metrics.
///
/// Text advances `0.6 × size` per character, matching
/// [`ApproximateFontProvider`].
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    bounds: Rect,
    clips: Vec<Rect>,
    suspended: bool,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// A surface of `width × height` pixels.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, width, height),
            clips: Vec::new(),
            suspended: false,
            commands: Vec::new(),
        }
    }

    /// Commands recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Texts drawn, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Depth of the clip stack.
    #[must_use]
    pub fn clip_depth(&self) -> usize {
        self.clips.len()
    }
}

impl TextMeasure for RecordingSurface {
    fn measure_string(&self, text: &str, font: &Font) -> Size {
        let chars = text.chars().count() as f32;
        Size::new(chars * ApproximateFontProvider::advance(font.size), font.height)
    }
}

impl GraphicsSurface for RecordingSurface {
    fn draw_string(
        &mut self,
        text: &str,
        _font: &Font,
        color: Color,
        origin: Point,
        _size: Size,
        _rtl: bool,
    ) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            color,
        });
    }

    fn draw_line(&mut self, pen: &Pen, from: Point, to: Point) {
        self.commands.push(DrawCommand::Line { pen: *pen, from, to });
    }

    fn draw_rectangle(&mut self, pen: &Pen, rect: Rect) {
        self.commands.push(DrawCommand::StrokeRect { pen: *pen, rect });
    }

    fn fill_rectangle(&mut self, brush: &Brush, rect: Rect) {
        self.commands.push(DrawCommand::FillRect {
            brush: *brush,
            rect,
        });
    }

    fn draw_path(&mut self, pen: &Pen, path: &Path) {
        self.commands.push(DrawCommand::StrokePath {
            pen: *pen,
            path: path.clone(),
        });
    }

    fn fill_path(&mut self, brush: &Brush, path: &Path) {
        self.commands.push(DrawCommand::FillPath {
            brush: *brush,
            path: path.clone(),
        });
    }

    fn fill_polygon(&mut self, brush: &Brush, points: &[Point]) {
        self.commands.push(DrawCommand::FillPolygon {
            brush: *brush,
            points: points.to_vec(),
        });
    }

    fn draw_image(
        &mut self,
        image: &LoadedImage,
        dest: Rect,
        source: Option<Rect>,
    ) -> Result<(), GraphicsError> {
        if !image.is_well_formed() {
            return Err(GraphicsError::InvalidImage(format!("{image:?}")));
        }
        self.commands.push(DrawCommand::Image { dest, source });
        Ok(())
    }

    fn push_clip(&mut self, rect: Rect) {
        let clipped = self.clip().intersect(&rect);
        self.clips.push(clipped);
        self.commands.push(DrawCommand::PushClip(rect));
    }

    fn push_clip_exclude(&mut self, rect: Rect) {
        self.clips.push(self.clip());
        self.commands.push(DrawCommand::PushClipExclude(rect));
    }

    fn pop_clip(&mut self) {
        let _ = self.clips.pop();
        self.commands.push(DrawCommand::PopClip);
    }

    fn suspend_clipping(&mut self) {
        self.suspended = true;
    }

    fn resume_clipping(&mut self) {
        self.suspended = false;
    }

    fn clip(&self) -> Rect {
        if self.suspended {
            return self.bounds;
        }
        self.clips.last().copied().unwrap_or(self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounded_rect_has_four_curves() {
        let path = rounded_rect_path(Rect::new(0.0, 0.0, 40.0, 20.0), 4.0, 4.0, 4.0, 4.0);
        let curves = path
            .segments()
            .iter()
            .filter(|s| matches!(s, PathSegment::CubicTo(..)))
            .count();
        assert_eq!(curves, 4);
    }

    #[test]
    fn horizontal_gradient_axis_spans_width() {
        let (start, end) = Brush::gradient_axis(Rect::new(0.0, 0.0, 100.0, 10.0), 90.0);
        assert!((start.x - 0.0).abs() < 0.01);
        assert!((end.x - 100.0).abs() < 0.01);
    }
}
