//! Border painting.
//!
//! [§ 8.5 Border properties](https://www.w3.org/TR/CSS2/box.html#border-properties)
//!
//! A box split across several lines draws its left border only on the
//! first rectangle and its right border only on the last.

use crate::geometry::{EdgeSizes, Point, Rect};
use crate::graphics::{Brush, DashStyle, GraphicsSurface, Path, Pen};
use crate::length::CssLength;
use crate::measure;
use crate::style::{BorderStyle, Color};
use crate::tree::{BoxId, BoxTree};

use super::PaintContext;

/// Control-point distance for a quarter circle as a fraction of its radius.
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// One side's resolved paint parameters.
#[derive(Debug, Clone, Copy)]
struct SidePaint {
    width: f32,
    style: BorderStyle,
    color: Color,
}

/// Paint the borders of `id` around `rect`.
pub(super) fn paint_borders(
    tree: &BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    rect: Rect,
    is_first: bool,
    is_last: bool,
    cx: &PaintContext<'_>,
) {
    let style = &tree[id].style;
    let styles = &style.border_style;
    if ![styles.top, styles.right, styles.bottom, styles.left]
        .iter()
        .any(|s| s.is_visible())
    {
        return;
    }
    let widths = measure::edges(tree, id, cx.fonts).border;
    let side = |width: f32, border: BorderStyle, color: Option<Color>| SidePaint {
        width: if border.is_visible() { width } else { 0.0 },
        style: border,
        color: color.unwrap_or(style.color),
    };
    let top = side(widths.top, style.border_style.top, style.border_color.top);
    let bottom = side(widths.bottom, style.border_style.bottom, style.border_color.bottom);
    let mut left = side(widths.left, style.border_style.left, style.border_color.left);
    let mut right = side(widths.right, style.border_style.right, style.border_color.right);
    if !is_first {
        left.width = 0.0;
    }
    if !is_last {
        right.width = 0.0;
    }
    let insets = EdgeSizes::new(top.width, right.width, bottom.width, left.width);

    let radii = corner_radii(tree, id, rect, cx);
    g.set_antialias(radii.is_some() && !cx.settings.avoid_geometry_antialias);
    for (which, paint) in [
        (Side::Top, top),
        (Side::Left, left),
        (Side::Bottom, bottom),
        (Side::Right, right),
    ] {
        if paint.width > 0.0 && paint.color.is_visible() {
            paint_side(g, which, paint, rect, &insets, radii);
        }
    }
    g.set_antialias(false);
}

/// Corner radii (nw, ne, se, sw) in pixels, when any is set.
fn corner_radii(tree: &BoxTree, id: BoxId, rect: Rect, cx: &PaintContext<'_>) -> Option<[f32; 4]> {
    let style = &tree[id].style;
    if !style.is_rounded() {
        return None;
    }
    let em = measure::font_size(tree, id, cx.fonts);
    let max = rect.width.min(rect.height) / 2.0;
    let px = |len: &CssLength| len.to_px(rect.width, em).clamp(0.0, max);
    let c = &style.corner_radius;
    Some([px(&c.nw), px(&c.ne), px(&c.se), px(&c.sw)])
}

fn paint_side(
    g: &mut dyn GraphicsSurface,
    side: Side,
    paint: SidePaint,
    rect: Rect,
    insets: &EdgeSizes,
    radii: Option<[f32; 4]>,
) {
    match paint.style {
        BorderStyle::Inset | BorderStyle::Outset | BorderStyle::Groove | BorderStyle::Ridge => {
            // [§ 8.5.3](https://www.w3.org/TR/CSS2/box.html#border-style-properties)
            // "inset: The border makes the box look as though it were
            // embedded in the canvas."
            let sunken = matches!(paint.style, BorderStyle::Inset | BorderStyle::Groove);
            let shaded = match side {
                Side::Top | Side::Left => sunken,
                Side::Bottom | Side::Right => !sunken,
            };
            let color = if shaded { paint.color.darken() } else { paint.color };
            g.fill_polygon(&Brush::Solid(color), &bevel(side, rect, insets));
        }
        BorderStyle::None | BorderStyle::Hidden => {}
        BorderStyle::Solid | BorderStyle::Double | BorderStyle::Dashed | BorderStyle::Dotted => {
            let dash = match paint.style {
                BorderStyle::Dashed => DashStyle::Dash,
                BorderStyle::Dotted => DashStyle::Dot,
                _ => DashStyle::Solid,
            };
            let pen = Pen {
                color: paint.color,
                width: paint.width,
                dash,
            };
            let half = paint.width / 2.0;
            match (side, radii) {
                (Side::Top | Side::Bottom, Some(radii)) => {
                    g.draw_path(&pen, &rounded_edge(side, rect, half, radii));
                }
                _ => {
                    let (from, to) = center_line(side, rect, half, radii);
                    g.draw_line(&pen, from, to);
                }
            }
        }
    }
}

/// Trapezoid covering one side, mitred against its neighbors.
fn bevel(side: Side, rect: Rect, insets: &EdgeSizes) -> [Point; 4] {
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    match side {
        Side::Top => [
            Point::new(l, t),
            Point::new(r, t),
            Point::new(r - insets.right, t + insets.top),
            Point::new(l + insets.left, t + insets.top),
        ],
        Side::Bottom => [
            Point::new(l, b),
            Point::new(r, b),
            Point::new(r - insets.right, b - insets.bottom),
            Point::new(l + insets.left, b - insets.bottom),
        ],
        Side::Left => [
            Point::new(l, t),
            Point::new(l + insets.left, t + insets.top),
            Point::new(l + insets.left, b - insets.bottom),
            Point::new(l, b),
        ],
        Side::Right => [
            Point::new(r, t),
            Point::new(r - insets.right, t + insets.top),
            Point::new(r - insets.right, b - insets.bottom),
            Point::new(r, b),
        ],
    }
}

/// Straight stroke along the middle of one side. Vertical sides of a
/// rounded box stop where the corner arcs begin.
fn center_line(side: Side, rect: Rect, half: f32, radii: Option<[f32; 4]>) -> (Point, Point) {
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let [nw, ne, se, sw] = radii.unwrap_or([0.0; 4]);
    match side {
        Side::Top => (Point::new(l, t + half), Point::new(r, t + half)),
        Side::Bottom => (Point::new(l, b - half), Point::new(r, b - half)),
        Side::Left => (Point::new(l + half, t + nw), Point::new(l + half, b - sw)),
        Side::Right => (Point::new(r - half, t + ne), Point::new(r - half, b - se)),
    }
}

/// Top or bottom edge including its two corner arcs, inset by `half`.
fn rounded_edge(side: Side, rect: Rect, half: f32, [nw, ne, se, sw]: [f32; 4]) -> Path {
    let (l, t, r, b) = (
        rect.left() + half,
        rect.top() + half,
        rect.right() - half,
        rect.bottom() - half,
    );
    let mut path = Path::new();
    if side == Side::Top {
        let _ = path.move_to(l, t + nw);
        if nw > 0.0 {
            let _ = path.cubic_to(
                Point::new(l, t + nw - nw * KAPPA),
                Point::new(l + nw - nw * KAPPA, t),
                Point::new(l + nw, t),
            );
        }
        let _ = path.line_to(r - ne, t);
        if ne > 0.0 {
            let _ = path.cubic_to(
                Point::new(r - ne + ne * KAPPA, t),
                Point::new(r, t + ne - ne * KAPPA),
                Point::new(r, t + ne),
            );
        }
    } else {
        let _ = path.move_to(r, b - se);
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
    }
    path
}
