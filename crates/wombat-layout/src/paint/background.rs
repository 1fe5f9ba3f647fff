//! Backgrounds: solid color, linear gradient, and tiled image.
//!
//! [§ 14.2 The background](https://www.w3.org/TR/CSS2/colors.html#background)
//!
//! "Authors may specify the background of an element (i.e., its rendering
//! surface) as either a color or an image. In terms of the box model,
//! 'background' refers to the background of the content, padding and
//! border areas."

use crate::geometry::Rect;
use crate::graphics::{Brush, GraphicsSurface, Path, rounded_rect_path};
use crate::image::{ImageState, ImageTarget};
use crate::layout::replaced;
use crate::length::CssLength;
use crate::measure;
use crate::style::BackgroundRepeat;
use crate::tree::{BoxId, BoxTree};

use super::{PaintContext, PaintError};

/// Upper bound on tiles per axis, for tiny images over huge areas.
const MAX_TILES: usize = 4096;

/// Rounded outline of `rect` from the corner radii of `id`, if any corner
/// is rounded.
pub(super) fn rounded_outline(tree: &BoxTree, id: BoxId, rect: Rect, cx: &PaintContext<'_>) -> Option<Path> {
    let style = &tree[id].style;
    if !style.is_rounded() {
        return None;
    }
    let em = measure::font_size(tree, id, cx.fonts);
    let c = &style.corner_radius;
    let px = |len: &CssLength| len.to_px(rect.width, em).max(0.0);
    Some(rounded_rect_path(rect, px(&c.nw), px(&c.ne), px(&c.se), px(&c.sw)))
}

/// Paint the background of `id` into `rect`.
///
/// The image is only drawn into the first rectangle of a box split across
/// lines.
pub(super) fn paint_background(
    tree: &mut BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    rect: Rect,
    is_first: bool,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return Ok(());
    }

    let style = &tree[id].style;
    let brush = match style.background_gradient {
        Some(end) => Some(Brush::LinearGradient {
            rect,
            start: style.background_color,
            end,
            angle: style.background_gradient_angle,
        }),
        None if style.background_color.is_visible() => Some(Brush::Solid(style.background_color)),
        None => None,
    };

    if let Some(brush) = brush {
        match rounded_outline(tree, id, rect, cx) {
            Some(path) => {
                g.set_antialias(!cx.settings.avoid_geometry_antialias);
                g.fill_path(&brush, &path);
                g.set_antialias(false);
            }
            None => g.fill_rectangle(&brush, rect),
        }
    }

    if is_first && tree[id].style.background_image.is_some() {
        let _ = replaced::ensure_requested(
            tree,
            id,
            ImageTarget::Background,
            cx.loader,
            cx.queue,
            cx.settings.avoid_async_image_loading,
        );
        if tree[id].background.state() == ImageState::Loaded {
            paint_image_tiles(tree, id, g, rect, cx)?;
        }
    }
    Ok(())
}

/// [§ 14.2.1 background-repeat](https://www.w3.org/TR/CSS2/colors.html#propdef-background-repeat)
///
/// "If a background image is specified, this property specifies whether
/// the image is repeated (tiled), and how."
fn paint_image_tiles(
    tree: &BoxTree,
    id: BoxId,
    g: &mut dyn GraphicsSurface,
    rect: Rect,
    cx: &PaintContext<'_>,
) -> Result<(), PaintError> {
    let node = &tree[id];
    let Some(image) = node.background.image() else {
        return Ok(());
    };
    let (width, height) = image.dimensions_f32();
    if width <= 0.0 || height <= 0.0 {
        return Ok(());
    }

    // "If a background image is specified, this property specifies its
    // initial position": percentages align the image point with the same
    // point of the area.
    let em = measure::font_size(tree, id, cx.fonts);
    let (pos_x, pos_y) = &node.style.background_position;
    let origin_x = rect.x + pos_x.to_px(rect.width - width, em);
    let origin_y = rect.y + pos_y.to_px(rect.height - height, em);

    let repeat = node.style.background_repeat;
    let repeat_x = matches!(repeat, BackgroundRepeat::Repeat | BackgroundRepeat::RepeatX);
    let repeat_y = matches!(repeat, BackgroundRepeat::Repeat | BackgroundRepeat::RepeatY);

    let xs = tile_starts(origin_x, width, rect.x, rect.right(), repeat_x);
    let ys = tile_starts(origin_y, height, rect.y, rect.bottom(), repeat_y);

    g.push_clip(rect);
    let mut result = Ok(());
    'tiles: for &y in &ys {
        for &x in &xs {
            if let Err(err) = g.draw_image(image, Rect::new(x, y, width, height), None) {
                result = Err(err.into());
                break 'tiles;
            }
        }
    }
    g.pop_clip();
    result
}

/// Tile origins along one axis covering `[min, max)`.
fn tile_starts(origin: f32, extent: f32, min: f32, max: f32, repeat: bool) -> Vec<f32> {
    if !repeat {
        return vec![origin];
    }
    let mut start = origin;
    if start > min {
        start -= ((start - min) / extent).ceil() * extent;
    } else if start + extent <= min {
        start += ((min - start) / extent).floor() * extent;
    }
    let mut starts = Vec::new();
    while start < max && starts.len() < MAX_TILES {
        if start + extent > min {
            starts.push(start);
        }
        start += extent;
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_starts_cover_area_from_origin() {
        assert_eq!(tile_starts(10.0, 20.0, 0.0, 50.0, true), vec![-10.0, 10.0, 30.0]);
        assert_eq!(tile_starts(10.0, 20.0, 0.0, 50.0, false), vec![10.0]);
    }

    #[test]
    fn test_tile_starts_skips_tiles_left_of_area() {
        let starts = tile_starts(-45.0, 10.0, 0.0, 25.0, true);
        assert_eq!(starts, vec![-5.0, 5.0, 15.0]);
    }
}
