//! Replaced and special boxes: images, frames, horizontal rules, and image
//! requests.
//!
//! [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
//!
//! "If 'height' and 'width' both have computed values of 'auto' and the
//! element also has an intrinsic width, then that intrinsic width is the
//! used value of 'width'."

use crate::error::LayoutError;
use crate::geometry::{Point, Size};
use crate::image::{
    ImageLoadResult, ImageLoader, ImageQueue, ImageRequest, ImageSlot, ImageState, ImageTarget,
};
use crate::length::{CssLength, LengthUnit};
use crate::measure::{self, UNBOUNDED};
use crate::style::{AutoLength, BorderStyle};
use crate::tree::{BoxId, BoxKind, BoxTree};

use super::{LayoutContext, position_block};

/// Height/width ratio of the placeholder drawn before an image is known.
const PLACEHOLDER_RATIO: f32 = 1.14;

/// Default size of a frame with no explicit dimensions.
const FRAME_SIZE: Size = Size::new(300.0, 150.0);

/// Start loading the image for `target` unless a request was already made.
///
/// Returns whether a synchronous load was started; its completion is
/// already queued when this returns.
pub(crate) fn ensure_requested(
    tree: &mut BoxTree,
    id: BoxId,
    target: ImageTarget,
    loader: &dyn ImageLoader,
    queue: &ImageQueue,
    sync: bool,
) -> bool {
    let node = &tree[id];
    let source = match target {
        ImageTarget::Content => node.attribute("src").map(str::to_string),
        ImageTarget::Background => node.style.background_image.clone(),
    };
    let state = match target {
        ImageTarget::Content => node.image.state(),
        ImageTarget::Background => node.background.state(),
    };
    if state != ImageState::NotRequested {
        return false;
    }
    let Some(source) = source.filter(|s| !s.trim().is_empty()) else {
        let slot = slot_mut(tree, id, target);
        let (generation, _) = slot.begin();
        let _ = slot.apply(generation, ImageLoadResult::failed());
        return false;
    };

    let attributes = node
        .tag
        .as_ref()
        .map(|t| t.attributes.clone())
        .unwrap_or_default();
    let (generation, cancel) = slot_mut(tree, id, target).begin();
    let completion = queue.completion(id, target, generation, cancel);
    tracing::debug!(box_id = %id, ?target, %source, sync, "requesting image");
    loader.load(ImageRequest { source, attributes }, sync, completion);
    sync
}

/// The slot of `id` that holds `target`.
pub(crate) fn slot_mut(
    tree: &mut BoxTree,
    id: BoxId,
    target: ImageTarget,
) -> &mut ImageSlot {
    match target {
        ImageTarget::Content => &mut tree[id].image,
        ImageTarget::Background => &mut tree[id].background,
    }
}

/// A positive pixel length, as used by `width`/`height` on images.
fn pixels(value: &AutoLength) -> Option<f32> {
    value
        .length()
        .filter(|l| l.number() > 0.0 && !l.is_percentage() && l.unit() == LengthUnit::Px)
        .map(CssLength::number)
}

/// A positive percentage, as a fraction.
fn fraction(value: &AutoLength) -> Option<f32> {
    value
        .length()
        .filter(|l| l.number() > 0.0 && l.is_percentage())
        .map(|l| l.number() / 100.0)
}

/// Size the image word of an image or frame box.
///
/// Explicit pixel sizes win. A percentage width is taken from the
/// containing block. Otherwise the loaded image (or its source
/// sub-rectangle) gives the size, and with no image a 20 × 22.8 placeholder
/// stands in. `max-width` caps the width. When only one dimension is
/// explicit, the other follows the image's aspect ratio.
pub(crate) fn measure_replaced(
    tree: &mut BoxTree,
    id: BoxId,
    cx: &mut LayoutContext<'_>,
) -> Result<(), LayoutError> {
    if tree[id].kind == BoxKind::Image {
        cx.request_image(tree, id, ImageTarget::Content);
    }

    let node = &tree[id];
    let cb_width = tree
        .containing_block(id)
        .map_or(0.0, |cb| tree[cb].size.width);
    let style = &node.style;
    let explicit_width = pixels(&style.width);
    let explicit_height = pixels(&style.height);
    let natural = node.image.image().map(|image| {
        let (w, h) = image.dimensions_f32();
        (Size::new(w, h), node.image.source_rect().map(|r| r.size()))
    });
    let mut scale_height = false;

    let mut width = if let Some(w) = explicit_width {
        w
    } else if let Some(f) = fraction(&style.width) {
        scale_height = true;
        f * cb_width
    } else if let Some((full, part)) = natural {
        part.unwrap_or(full).width
    } else if node.kind == BoxKind::Frame {
        FRAME_SIZE.width
    } else {
        explicit_height.map_or(20.0, |h| h / PLACEHOLDER_RATIO)
    };

    let max_width = pixels(&style.max_width).or_else(|| fraction(&style.max_width).map(|f| f * cb_width));
    if let Some(max) = max_width.filter(|&m| width > m) {
        width = max;
        scale_height = explicit_height.is_none();
    }

    let mut height = if let Some(h) = explicit_height {
        h
    } else if let Some((full, part)) = natural {
        part.unwrap_or(full).height
    } else if node.kind == BoxKind::Frame {
        FRAME_SIZE.height
    } else if width > 0.0 {
        width * PLACEHOLDER_RATIO
    } else {
        20.0 * PLACEHOLDER_RATIO
    };

    if let Some((full, _)) = natural.filter(|(full, _)| full.width > 0.0 && full.height > 0.0) {
        if (explicit_width.is_some() && explicit_height.is_none()) || scale_height {
            height = full.height * (width / full.width);
        } else if explicit_height.is_some() && explicit_width.is_none() {
            width = full.width * (height / full.height);
        }
    }

    let edges = measure::edges(tree, id, cx.fonts);
    height += edges.inner_top() + edges.inner_bottom();

    let font = measure::font(tree, id, cx.fonts)?;
    let node = &mut tree[id];
    if let Some(word) = node.words.first_mut() {
        word.width = width;
        word.height = height;
    }
    node.font = Some(font);
    node.words_measured = true;
    Ok(())
}

/// [§ 4.4.2 The hr element](https://html.spec.whatwg.org/multipage/grouping-content.html#the-hr-element)
///
/// A rule spans the containing block's content width (or its explicit
/// width), never narrower than its content. With no height of its own and
/// no borders it gets 1px solid top and bottom borders.
pub(crate) fn layout_horizontal_rule(
    tree: &mut BoxTree,
    id: BoxId,
    cx: &mut LayoutContext<'_>,
) -> Result<(), LayoutError> {
    position_block(tree, id, cx)?;

    let cb = tree.containing_block(id)?;
    let edges = measure::edges(tree, id, cx.fonts);
    let cb_edges = measure::edges(tree, cb, cx.fonts);
    let minimum = measure::minimum_width(tree, id, cx.fonts, cx.text)?;

    let mut width = tree[cb].size.width
        - cb_edges.inner_horizontal()
        - edges.margin.horizontal()
        - edges.border.horizontal();
    if let Some(explicit) = measure::resolve(tree, id, cx.fonts, &tree[id].style.width, width) {
        width = explicit;
    }
    if width < minimum || width >= UNBOUNDED {
        width = minimum;
    }

    let mut height = measure::resolve(tree, id, cx.fonts, &tree[id].style.height, 0.0).unwrap_or(0.0);
    if height < 1.0 {
        height = edges.border.top + edges.border.bottom;
    }
    if height < 1.0 {
        height = 2.0;
    }
    if height <= 2.0 && edges.border.top < 1.0 && edges.border.bottom < 1.0 {
        let style = &mut tree[id].style;
        style.border_style.top = BorderStyle::Solid;
        style.border_style.bottom = BorderStyle::Solid;
        style.border_width.top = CssLength::px(1.0);
        style.border_width.bottom = CssLength::px(1.0);
    }

    let node = &mut tree[id];
    node.size = Size::new(width, height + edges.padding.top + edges.padding.bottom);
    let Point { y, .. } = node.location;
    node.set_actual_bottom(y + edges.padding.top + edges.padding.bottom + height);
    Ok(())
}
