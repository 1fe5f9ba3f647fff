//! Tests for the tiny-skia raster surface.

use std::rc::Rc;

use wombat_common::image::LoadedImage;
use wombat_layout::graphics::rounded_rect_path;
use wombat_layout::{
    ApproximateFontProvider, Brush, Color, Document, DocumentSettings, FontProvider, FontStyle, GraphicsError,
    GraphicsSurface, Pen, Point, Rect, Size, tree_from_json,
};
use wombat_render::{RasterSurface, SystemFonts, render};

const RED: Color = Color::rgb(255, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

fn surface(width: u32, height: u32) -> RasterSurface {
    RasterSurface::new(width, height, Rc::new(SystemFonts::empty())).expect("create surface")
}

fn pixel(surface: &RasterSurface, x: u32, y: u32) -> Color {
    surface.pixel(x, y).expect("pixel inside the surface")
}

fn fill_all(surface: &mut RasterSurface, color: Color) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    surface.fill_rectangle(&Brush::Solid(color), Rect::new(0.0, 0.0, w, h));
}

// ---------------------------------------------------------------------------
// Fills and strokes
// ---------------------------------------------------------------------------

#[test]
fn test_new_surface_is_white() {
    let s = surface(4, 4);
    assert_eq!(pixel(&s, 0, 0), Color::WHITE);
    assert_eq!(pixel(&s, 3, 3), Color::WHITE);
    assert!(s.pixel(4, 0).is_none(), "outside the surface");
}

#[test]
fn test_zero_size_surface_is_rejected() {
    assert!(RasterSurface::new(0, 10, Rc::new(SystemFonts::empty())).is_err());
}

#[test]
fn test_fill_rectangle() {
    let mut s = surface(10, 10);
    s.fill_rectangle(&Brush::Solid(RED), Rect::new(2.0, 2.0, 4.0, 4.0));
    assert_eq!(pixel(&s, 3, 3), RED);
    assert_eq!(pixel(&s, 5, 5), RED);
    assert_eq!(pixel(&s, 1, 1), Color::WHITE);
    assert_eq!(pixel(&s, 6, 6), Color::WHITE);
}

#[test]
fn test_gradient_runs_left_to_right() {
    let mut s = surface(100, 10);
    let rect = Rect::new(0.0, 0.0, 100.0, 10.0);
    s.fill_rectangle(
        &Brush::LinearGradient {
            rect,
            start: Color::BLACK,
            end: Color::WHITE,
            angle: 90.0,
        },
        rect,
    );
    assert!(pixel(&s, 1, 5).r < 30, "start is dark: {:?}", pixel(&s, 1, 5));
    assert!(pixel(&s, 98, 5).r > 225, "end is light: {:?}", pixel(&s, 98, 5));
}

#[test]
fn test_line_covers_its_width() {
    let mut s = surface(10, 10);
    s.draw_line(&Pen::solid(Color::BLACK, 2.0), Point::new(0.0, 5.0), Point::new(10.0, 5.0));
    assert_eq!(pixel(&s, 5, 4), Color::BLACK);
    assert_eq!(pixel(&s, 5, 5), Color::BLACK);
    assert_eq!(pixel(&s, 5, 8), Color::WHITE);
}

#[test]
fn test_polygon_fill() {
    let mut s = surface(20, 20);
    let triangle = [Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(0.0, 20.0)];
    s.fill_polygon(&Brush::Solid(BLUE), &triangle);
    assert_eq!(pixel(&s, 2, 2), BLUE);
    assert_eq!(pixel(&s, 18, 18), Color::WHITE, "the far corner is outside the triangle");
}

#[test]
fn test_rounded_path_leaves_corners() {
    let mut s = surface(40, 40);
    let path = rounded_rect_path(Rect::new(0.0, 0.0, 40.0, 40.0), 12.0, 12.0, 12.0, 12.0);
    s.fill_path(&Brush::Solid(RED), &path);
    assert_eq!(pixel(&s, 20, 20), RED);
    assert_eq!(pixel(&s, 0, 0), Color::WHITE, "the corner is cut off");
}

// ---------------------------------------------------------------------------
// Clip stack
// ---------------------------------------------------------------------------

#[test]
fn test_push_clip_restricts_drawing() {
    let mut s = surface(10, 10);
    s.push_clip(Rect::new(0.0, 0.0, 5.0, 5.0));
    fill_all(&mut s, BLUE);
    s.pop_clip();
    assert_eq!(pixel(&s, 2, 2), BLUE);
    assert_eq!(pixel(&s, 7, 7), Color::WHITE);
    assert_eq!(s.clip_depth(), 0);
}

#[test]
fn test_nested_clips_intersect() {
    let mut s = surface(10, 10);
    s.push_clip(Rect::new(0.0, 0.0, 6.0, 6.0));
    s.push_clip(Rect::new(4.0, 4.0, 6.0, 6.0));
    assert_eq!(s.clip(), Rect::new(4.0, 4.0, 2.0, 2.0));
    fill_all(&mut s, BLUE);
    s.pop_clip();
    s.pop_clip();
    assert_eq!(pixel(&s, 5, 5), BLUE);
    assert_eq!(pixel(&s, 2, 2), Color::WHITE);
    assert_eq!(pixel(&s, 7, 7), Color::WHITE);
}

#[test]
fn test_push_clip_exclude_leaves_a_hole() {
    let mut s = surface(10, 10);
    s.push_clip_exclude(Rect::new(0.0, 0.0, 5.0, 5.0));
    fill_all(&mut s, BLUE);
    s.pop_clip();
    assert_eq!(pixel(&s, 2, 2), Color::WHITE, "inside the excluded rectangle");
    assert_eq!(pixel(&s, 7, 7), BLUE);
}

#[test]
fn test_suspended_clipping_draws_everywhere() {
    let mut s = surface(10, 10);
    s.push_clip(Rect::new(0.0, 0.0, 2.0, 2.0));
    s.suspend_clipping();
    assert_eq!(s.clip(), Rect::new(0.0, 0.0, 10.0, 10.0));
    fill_all(&mut s, BLUE);
    s.resume_clipping();
    assert_eq!(s.clip(), Rect::new(0.0, 0.0, 2.0, 2.0));
    s.pop_clip();
    assert_eq!(pixel(&s, 7, 7), BLUE);
}

#[test]
fn test_unbalanced_pop_is_harmless() {
    let mut s = surface(4, 4);
    s.pop_clip();
    assert_eq!(s.clip_depth(), 0);
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[test]
fn test_image_is_scaled_into_destination() {
    let mut s = surface(10, 10);
    let image = LoadedImage::solid(2, 2, [0, 0, 255, 255]);
    s.draw_image(&image, Rect::new(0.0, 0.0, 8.0, 8.0), None).expect("draw image");
    assert_eq!(pixel(&s, 4, 4), BLUE);
    assert_eq!(pixel(&s, 9, 9), Color::WHITE);
}

#[test]
fn test_image_source_rectangle() {
    let mut s = surface(10, 10);
    let image = LoadedImage::new(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]);
    s.draw_image(&image, Rect::new(0.0, 0.0, 6.0, 6.0), Some(Rect::new(1.0, 0.0, 1.0, 1.0)))
        .expect("draw image");
    assert_eq!(pixel(&s, 3, 3), Color::rgb(0, 255, 0), "only the right half is drawn");
}

#[test]
fn test_malformed_image_is_an_error() {
    let mut s = surface(10, 10);
    let image = LoadedImage::new(4, 4, vec![0; 3]);
    let result = s.draw_image(&image, Rect::new(0.0, 0.0, 4.0, 4.0), None);
    assert!(matches!(result, Err(GraphicsError::InvalidImage(_))), "got {result:?}");
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

#[test]
fn test_text_without_faces_draws_nothing() {
    let mut s = surface(40, 20);
    let font = ApproximateFontProvider
        .create_font("sans-serif", 16.0, FontStyle::empty())
        .expect("font");
    s.draw_string("hi", &font, Color::BLACK, Point::new(0.0, 0.0), Size::new(20.0, 19.2), false);
    assert_eq!(pixel(&s, 5, 10), Color::WHITE);
}

#[test]
fn test_text_with_system_font() {
    let fonts = Rc::new(SystemFonts::discover());
    let Some(font) = fonts.create_font("sans-serif", 24.0, FontStyle::empty()) else {
        // No system font on this machine.
        return;
    };
    let mut s = RasterSurface::new(80, 40, Rc::clone(&fonts)).expect("create surface");
    s.draw_string("HH", &font, Color::BLACK, Point::new(2.0, 2.0), Size::new(40.0, 30.0), false);
    let inked = (0..80).flat_map(|x| (0..40).map(move |y| (x, y))).any(|(x, y)| pixel(&s, x, y) != Color::WHITE);
    assert!(inked, "glyphs leave ink");
}

// ---------------------------------------------------------------------------
// Whole documents
// ---------------------------------------------------------------------------

#[test]
fn test_render_document_background() {
    let tree = tree_from_json(r#"{"tag": "div", "style": {"background-color": "red", "height": "20px"}}"#)
        .expect("build tree");
    let settings = DocumentSettings {
        max_size: Size::new(200.0, 0.0),
        ..DocumentSettings::default()
    };
    let fonts = Rc::new(SystemFonts::empty());
    let mut doc = Document::new(tree, settings, Box::new(ApproximateFontProvider), Box::new(Rc::clone(&fonts)));
    let _ = doc.layout().expect("layout");

    let s = render(&mut doc, fonts, 200, 60).expect("render");
    assert_eq!(pixel(&s, 100, 10), RED);
    assert_eq!(pixel(&s, 100, 40), Color::WHITE, "below the box");
}

#[test]
fn test_save_png_round_trips_dimensions() {
    let mut s = surface(12, 7);
    fill_all(&mut s, RED);
    let path = std::env::temp_dir().join(format!("wombat-surface-{}.png", std::process::id()));
    s.save_png(&path).expect("save png");
    let decoded = image::open(&path).expect("decode png").to_rgba8();
    let _ = std::fs::remove_file(&path);
    assert_eq!(decoded.dimensions(), (12, 7));
    assert_eq!(decoded.get_pixel(3, 3).0, [255, 0, 0, 255]);
}
