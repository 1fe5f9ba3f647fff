//! Box tree, layout and paint dispatch for the Wombat engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Lengths** ([CSS 2.1 § 4.3.2 Lengths](https://www.w3.org/TR/CSS2/syndata.html#length-units))
//!   - Parsing with error flagging, em and percentage resolution
//!
//! - **Box Tree** ([CSS 2.1 § 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen))
//!   - Arena of boxes addressed by [`tree::BoxId`]
//!   - Word splitting per `white-space` and `word-break`
//!   - Normalization into anonymous block boxes
//!
//! - **Layout** ([CSS 2.1 § 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html))
//!   - Block flow with margin collapsing
//!   - Line boxes with vertical alignment, justification and right-to-left runs
//!   - Tables with spans, spacing placeholders and width reconciliation
//!   - Images, frames, horizontal rules and list markers
//!
//! - **Paint** ([CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html))
//!   - Backgrounds, borders, text, selection and decorations
//!
//! The crate draws and measures through capability traits
//! ([`graphics::GraphicsSurface`], [`font::FontProvider`],
//! [`image::ImageLoader`]); `wombat-render` provides concrete ones.
//!
//! # Not Yet Implemented
//!
//! - Floats
//! - `z-index`
//! - Style sheets; styles arrive per element

/// Whole-document driver and settings.
pub mod document;
/// Error types.
pub mod error;
/// Font handles and the per-document font cache.
pub mod font;
/// Points, sizes, rectangles and edge widths.
pub mod geometry;
/// Drawing and measuring capabilities.
pub mod graphics;
/// Image loading capability and per-box image state.
pub mod image;
/// Per-box layout, the line-box builder and the table engine.
pub mod layout;
/// CSS lengths per [§ 4.3.2](https://www.w3.org/TR/CSS2/syndata.html#length-units).
pub mod length;
/// Box metrics shared by layout and paint.
pub mod measure;
/// Paint dispatch per [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html).
pub mod paint;
/// Serializable geometry dumps.
pub mod snapshot;
/// JSON markup source.
pub mod source;
/// Typed CSS properties, keywords and user-agent defaults.
pub mod style;
/// The box tree.
pub mod tree;

// Re-exports for convenience
pub use document::{Document, DocumentSettings, SelectionPoint};
pub use error::{FontError, GraphicsError, LayoutError, LengthError, PaintError, SourceError, TableError, TreeError};
pub use font::{ApproximateFontProvider, Font, FontCache, FontProvider, FontStyle};
pub use geometry::{EdgeSizes, Point, Rect, Size};
pub use graphics::{Brush, DashStyle, DrawCommand, GraphicsSurface, Path, Pen, RecordingSurface, TextMeasure};
pub use image::{ImageCompletion, ImageLoadResult, ImageLoader, ImageRequest, ImageTarget, StaticImageLoader};
pub use layout::line::{LineBox, WordRef};
pub use layout::{LayoutContext, LayoutOutcome, layout_box};
pub use length::CssLength;
pub use paint::{PaintContext, PaintOutcome, paint_box};
pub use snapshot::{BoxSnapshot, LayoutSnapshot};
pub use source::{DocumentNode, ElementNode, tree_from_json};
pub use style::{BoxStyle, Color};
pub use tree::{BoxId, BoxKind, BoxTree, HtmlTag, Word, WordKind};
