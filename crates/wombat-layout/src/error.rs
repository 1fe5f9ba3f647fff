//! Error types for the layout core.
//!
//! Two families live here. Content errors (bad units, unresolved table
//! columns, missing fonts, failed image draws) are reported through the
//! document's error sink and isolated to the box that raised them.
//! Structural errors ([`TreeError`]) mean the caller broke a tree invariant;
//! they propagate to the caller instead of being reported.

use thiserror::Error;

use crate::tree::BoxId;

/// Conversion errors on [`crate::length::CssLength`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LengthError {
    /// An em conversion was requested on a non-em length.
    #[error("length '{0}' is not in ems")]
    NotEms(String),
    /// The length was flagged as malformed when parsed.
    #[error("length '{0}' is invalid")]
    Invalid(String),
}

/// Box-tree invariant violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The id does not refer to a box in this tree.
    #[error("box {0} does not exist")]
    UnknownBox(BoxId),
    /// An insertion point was not among the parent's children.
    #[error("box {before} is not a child of {parent}")]
    SiblingNotFound {
        /// Parent that was searched.
        parent: BoxId,
        /// Sibling that was expected.
        before: BoxId,
    },
    /// A non-root box has no block-level ancestor.
    #[error("box {0} has no containing block")]
    NoContainingBlock(BoxId),
    /// A word index past the end of a box's words.
    #[error("box {box_id} has no word {index}")]
    UnknownWord {
        /// Owner box.
        box_id: BoxId,
        /// Requested index.
        index: usize,
    },
    /// A move would make a box its own ancestor.
    #[error("moving {0} under {1} would create a cycle")]
    Cycle(BoxId, BoxId),
}

/// Table layout failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableError {
    /// A column width was still unresolved when it was summed.
    #[error("table {table}: column {column} width is unresolved")]
    UnresolvedColumn {
        /// The table box.
        table: BoxId,
        /// Offending column index.
        column: usize,
    },
}

/// Font lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FontError {
    /// Neither the requested families nor the default family are available.
    #[error("no font available for '{family}' at {size}px")]
    Unavailable {
        /// Requested family list.
        family: String,
        /// Requested size, formatted.
        size: String,
    },
}

/// Failures raised by a graphics surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphicsError {
    /// The image could not be drawn (bad dimensions or buffer length).
    #[error("cannot draw image: {0}")]
    InvalidImage(String),
    /// The surface rejected the geometry of a draw call.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Errors raised while laying out a box.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LayoutError {
    /// Tree invariant violation.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// Table algorithm failure.
    #[error(transparent)]
    Table(#[from] TableError),
    /// Length conversion failure.
    #[error(transparent)]
    Length(#[from] LengthError),
    /// Font lookup failure.
    #[error(transparent)]
    Font(#[from] FontError),
}

impl LayoutError {
    /// Whether this is a caller programming error that must propagate.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Tree(_))
    }
}

/// Errors raised while painting a box.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaintError {
    /// Tree invariant violation.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The surface failed a draw call.
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
    /// Font lookup failure.
    #[error(transparent)]
    Font(#[from] FontError),
}

impl PaintError {
    /// Whether this is a caller programming error that must propagate.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Tree(_))
    }
}

/// Errors raised while building a tree from a markup source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The JSON could not be deserialized.
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document root must be an element.
    #[error("document root must be an element, found text")]
    TextRoot,
    /// Tree construction violated an invariant.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
