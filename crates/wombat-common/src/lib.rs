//! Common utilities for the Wombat engine.
//!
//! This crate provides shared infrastructure used by the layout core and its
//! collaborators:
//! - **Warning System** - deduplicated warnings for unsupported features
//! - **Error Reporting** - the [`report::ErrorSink`] capability
//! - **Images** - decoded pixel data shared between loaders and surfaces
//! - **Data URLs** - decoding of inline `data:` resources

pub mod data_url;
pub mod image;
pub mod report;
pub mod warning;
