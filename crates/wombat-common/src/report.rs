//! Error reporting capability.
//!
//! Layout and paint never abort a whole document because one box misbehaves.
//! The failure is handed to an [`ErrorSink`] and the offending subtree is
//! skipped. Sinks must never fail themselves.

use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;

use strum_macros::{Display, EnumString};

/// Which phase or subsystem produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ErrorCategory {
    /// Box layout failed for a subtree.
    Layout,
    /// Box painting failed for a subtree.
    Paint,
    /// An image could not be fetched or decoded.
    Image,
    /// Font lookup failed.
    Fonts,
    /// A style value was rejected.
    Css,
    /// The markup source was malformed.
    Html,
    /// Anything else.
    Other,
}

/// Receives error reports from the engine.
pub trait ErrorSink {
    /// Record a report. Implementations must not panic.
    fn report(&self, category: ErrorCategory, message: &str, error: Option<&dyn Error>);
}

impl<T: ErrorSink + ?Sized> ErrorSink for Rc<T> {
    fn report(&self, category: ErrorCategory, message: &str, error: Option<&dyn Error>) {
        (**self).report(category, message, error);
    }
}

impl<T: ErrorSink + ?Sized> ErrorSink for Arc<T> {
    fn report(&self, category: ErrorCategory, message: &str, error: Option<&dyn Error>) {
        (**self).report(category, message, error);
    }
}

/// Logs every report through `tracing::error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, category: ErrorCategory, message: &str, error: Option<&dyn Error>) {
        match error {
            Some(err) => tracing::error!(%category, error = %err, "{message}"),
            None => tracing::error!(%category, "{message}"),
        }
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Reporting subsystem.
    pub category: ErrorCategory,
    /// Human-readable summary.
    pub message: String,
    /// Rendered source error, if one was attached.
    pub detail: Option<String>,
}

/// Keeps reports in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    reports: RefCell<Vec<Report>>,
}

impl CollectingErrorSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }

    /// Number of reports in `category`.
    #[must_use]
    pub fn count(&self, category: ErrorCategory) -> usize {
        self.reports
            .borrow()
            .iter()
            .filter(|r| r.category == category)
            .count()
    }

    /// Whether nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&self, category: ErrorCategory, message: &str, error: Option<&dyn Error>) {
        self.reports.borrow_mut().push(Report {
            category,
            message: message.to_string(),
            detail: error.map(ToString::to_string),
        });
    }
}
