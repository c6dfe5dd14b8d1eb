//! Error types for the widget core.

use thiserror::Error;

use crate::selector::SelectorError;

/// Errors raised while mounting or configuring the widget.
///
/// Every variant is detected before any handler is wired, so a controller
/// that mounted successfully never faults on a missing element later.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// A required element is not present in the page.
    #[error("Missing {role} element (selector `{selector}`)")]
    MissingElement {
        /// What the element is used for, e.g. "chat input".
        role: &'static str,
        /// Selector that found nothing.
        selector: String,
    },

    /// An element was found but lacks the ancestor the widget needs.
    #[error("Element `{selector}` has fewer than {levels} ancestors")]
    MissingAncestor {
        /// Selector of the element whose ancestor was requested.
        selector: String,
        /// Number of levels walked up.
        levels: usize,
    },

    /// The reply policy was given no canned responses.
    #[error("At least one canned response is required")]
    NoResponses,

    /// The reveal threshold divisor must be a positive, finite number.
    #[error("Invalid reveal threshold divisor: {0}")]
    InvalidThreshold(f64),

    /// A selector string failed to parse.
    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),
}

/// Result type alias for widget operations.
pub type Result<T> = std::result::Result<T, WidgetError>;
