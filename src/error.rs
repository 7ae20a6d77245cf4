//! Error handling for the navigation pipeline
//!
//! Dispatch never throws: a failing handler substitutes its error for the
//! pending error value, which is then threaded through the remaining layers
//! via [`Next`](crate::router::Next). An error that survives to the end of
//! the stack is delivered to the terminal `done` callback, making the caller
//! responsible for surfacing it.

use std::fmt;

/// Errors threaded through middleware dispatch.
///
/// Handlers produce these by returning `Err(..)`; the dispatch loop carries
/// them forward until an error-handling layer consumes them or the stack is
/// exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// A middleware handler failed
    HandlerFailed { message: String },

    /// Application-defined error
    Custom { message: String },
}

impl NavigationError {
    /// Create a handler-failure error
    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerFailed {
            message: message.into(),
        }
    }

    /// Create a custom error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// The human-readable message carried by this error
    pub fn message(&self) -> &str {
        match self {
            Self::HandlerFailed { message } | Self::Custom { message } => message,
        }
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::HandlerFailed { message } => {
                write!(f, "Handler failed: {}", message)
            }
            NavigationError::Custom { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for NavigationError {}
