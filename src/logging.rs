//! Logging abstraction layer
//!
//! Provides logging macros that work with both the `log` and `tracing` crates,
//! selected at compile time through the mutually exclusive `log` (default) and
//! `tracing` features.
//!
//! # Usage
//!
//! ```ignore
//! use webview_navigator::{debug_log, trace_log};
//!
//! trace_log!("dispatch index {}", index);
//! debug_log!("navigating to {}", path);
//! ```

/// Trace-level logging
///
/// Logs detailed dispatch-loop information for debugging purposes.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    }};
}

/// Debug-level logging
///
/// Logs information useful for debugging navigation flows.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    }};
}

/// Info-level logging
///
/// Logs general informational messages.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    }};
}

/// Warn-level logging
///
/// Logs warning messages.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    }};
}

/// Error-level logging
///
/// Logs error messages.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    }};
}
