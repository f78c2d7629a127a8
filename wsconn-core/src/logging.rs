//! Logging utilities
//!
//! Thin macros over `tracing` that compile to nothing when the `logging`
//! feature is disabled. The feature is resolved in this crate, so downstream
//! crates can use the macros without depending on `tracing` themselves.

#[cfg(feature = "logging")]
#[doc(hidden)]
pub use tracing;

/// Log a warning message
#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::tracing::warn!($($arg)*)
    };
}

/// Log a debug message
#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::tracing::debug!($($arg)*)
    };
}

/// Log a trace message
#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        $crate::logging::tracing::trace!($($arg)*)
    };
}

/// Log a warning message (disabled)
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

/// Log a debug message (disabled)
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{}};
}

/// Log a trace message (disabled)
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{}};
}
