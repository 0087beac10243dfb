//! Structured tag logger for statuspush
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-tag debug control via --debug-<tag> flags
//! - Colored console output with local timestamps
//!
//! ## Usage
//!
//! ```rust
//! use statuspush::logger::{self, LogTag};
//!
//! logger::info(LogTag::Hub, "Dispatch loop started");
//! logger::warning(LogTag::Stream, "Idle timeout reached");
//! logger::debug(LogTag::Websocket, "Ping sent"); // Only if --debug-websocket
//! logger::verbose(LogTag::Hub, "Raw frame: ..."); // Only if --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, after the command line has been captured:
//! ```rust
//! statuspush::logger::init();
//! ```

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Scans the command line for --debug-<tag>, --verbose and --quiet flags
/// and installs the resulting configuration.
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless filtered by minimum level)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Debug logs are ONLY shown when the --debug-<tag> flag for that tag is provided.
///
/// # Example
/// ```rust
/// // Only shown with --debug-hub
/// statuspush::logger::debug(statuspush::logger::LogTag::Hub, "queue depth: 3");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
