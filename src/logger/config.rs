/// Logger configuration derived from command-line flags
use std::collections::HashSet;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;

/// Active logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level that is printed without a per-tag flag
    pub min_level: LogLevel,

    /// Tags with --debug-<tag> enabled
    pub debug_tags: HashSet<&'static str>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

/// Replace the configuration
pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build the configuration from the captured command line
pub fn init_from_args() {
    let min_level = if arguments::patterns::is_verbose_mode() {
        LogLevel::Verbose
    } else if arguments::patterns::is_quiet_mode() {
        LogLevel::Warning
    } else {
        LogLevel::Info
    };

    let debug_tags = LogTag::all()
        .iter()
        .map(|tag| tag.to_debug_key())
        .filter(|key| arguments::is_debug_enabled(key))
        .collect();

    set_logger_config(LoggerConfig {
        min_level,
        debug_tags,
    });
}

pub(super) fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(tag.to_debug_key())
}
