/// Centralized argument handling for statuspush
///
/// The command line is captured once into a global vector so any module can
/// check flags without threading them through constructors.
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Per-tag debug flag checking (`--debug-<tag>`)
/// - Server overrides (`--config`, `--host`, `--port`)
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::env;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    *CMD_ARGS.lock() = args;
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    CMD_ARGS.lock().clone()
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|value| !value.starts_with("--"))
        .cloned()
}

// =============================================================================
// DEBUG FLAGS
// =============================================================================

/// True when `--debug-<key>` was passed
pub fn is_debug_enabled(key: &str) -> bool {
    has_arg(&format!("--debug-{}", key))
}

/// Gets a list of all enabled debug modes
pub fn get_enabled_debug_modes() -> Vec<String> {
    get_cmd_args()
        .iter()
        .filter_map(|a| a.strip_prefix("--debug-"))
        .map(str::to_string)
        .collect()
}

// =============================================================================
// SERVER OVERRIDES
// =============================================================================

/// Config file path from `--config`
pub fn get_config_path() -> Option<String> {
    get_arg_value("--config")
}

/// Bind host override from `--host`
pub fn get_host_override() -> Option<String> {
    get_arg_value("--host")
}

/// Bind port override from `--port`; unparsable values are ignored
pub fn get_port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|p| p.parse().ok())
}

// =============================================================================
// HELP SYSTEM
// =============================================================================

/// Displays the help menu with all available flags and their descriptions
pub fn print_help() {
    println!("statuspush - per-user status push hub");
    println!();
    println!("USAGE:");
    println!("    statuspush [FLAGS]");
    println!();
    println!("CORE FLAGS:");
    println!("    --config <path>           Config file (default: data/config.toml)");
    println!("    --host <host>             Override webserver bind host");
    println!("    --port <port>             Override webserver bind port");
    println!("    --quiet, -q               Only show warnings and errors");
    println!("    --verbose, -v             Show every log line");
    println!("    --help, -h                Show this help message");
    println!();
    println!("DEBUG FLAGS:");
    println!("    --debug-system            Startup and shutdown");
    println!("    --debug-config            Config loading");
    println!("    --debug-hub               Registry and fan-out");
    println!("    --debug-websocket         WebSocket connections");
    println!("    --debug-stream            Server-sent event streams");
    println!("    --debug-scheduler         Periodic sync jobs");
    println!("    --debug-webserver         HTTP server");
    println!();
    println!("EXAMPLES:");
    println!("    statuspush                                  # Start with data/config.toml");
    println!("    statuspush --port 9000 --debug-hub          # Custom port, hub debug logs");
    println!("    statuspush --config /etc/statuspush.toml    # Explicit config file");
}

// =============================================================================
// COMMON ARGUMENT PATTERNS
// =============================================================================

pub mod patterns {
    use super::*;

    /// Checks for help flags
    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }

    /// Checks for quiet/silent mode
    pub fn is_quiet_mode() -> bool {
        has_arg("--quiet") || has_arg("-q")
    }

    /// Checks for verbose mode
    pub fn is_verbose_mode() -> bool {
        has_arg("--verbose") || has_arg("-v")
    }
}
