/// Configuration loading and access helpers
///
/// - Loading configuration from disk (defaults when the file is missing)
/// - Command-line overrides for the listener address
use super::schemas::Config;
use crate::arguments;
use crate::logger::{self, LogTag};

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Read and parse a config file
///
/// A missing file yields defaults with a warning; an unreadable or malformed
/// file is an error.
pub fn load_config_from_path(path: &str) -> Result<Config, String> {
    if !std::path::Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

    let config = toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?;

    logger::debug(LogTag::Config, &format!("Loaded config from '{}'", path));
    Ok(config)
}

/// Apply `--host` / `--port` overrides
pub fn apply_cli_overrides(config: &mut Config) {
    if let Some(host) = arguments::get_host_override() {
        config.webserver.host = host;
    }
    if let Some(port) = arguments::get_port_override() {
        config.webserver.port = port;
    }
}

/// Load, override and validate the process configuration
///
/// Uses `--config <path>` when given, else `data/config.toml`.
pub fn load_config() -> Result<Config, String> {
    let path = arguments::get_config_path().unwrap_or_else(|| CONFIG_FILE_PATH.to_string());
    let mut config = load_config_from_path(&path)?;
    apply_cli_overrides(&mut config);
    config.validate()?;
    Ok(config)
}
