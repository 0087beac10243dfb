//! Configuration system
//!
//! Sections are declared with `config_struct!` in `schemas.rs` and loaded from
//! TOML by `utils.rs`.

#[macro_use]
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{apply_cli_overrides, load_config, load_config_from_path, CONFIG_FILE_PATH};
