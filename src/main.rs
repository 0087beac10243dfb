use statuspush::{
    arguments::{get_enabled_debug_modes, patterns, print_help},
    logger::{self as logger, LogTag},
};

/// Main entry point for statuspush
#[tokio::main]
async fn main() {
    // Check for help request first (before any other processing)
    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::init();
    logger::info(
        LogTag::System,
        &format!("statuspush v{} starting up...", env!("CARGO_PKG_VERSION")),
    );

    let debug_modes = get_enabled_debug_modes();
    if !debug_modes.is_empty() {
        logger::info(
            LogTag::System,
            &format!("Debug modes enabled: {}", debug_modes.join(", ")),
        );
    }

    match statuspush::run::run_server().await {
        Ok(()) => {
            logger::info(LogTag::System, "statuspush stopped cleanly");
        }
        Err(e) => {
            logger::error(LogTag::System, &format!("statuspush failed: {}", e));
            std::process::exit(1);
        }
    }
}
