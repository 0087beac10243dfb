/// Axum webserver implementation
///
/// Listener setup and graceful termination driven by the process shutdown signal
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::{
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Start the webserver on the configured address
///
/// This function blocks until the server is shut down
pub async fn start_server(state: Arc<AppState>) -> Result<(), String> {
    let addr = state.config.webserver.bind_address();
    logger::debug(
        LogTag::Webserver,
        &format!("Starting webserver on {}", addr),
    );

    let listener = bind_listener(&addr).await?;
    serve(listener, state).await
}

/// Bind the TCP listener with actionable errors for the common failures
pub async fn bind_listener(addr: &str) -> Result<TcpListener, String> {
    TcpListener::bind(addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another statuspush instance (or another service) is using this port.\n\
             Stop it or pass a different --port.",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Ports below 1024 require elevated privileges on this system.\n\
             Consider using a port above 1024 or running with appropriate permissions.",
            addr
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })
}

/// Serve on an already bound listener until the shutdown signal fires
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), String> {
    let local = listener
        .local_addr()
        .map_err(|e| format!("Failed to read listener address: {}", e))?;

    logger::info(
        LogTag::Webserver,
        &format!("Webserver listening on http://{}", local),
    );
    logger::debug(
        LogTag::Webserver,
        &format!(
            "Push endpoints: ws://{0}/ws, ws://{0}/api/ws, http://{0}/api/status-stream",
            local
        ),
    );

    let shutdown = state.shutdown.clone();
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");

    Ok(())
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    // A dropped sender counts as shutdown
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
    logger::debug(
        LogTag::Webserver,
        "Received shutdown signal, stopping webserver...",
    );
}

/// Build the Axum application with all routes and middleware
fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state)
}
