mod server;

pub mod routes;
pub mod state;
pub mod utils;

// Public API for starting the webserver
pub use server::{bind_listener, serve, start_server};
pub use state::AppState;
