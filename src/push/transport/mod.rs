//! Client transports
//!
//! Both variants share the same contract: register with the hub, write a
//! welcome frame directly on the transport, drain the outbound queue, keep
//! the connection alive, and unregister through the `ConnectionGuard` on any
//! exit path.

pub mod duplex;
pub mod stream;

pub use duplex::{run_duplex, serve_websocket, MAX_INBOUND_MESSAGE_SIZE};
pub use stream::{open_event_stream, run_stream};
