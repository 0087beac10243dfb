//! Per-user status push hub
//!
//! - `hub`: dispatch loop and the `HubHandle` producers publish through
//! - `registry`: connection identity map and per-user lists
//! - `transport`: WebSocket (duplex) and server-sent event (stream) delivery
//! - `message` / `codec` / `catalog`: event model, wire format, status texts
//! - `producers`: typed publish helpers for business-logic callers

pub mod catalog;
pub mod codec;
pub mod connection;
pub mod health;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod producers;
pub mod registry;
pub mod status;
pub mod transport;

pub use connection::{ConnectionId, ConnectionState, TransportKind};
pub use hub::{EventHub, HubHandle, Registration};
pub use message::{EventKind, EventPayload, PushEvent, UpdateAction};
