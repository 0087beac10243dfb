/// Wire encoding for push frames
///
/// An event is serialized exactly once per publish; the resulting `Frame` is
/// shared by every target connection.
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::message::{ConnectionEstablishedData, EventKind, EventPayload, PushEvent};

/// Encoded JSON text of one frame
pub type Frame = Arc<str>;

#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(rename = "type")]
    kind: EventKind,
    timestamp: String,
    message_id: &'a str,
    user_address: &'a str,
    data: &'a EventPayload,
}

#[derive(Serialize)]
struct HeartbeatFrame {
    #[serde(rename = "type")]
    kind: EventKind,
    timestamp: String,
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serialize an event to its JSON frame
pub fn encode_event(event: &PushEvent) -> Result<Frame, serde_json::Error> {
    let envelope = WireEnvelope {
        kind: event.kind(),
        timestamp: format_timestamp(&event.timestamp),
        message_id: &event.message_id,
        user_address: &event.user_address,
        data: &event.payload,
    };
    serde_json::to_string(&envelope).map(Frame::from)
}

/// `{"type":"heartbeat","timestamp":"<RFC3339>"}`
pub fn heartbeat_frame(now: DateTime<Utc>) -> Frame {
    let frame = HeartbeatFrame {
        kind: EventKind::Heartbeat,
        timestamp: format_timestamp(&now),
    };
    match serde_json::to_string(&frame) {
        Ok(json) => Frame::from(json),
        // Two plain string fields; serialization cannot fail
        Err(_) => Frame::from(r#"{"type":"heartbeat"}"#),
    }
}

/// `connection_established` frame for a freshly registered connection
pub fn welcome_frame(
    user_address: &str,
    connection_id: u64,
) -> Result<Frame, serde_json::Error> {
    let event = PushEvent::new(
        user_address,
        EventPayload::ConnectionEstablished(ConnectionEstablishedData {
            user_address: user_address.to_string(),
            connection_id,
            message: "Status push connection established".to_string(),
        }),
    );
    encode_event(&event)
}

/// Event-stream framing: `data: <json>\n\n`
pub fn sse_frame(frame: &str) -> String {
    format!("data: {}\n\n", frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::message::{
        Allocation, AllocationUpdateData, UpdateAction,
    };
    use crate::push::status::CheckStatus;
    use chrono::TimeZone;
    use serde_json::Value;

    #[test]
    fn test_envelope_fields() {
        let mut event = PushEvent::new(
            "0xuser",
            EventPayload::AllocationUpdate(AllocationUpdateData {
                action: UpdateAction::Created,
                allocation: Allocation::new("al-1", CheckStatus::Idle),
                previous: None,
                user_message: String::new(),
                progress: 0,
            }),
        );
        event.timestamp = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let frame = encode_event(&event).unwrap();
        let json: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(json["type"], "allocation_update");
        assert_eq!(json["timestamp"], "2025-03-01T12:00:00Z");
        assert_eq!(json["message_id"], event.message_id.as_str());
        assert_eq!(json["user_address"], "0xuser");
        assert_eq!(json["data"]["action"], "created");
        assert_eq!(json["data"]["allocation"]["status"], "idle");
    }

    #[test]
    fn test_heartbeat_frame() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 30).unwrap();
        assert_eq!(
            &*heartbeat_frame(now),
            r#"{"type":"heartbeat","timestamp":"2025-03-01T12:00:30Z"}"#
        );
    }

    #[test]
    fn test_welcome_frame() {
        let frame = welcome_frame("0xuser", 7).unwrap();
        let json: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "connection_established");
        assert_eq!(json["data"]["connection_id"], 7);
        assert_eq!(json["data"]["user_address"], "0xuser");
    }

    #[test]
    fn test_sse_framing() {
        assert_eq!(sse_frame(r#"{"a":1}"#), "data: {\"a\":1}\n\n");
    }
}
