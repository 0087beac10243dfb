/// Push event schema - envelope fields, typed payloads and catalog enrichment
///
/// Every frame sent to a client is a JSON object:
/// - `type`: closed event kind (see `EventKind`)
/// - `timestamp`: RFC3339 creation time
/// - `message_id`: `msg_<uuid v4>`
/// - `user_address`: target user key
/// - `data`: kind-specific payload
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::catalog::{self, StatusEntry};
use super::status::{CheckStatus, CheckbookStatus};

// ============================================================================
// EVENT KIND
// ============================================================================

/// Wire discriminator for push frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CheckbookUpdate,
    AllocationUpdate,
    WithdrawalUpdate,
    CheckbookStatusUpdate,
    CheckStatusUpdate,
    StatusSync,
    ConnectionEstablished,
    Heartbeat,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CheckbookUpdate => "checkbook_update",
            EventKind::AllocationUpdate => "allocation_update",
            EventKind::WithdrawalUpdate => "withdrawal_update",
            EventKind::CheckbookStatusUpdate => "checkbook_status_update",
            EventKind::CheckStatusUpdate => "check_status_update",
            EventKind::StatusSync => "status_sync",
            EventKind::ConnectionEstablished => "connection_established",
            EventKind::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ENTITY RECORDS
// ============================================================================

/// What happened to the entity carried by an `*_update` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    Created,
    Updated,
    Deleted,
}

impl UpdateAction {
    /// `created` when there was no previous status, else `updated`
    pub fn from_previous_status(old_status: &str) -> Self {
        if old_status.is_empty() {
            UpdateAction::Created
        } else {
            UpdateAction::Updated
        }
    }
}

/// Checkbook record; fields other than id/status pass through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkbook {
    pub id: String,
    pub status: CheckbookStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Allocation (check) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub status: CheckStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Withdrawal request record
///
/// The status is free-form; it is matched against the check catalog when
/// it happens to name a check status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: String,
    pub status: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Checkbook {
    pub fn new(id: impl Into<String>, status: CheckbookStatus) -> Self {
        Self { id: id.into(), status, fields: Map::new() }
    }
}

impl Allocation {
    pub fn new(id: impl Into<String>, status: CheckStatus) -> Self {
        Self { id: id.into(), status, fields: Map::new() }
    }
}

impl Withdrawal {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self { id: id.into(), status: status.into(), fields: Map::new() }
    }
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}

// ============================================================================
// PAYLOADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckbookUpdateData {
    pub action: UpdateAction,
    pub checkbook: Checkbook,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Checkbook>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_message: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationUpdateData {
    pub action: UpdateAction,
    pub allocation: Allocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Allocation>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_message: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalUpdateData {
    pub action: UpdateAction,
    pub withdrawal: Withdrawal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Withdrawal>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_message: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub progress: u8,
}

/// Older clients: checkbook transition with chain/proof details in `details`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckbookStatusUpdateData {
    pub checkbook_id: String,
    pub old_status: String,
    pub new_status: String,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Older clients: check transition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckStatusUpdateData {
    pub check_id: String,
    pub checkbook_id: String,
    pub old_status: String,
    pub new_status: String,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Full state snapshot for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSyncData {
    pub checkbooks: Vec<Checkbook>,
    pub checks: Vec<Allocation>,
    pub sync_time: String,
}

/// Welcome frame written right after registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEstablishedData {
    pub user_address: String,
    pub connection_id: u64,
    pub message: String,
}

/// Kind-specific payload of a push event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    CheckbookUpdate(CheckbookUpdateData),
    AllocationUpdate(AllocationUpdateData),
    WithdrawalUpdate(WithdrawalUpdateData),
    CheckbookStatusUpdate(CheckbookStatusUpdateData),
    CheckStatusUpdate(CheckStatusUpdateData),
    StatusSync(StatusSyncData),
    ConnectionEstablished(ConnectionEstablishedData),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::CheckbookUpdate(_) => EventKind::CheckbookUpdate,
            EventPayload::AllocationUpdate(_) => EventKind::AllocationUpdate,
            EventPayload::WithdrawalUpdate(_) => EventKind::WithdrawalUpdate,
            EventPayload::CheckbookStatusUpdate(_) => EventKind::CheckbookStatusUpdate,
            EventPayload::CheckStatusUpdate(_) => EventKind::CheckStatusUpdate,
            EventPayload::StatusSync(_) => EventKind::StatusSync,
            EventPayload::ConnectionEstablished(_) => EventKind::ConnectionEstablished,
        }
    }

    /// Catalog entry that applies to this payload, if any
    ///
    /// `*_update` payloads are enriched only for the `updated` action; the
    /// legacy status payloads always are.
    pub fn catalog_entry(&self) -> Option<StatusEntry> {
        match self {
            EventPayload::CheckbookUpdate(d) if d.action == UpdateAction::Updated => {
                catalog::checkbook_entry(d.checkbook.status)
            }
            EventPayload::AllocationUpdate(d) if d.action == UpdateAction::Updated => {
                catalog::check_entry(d.allocation.status)
            }
            EventPayload::WithdrawalUpdate(d) if d.action == UpdateAction::Updated => {
                catalog::lookup_check(&d.withdrawal.status)
            }
            EventPayload::CheckbookStatusUpdate(d) => catalog::lookup_checkbook(&d.new_status),
            EventPayload::CheckStatusUpdate(d) => catalog::lookup_check(&d.new_status),
            _ => None,
        }
    }

    /// Attach catalog message and progress; returns whether an entry matched
    pub fn enrich(&mut self) -> bool {
        let Some(entry) = self.catalog_entry() else {
            return false;
        };

        let (message, progress) = match self {
            EventPayload::CheckbookUpdate(d) => (&mut d.user_message, &mut d.progress),
            EventPayload::AllocationUpdate(d) => (&mut d.user_message, &mut d.progress),
            EventPayload::WithdrawalUpdate(d) => (&mut d.user_message, &mut d.progress),
            EventPayload::CheckbookStatusUpdate(d) => (&mut d.user_message, &mut d.progress),
            EventPayload::CheckStatusUpdate(d) => (&mut d.user_message, &mut d.progress),
            _ => return false,
        };
        *message = entry.message.to_string();
        *progress = entry.progress;
        true
    }

    /// Id of the entity the payload is about, for logging
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            EventPayload::CheckbookUpdate(d) => Some(&d.checkbook.id),
            EventPayload::AllocationUpdate(d) => Some(&d.allocation.id),
            EventPayload::WithdrawalUpdate(d) => Some(&d.withdrawal.id),
            EventPayload::CheckbookStatusUpdate(d) => Some(&d.checkbook_id),
            EventPayload::CheckStatusUpdate(d) => Some(&d.check_id),
            _ => None,
        }
    }
}

// ============================================================================
// PUSH EVENT
// ============================================================================

/// One logical notification addressed to every connection of a user
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub message_id: String,
    pub user_address: String,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl PushEvent {
    pub fn new(user_address: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            message_id: generate_message_id(),
            user_address: user_address.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

pub fn generate_message_id() -> String {
    format!("msg_{}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkbook_update(action: UpdateAction, status: CheckbookStatus) -> EventPayload {
        EventPayload::CheckbookUpdate(CheckbookUpdateData {
            action,
            checkbook: Checkbook::new("cb-1", status),
            previous: None,
            user_message: String::new(),
            progress: 0,
        })
    }

    #[test]
    fn test_update_action_from_previous_status() {
        assert_eq!(UpdateAction::from_previous_status(""), UpdateAction::Created);
        assert_eq!(UpdateAction::from_previous_status("pending"), UpdateAction::Updated);
    }

    #[test]
    fn test_enrich_updated_checkbook() {
        let mut payload = checkbook_update(UpdateAction::Updated, CheckbookStatus::Unsigned);
        assert!(payload.enrich());

        match payload {
            EventPayload::CheckbookUpdate(d) => {
                assert_eq!(d.user_message, "Deposit confirmed, encrypting securely...");
                assert_eq!(d.progress, 30);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_created_action_not_enriched() {
        let mut payload = checkbook_update(UpdateAction::Created, CheckbookStatus::Pending);
        assert!(!payload.enrich());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("user_message").is_none());
        assert!(json.get("progress").is_none());
    }

    #[test]
    fn test_unmatched_status_leaves_fields_empty() {
        let mut payload = EventPayload::WithdrawalUpdate(WithdrawalUpdateData {
            action: UpdateAction::Updated,
            withdrawal: Withdrawal::new("wd-1", "queued_somewhere"),
            previous: None,
            user_message: String::new(),
            progress: 0,
        });
        assert!(!payload.enrich());

        let mut legacy = EventPayload::CheckbookStatusUpdate(CheckbookStatusUpdateData {
            checkbook_id: "cb-9".into(),
            old_status: "with_checkbook".into(),
            new_status: "DELETED".into(),
            ..Default::default()
        });
        assert!(!legacy.enrich());
        let json = serde_json::to_value(&legacy).unwrap();
        assert_eq!(json["user_message"], "");
        assert_eq!(json["progress"], 0);
    }

    #[test]
    fn test_withdrawal_status_uses_check_catalog() {
        let mut payload = EventPayload::WithdrawalUpdate(WithdrawalUpdateData {
            action: UpdateAction::Updated,
            withdrawal: Withdrawal::new("wd-2", "cross_chain_processing"),
            previous: None,
            user_message: String::new(),
            progress: 0,
        });
        assert!(payload.enrich());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["progress"], 80);
        assert_eq!(json["withdrawal"]["status"], "cross_chain_processing");
    }

    #[test]
    fn test_entity_fields_flatten() {
        let mut checkbook = Checkbook::new("cb-3", CheckbookStatus::Pending);
        checkbook.fields.insert("amount".into(), Value::from("1000"));

        let json = serde_json::to_value(&checkbook).unwrap();
        assert_eq!(json["id"], "cb-3");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["amount"], "1000");

        let back: Checkbook = serde_json::from_value(json).unwrap();
        assert_eq!(back, checkbook);
    }

    #[test]
    fn test_message_id_format() {
        let event = PushEvent::new(
            "0xabc",
            checkbook_update(UpdateAction::Created, CheckbookStatus::Pending),
        );
        assert!(event.message_id.starts_with("msg_"));
        assert_eq!(event.message_id.len(), "msg_".len() + 36);
        assert_eq!(event.kind(), EventKind::CheckbookUpdate);
    }
}
