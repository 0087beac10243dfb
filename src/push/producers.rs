/// Typed publish helpers for business-logic callers
///
/// Each helper builds the payload for one event kind and hands it to the
/// dispatch loop. Catalog enrichment happens in the loop, not here.
use chrono::Utc;

use super::codec::format_timestamp;
use super::hub::HubHandle;
use super::message::{
    Allocation, AllocationUpdateData, Checkbook, CheckbookStatusUpdateData, CheckbookUpdateData,
    CheckStatusUpdateData, EventPayload, PushEvent, StatusSyncData, UpdateAction, Withdrawal,
    WithdrawalUpdateData,
};
use crate::errors::HubError;
use crate::logger::{self, LogTag};

impl HubHandle {
    async fn publish_payload(&self, user_address: &str, payload: EventPayload) -> Result<(), HubError> {
        let event = PushEvent::new(user_address, payload);
        logger::debug(
            LogTag::Hub,
            &format!(
                "Publishing {} {} for {} (subject={})",
                event.kind(),
                event.message_id,
                user_address,
                event.payload.subject_id().unwrap_or("-")
            ),
        );
        self.publish(event).await
    }

    pub async fn publish_checkbook_update(
        &self,
        user_address: &str,
        action: UpdateAction,
        checkbook: Checkbook,
        previous: Option<Checkbook>,
    ) -> Result<(), HubError> {
        self.publish_payload(
            user_address,
            EventPayload::CheckbookUpdate(CheckbookUpdateData {
                action,
                checkbook,
                previous,
                user_message: String::new(),
                progress: 0,
            }),
        )
        .await
    }

    pub async fn publish_allocation_update(
        &self,
        user_address: &str,
        action: UpdateAction,
        allocation: Allocation,
        previous: Option<Allocation>,
    ) -> Result<(), HubError> {
        self.publish_payload(
            user_address,
            EventPayload::AllocationUpdate(AllocationUpdateData {
                action,
                allocation,
                previous,
                user_message: String::new(),
                progress: 0,
            }),
        )
        .await
    }

    pub async fn publish_withdrawal_update(
        &self,
        user_address: &str,
        action: UpdateAction,
        withdrawal: Withdrawal,
        previous: Option<Withdrawal>,
    ) -> Result<(), HubError> {
        self.publish_payload(
            user_address,
            EventPayload::WithdrawalUpdate(WithdrawalUpdateData {
                action,
                withdrawal,
                previous,
                user_message: String::new(),
                progress: 0,
            }),
        )
        .await
    }

    /// Checkbook moved from `old_status`; empty means it was just created
    pub async fn publish_checkbook_transition(
        &self,
        user_address: &str,
        checkbook: Checkbook,
        old_status: &str,
    ) -> Result<(), HubError> {
        let action = UpdateAction::from_previous_status(old_status);
        self.publish_checkbook_update(user_address, action, checkbook, None)
            .await
    }

    /// Withdrawal moved from `old_status`; empty means it was just created
    pub async fn publish_withdrawal_transition(
        &self,
        user_address: &str,
        withdrawal: Withdrawal,
        old_status: &str,
    ) -> Result<(), HubError> {
        let action = UpdateAction::from_previous_status(old_status);
        self.publish_withdrawal_update(user_address, action, withdrawal, None)
            .await
    }

    /// Legacy `checkbook_status_update`
    pub async fn publish_checkbook_status_update(
        &self,
        user_address: &str,
        data: CheckbookStatusUpdateData,
    ) -> Result<(), HubError> {
        self.publish_payload(user_address, EventPayload::CheckbookStatusUpdate(data))
            .await
    }

    /// Legacy `check_status_update`
    pub async fn publish_check_status_update(
        &self,
        user_address: &str,
        data: CheckStatusUpdateData,
    ) -> Result<(), HubError> {
        self.publish_payload(user_address, EventPayload::CheckStatusUpdate(data))
            .await
    }

    /// Full snapshot of a user's checkbooks and checks
    pub async fn publish_status_sync(
        &self,
        user_address: &str,
        checkbooks: Vec<Checkbook>,
        checks: Vec<Allocation>,
    ) -> Result<(), HubError> {
        self.publish_payload(
            user_address,
            EventPayload::StatusSync(StatusSyncData {
                checkbooks,
                checks,
                sync_time: format_timestamp(&Utc::now()),
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::push::connection::TransportKind;
    use crate::push::message::{Checkbook, CheckStatusUpdateData, Withdrawal};
    use crate::push::status::CheckbookStatus;
    use crate::push::testing::spawn_test_hub;
    use serde_json::Value;

    #[tokio::test]
    async fn test_checkbook_transition_sets_action_and_enrichment() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let mut reg = hub.register("0xabc", TransportKind::Duplex).await.unwrap();

        hub.publish_checkbook_transition(
            "0xabc",
            Checkbook::new("cb-1", CheckbookStatus::Pending),
            "",
        )
        .await
        .unwrap();
        hub.publish_checkbook_transition(
            "0xabc",
            Checkbook::new("cb-1", CheckbookStatus::Unsigned),
            "pending",
        )
        .await
        .unwrap();

        let created: Value = serde_json::from_str(&reg.receiver.recv().await.unwrap()).unwrap();
        assert_eq!(created["type"], "checkbook_update");
        assert_eq!(created["data"]["action"], "created");
        assert!(created["data"].get("progress").is_none());

        let updated: Value = serde_json::from_str(&reg.receiver.recv().await.unwrap()).unwrap();
        assert_eq!(updated["data"]["action"], "updated");
        assert_eq!(updated["data"]["progress"], 30);
    }

    #[tokio::test]
    async fn test_withdrawal_transition() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let mut reg = hub.register("0xabc", TransportKind::Stream).await.unwrap();

        hub.publish_withdrawal_transition("0xabc", Withdrawal::new("wd-1", "completed"), "pending_proof")
            .await
            .unwrap();

        let json: Value = serde_json::from_str(&reg.receiver.recv().await.unwrap()).unwrap();
        assert_eq!(json["type"], "withdrawal_update");
        assert_eq!(json["data"]["progress"], 100);
        assert_eq!(json["data"]["user_message"], "Withdrawal successful! Funds arrived securely");
    }

    #[tokio::test]
    async fn test_legacy_check_status_update_always_enriched() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let mut reg = hub.register("0xabc", TransportKind::Duplex).await.unwrap();

        let mut data = CheckStatusUpdateData {
            check_id: "ck-1".into(),
            checkbook_id: "cb-1".into(),
            old_status: "pending_proof".into(),
            new_status: "submitting_to_management".into(),
            ..Default::default()
        };
        data.details.insert("can_retry".into(), Value::Bool(false));
        hub.publish_check_status_update("0xabc", data).await.unwrap();

        let json: Value = serde_json::from_str(&reg.receiver.recv().await.unwrap()).unwrap();
        assert_eq!(json["type"], "check_status_update");
        assert_eq!(json["data"]["progress"], 40);
        assert_eq!(json["data"]["can_retry"], false);
        assert_eq!(json["data"]["check_id"], "ck-1");
    }

    #[tokio::test]
    async fn test_status_sync() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let mut reg = hub.register("0xabc", TransportKind::Duplex).await.unwrap();

        hub.publish_status_sync(
            "0xabc",
            vec![Checkbook::new("cb-1", CheckbookStatus::WithCheckbook)],
            Vec::new(),
        )
        .await
        .unwrap();

        let json: Value = serde_json::from_str(&reg.receiver.recv().await.unwrap()).unwrap();
        assert_eq!(json["type"], "status_sync");
        assert_eq!(json["data"]["checkbooks"][0]["status"], "with_checkbook");
        assert!(json["data"]["checks"].as_array().unwrap().is_empty());
        assert!(json["data"]["sync_time"].as_str().unwrap().ends_with('Z'));
    }
}
