/// Static user-facing message and progress per business status
///
/// Pure data. Statuses without an entry yield None; callers leave the
/// enrichment fields empty in that case.
use super::status::{CheckStatus, CheckbookStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub message: &'static str,
    /// 0..=100
    pub progress: u8,
}

const fn entry(message: &'static str, progress: u8) -> Option<StatusEntry> {
    Some(StatusEntry { message, progress })
}

pub fn checkbook_entry(status: CheckbookStatus) -> Option<StatusEntry> {
    match status {
        CheckbookStatus::Pending => entry("Deposit submitted, processing...", 10),
        CheckbookStatus::Unsigned => entry("Deposit confirmed, encrypting securely...", 30),
        CheckbookStatus::ReadyForCommitment => {
            entry("Funds encrypted securely, please set recipient info", 50)
        }
        CheckbookStatus::GeneratingProof => {
            entry("Generating your exclusive privacy transfer credential...", 70)
        }
        CheckbookStatus::SubmittingCommitment => entry(
            "Privacy transfer credential generated, saving to blockchain...",
            85,
        ),
        CheckbookStatus::CommitmentPending => entry(
            "Privacy transfer credential submitted, waiting for blockchain confirmation...",
            95,
        ),
        CheckbookStatus::WithCheckbook => entry(
            "Privacy transfer credential completed, ready for recipient to withdraw privately",
            100,
        ),
        CheckbookStatus::ProofFailed => entry("Proof generation failed, please retry", 0),
        CheckbookStatus::SubmissionFailed => entry("Submission failed, please retry", 0),
        CheckbookStatus::Deleted => None,
    }
}

pub fn check_entry(status: CheckStatus) -> Option<StatusEntry> {
    match status {
        CheckStatus::PendingProof => {
            entry("Generating secure withdrawal credential for you...", 20)
        }
        CheckStatus::SubmittingToManagement => entry(
            "Withdrawal credential generated, submitting for processing...",
            40,
        ),
        CheckStatus::ManagementPending => {
            entry("Withdrawal request submitted, processing securely...", 60)
        }
        CheckStatus::CrossChainProcessing => {
            entry("Transferring to target network, please wait...", 80)
        }
        CheckStatus::Completed => entry("Withdrawal successful! Funds arrived securely", 100),
        CheckStatus::ProofFailed => {
            entry("Withdrawal credential generation failed, please retry", 0)
        }
        CheckStatus::SubmissionFailed => entry("Submission processing failed, please retry", 0),
        CheckStatus::CrossChainFailed => entry(
            "Cross-chain processing encountered issue, system retrying...",
            0,
        ),
        CheckStatus::Idle
        | CheckStatus::Unavailable
        | CheckStatus::Extracted
        | CheckStatus::Claimed
        | CheckStatus::Proving
        | CheckStatus::Proved
        | CheckStatus::Withdrawing
        | CheckStatus::Withdrawn => None,
    }
}

/// Lookup by raw checkbook status string
pub fn lookup_checkbook(status: &str) -> Option<StatusEntry> {
    CheckbookStatus::parse(status).and_then(checkbook_entry)
}

/// Lookup by raw check status string
pub fn lookup_check(status: &str) -> Option<StatusEntry> {
    CheckStatus::parse(status).and_then(check_entry)
}
