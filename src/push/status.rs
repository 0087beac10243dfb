/// Business status enumerations carried by push events
///
/// Both sets are closed. Unknown strings are not an error anywhere in the
/// hub: `parse` returns None and enrichment is skipped.
use serde::{Deserialize, Serialize};

/// Lifecycle of a checkbook (deposit) record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckbookStatus {
    Pending,
    Unsigned,
    ReadyForCommitment,
    GeneratingProof,
    SubmittingCommitment,
    CommitmentPending,
    WithCheckbook,
    ProofFailed,
    SubmissionFailed,
    #[serde(rename = "DELETED")]
    Deleted,
}

impl CheckbookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckbookStatus::Pending => "pending",
            CheckbookStatus::Unsigned => "unsigned",
            CheckbookStatus::ReadyForCommitment => "ready_for_commitment",
            CheckbookStatus::GeneratingProof => "generating_proof",
            CheckbookStatus::SubmittingCommitment => "submitting_commitment",
            CheckbookStatus::CommitmentPending => "commitment_pending",
            CheckbookStatus::WithCheckbook => "with_checkbook",
            CheckbookStatus::ProofFailed => "proof_failed",
            CheckbookStatus::SubmissionFailed => "submission_failed",
            CheckbookStatus::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CheckbookStatus::Pending),
            "unsigned" => Some(CheckbookStatus::Unsigned),
            "ready_for_commitment" => Some(CheckbookStatus::ReadyForCommitment),
            "generating_proof" => Some(CheckbookStatus::GeneratingProof),
            "submitting_commitment" => Some(CheckbookStatus::SubmittingCommitment),
            "commitment_pending" => Some(CheckbookStatus::CommitmentPending),
            "with_checkbook" => Some(CheckbookStatus::WithCheckbook),
            "proof_failed" => Some(CheckbookStatus::ProofFailed),
            "submission_failed" => Some(CheckbookStatus::SubmissionFailed),
            "DELETED" => Some(CheckbookStatus::Deleted),
            _ => None,
        }
    }
}

/// Lifecycle of a check (allocation / withdrawal) record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Idle,
    Unavailable,
    Extracted,
    Claimed,
    Proving,
    Proved,
    Withdrawing,
    Withdrawn,
    PendingProof,
    SubmittingToManagement,
    ManagementPending,
    CrossChainProcessing,
    Completed,
    ProofFailed,
    SubmissionFailed,
    CrossChainFailed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Idle => "idle",
            CheckStatus::Unavailable => "unavailable",
            CheckStatus::Extracted => "extracted",
            CheckStatus::Claimed => "claimed",
            CheckStatus::Proving => "proving",
            CheckStatus::Proved => "proved",
            CheckStatus::Withdrawing => "withdrawing",
            CheckStatus::Withdrawn => "withdrawn",
            CheckStatus::PendingProof => "pending_proof",
            CheckStatus::SubmittingToManagement => "submitting_to_management",
            CheckStatus::ManagementPending => "management_pending",
            CheckStatus::CrossChainProcessing => "cross_chain_processing",
            CheckStatus::Completed => "completed",
            CheckStatus::ProofFailed => "proof_failed",
            CheckStatus::SubmissionFailed => "submission_failed",
            CheckStatus::CrossChainFailed => "cross_chain_failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(CheckStatus::Idle),
            "unavailable" => Some(CheckStatus::Unavailable),
            "extracted" => Some(CheckStatus::Extracted),
            "claimed" => Some(CheckStatus::Claimed),
            "proving" => Some(CheckStatus::Proving),
            "proved" => Some(CheckStatus::Proved),
            "withdrawing" => Some(CheckStatus::Withdrawing),
            "withdrawn" => Some(CheckStatus::Withdrawn),
            "pending_proof" => Some(CheckStatus::PendingProof),
            "submitting_to_management" => Some(CheckStatus::SubmittingToManagement),
            "management_pending" => Some(CheckStatus::ManagementPending),
            "cross_chain_processing" => Some(CheckStatus::CrossChainProcessing),
            "completed" => Some(CheckStatus::Completed),
            "proof_failed" => Some(CheckStatus::ProofFailed),
            "submission_failed" => Some(CheckStatus::SubmissionFailed),
            "cross_chain_failed" => Some(CheckStatus::CrossChainFailed),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckbookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
