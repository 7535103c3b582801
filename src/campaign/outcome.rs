//! Attempt outcomes and the campaign's append-only record of them

use ethers::types::H256;
use std::fmt;

/// Terminal result of one vote attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// Mined with success status
    Confirmed { tx_hash: H256 },
    /// Mined, but execution failed on-chain
    Reverted { tx_hash: H256 },
    /// Still pending when the confirmation deadline passed
    TimedOut {
        tx_hash: H256,
        polls: u32,
        suppressed_errors: u32,
    },
    /// Nothing was broadcast; carries the underlying error text
    SubmissionFailed { reason: String },
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Confirmed { .. })
    }

    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            TransactionOutcome::Confirmed { tx_hash }
            | TransactionOutcome::Reverted { tx_hash }
            | TransactionOutcome::TimedOut { tx_hash, .. } => Some(*tx_hash),
            TransactionOutcome::SubmissionFailed { .. } => None,
        }
    }

    /// Short label, used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            TransactionOutcome::Confirmed { .. } => "confirmed",
            TransactionOutcome::Reverted { .. } => "reverted",
            TransactionOutcome::TimedOut { .. } => "timed_out",
            TransactionOutcome::SubmissionFailed { .. } => "submission_failed",
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Confirmed { tx_hash } => write!(f, "confirmed ({:?})", tx_hash),
            TransactionOutcome::Reverted { tx_hash } => write!(f, "reverted ({:?})", tx_hash),
            TransactionOutcome::TimedOut {
                tx_hash,
                polls,
                suppressed_errors,
            } => write!(
                f,
                "timed out ({:?}, {} polls, {} lookup errors)",
                tx_hash, polls, suppressed_errors
            ),
            TransactionOutcome::SubmissionFailed { reason } => {
                write!(f, "submission failed: {}", reason)
            }
        }
    }
}

/// One attempt as recorded by the campaign
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: u32,
    /// Nonce used, when one was obtained
    pub nonce: Option<u64>,
    pub outcome: TransactionOutcome,
}

/// Outcomes of a campaign run, in attempt order
#[derive(Debug, Clone, Default)]
pub struct CampaignReport {
    records: Vec<AttemptRecord>,
}

impl CampaignReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AttemptRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn count(&self, pred: impl Fn(&TransactionOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn confirmed(&self) -> usize {
        self.count(|o| matches!(o, TransactionOutcome::Confirmed { .. }))
    }

    pub fn reverted(&self) -> usize {
        self.count(|o| matches!(o, TransactionOutcome::Reverted { .. }))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|o| matches!(o, TransactionOutcome::TimedOut { .. }))
    }

    pub fn submission_failed(&self) -> usize {
        self.count(|o| matches!(o, TransactionOutcome::SubmissionFailed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.len() - self.confirmed()
    }
}
