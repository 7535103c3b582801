//! Receipt polling until a transaction is mined or a deadline passes
//!
//! Target chains have multi-second block times, so polling is coarse
//! (30s by default). Each lookup is classified; failed lookups count as
//! "still pending" and are tallied on the outcome.

use super::ChainClient;
use crate::campaign::TransactionOutcome;
use crate::error::VoterError;

use ethers::types::{TransactionReceipt, H256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Result of a single receipt lookup
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// No receipt yet
    Pending,
    /// Lookup failed in a way that says nothing about the transaction
    Transient(VoterError),
    /// Mined with success status
    Confirmed,
    /// Mined with failure status
    Reverted,
}

impl PollStatus {
    /// Classify a receipt lookup result
    pub fn classify(result: Result<Option<TransactionReceipt>, VoterError>) -> Self {
        match result {
            Ok(None) => PollStatus::Pending,
            Ok(Some(receipt)) => match receipt.status.map(|s| s.as_u64()) {
                Some(1) => PollStatus::Confirmed,
                Some(0) => PollStatus::Reverted,
                // Pre-Byzantium receipts carry no status; keep waiting.
                _ => PollStatus::Pending,
            },
            Err(e) if e.is_transient() => PollStatus::Transient(e),
            // Any other failure still leaves the transaction's fate unknown.
            Err(e) => PollStatus::Transient(VoterError::ReceiptLookup(e.to_string())),
        }
    }
}

/// Blocks the caller until a transaction reaches a terminal state
pub struct ConfirmationPoller {
    client: Arc<dyn ChainClient>,
    poll_interval: Duration,
    /// Suppressed-error count at which an error is logged for the transaction
    alert_threshold: u32,
}

impl ConfirmationPoller {
    pub fn new(client: Arc<dyn ChainClient>, poll_interval: Duration, alert_threshold: u32) -> Self {
        Self {
            client,
            poll_interval,
            alert_threshold,
        }
    }

    /// Poll for `tx_hash` until it is mined or `timeout` elapses.
    ///
    /// A zero timeout returns `TimedOut` without polling. A lookup still in
    /// flight when the deadline passes is abandoned.
    pub async fn await_outcome(&self, tx_hash: H256, timeout: Duration) -> TransactionOutcome {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut polls = 0u32;
        let mut suppressed = 0u32;

        while Instant::now() < deadline {
            polls += 1;
            crate::metrics::record_receipt_poll();

            // A slow lookup must not carry the wait past the deadline.
            let remaining = deadline.saturating_duration_since(Instant::now());
            let lookup = match tokio::time::timeout(
                remaining,
                self.client.transaction_receipt(tx_hash),
            )
            .await
            {
                Ok(lookup) => lookup,
                Err(_) => {
                    debug!("Receipt lookup {} for {:?} cut off at deadline", polls, tx_hash);
                    break;
                }
            };

            match PollStatus::classify(lookup) {
                PollStatus::Confirmed => {
                    let elapsed = started.elapsed();
                    info!("Transaction {:?} confirmed after {:?}", tx_hash, elapsed);
                    crate::metrics::record_confirmation_latency(elapsed.as_secs_f64());
                    return TransactionOutcome::Confirmed { tx_hash };
                }
                PollStatus::Reverted => {
                    warn!("Transaction {:?} reverted on-chain", tx_hash);
                    return TransactionOutcome::Reverted { tx_hash };
                }
                PollStatus::Pending => {
                    debug!("Transaction {:?} still pending (poll {})", tx_hash, polls);
                }
                PollStatus::Transient(e) => {
                    suppressed += 1;
                    crate::metrics::record_suppressed_poll_error();
                    warn!(
                        "Receipt lookup for {:?} failed ({} suppressed so far): {}",
                        tx_hash, suppressed, e
                    );
                    if suppressed == self.alert_threshold {
                        error!(
                            "{} receipt lookups for {:?} failed; the RPC endpoint may be broken",
                            suppressed, tx_hash
                        );
                    }
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }

        warn!(
            "Timeout waiting for confirmation of {:?} after {} polls",
            tx_hash, polls
        );
        TransactionOutcome::TimedOut {
            tx_hash,
            polls,
            suppressed_errors: suppressed,
        }
    }
}
