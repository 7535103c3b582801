//! Campaign driver: a fixed number of sequential, independent vote attempts

use super::outcome::{AttemptRecord, CampaignReport, TransactionOutcome};
use crate::account::Account;
use crate::chain::{ChainClient, ConfirmationPoller};
use crate::config::{CampaignConfig, FeeConfig, Settings, VoteConfig};
use crate::error::{VoterError, VoterResult};
use crate::tx::{FeePolicy, NonceSequencer, Submitter, TransactionBuilder};

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs the vote campaign.
///
/// Each attempt resolves fully (confirmed, reverted, timed out or failed to
/// submit) before the next one starts, so this process never has two
/// transactions in flight. Failed attempts are recorded and skipped, never
/// retried, and never end the campaign early.
pub struct CampaignDriver {
    nonces: NonceSequencer,
    fees: FeePolicy,
    builder: TransactionBuilder,
    submitter: Submitter,
    poller: ConfirmationPoller,
    config: CampaignConfig,
}

impl CampaignDriver {
    /// Wire up the transaction engine for `account` against `client`
    pub fn new(
        account: Account,
        client: Arc<dyn ChainClient>,
        vote: &VoteConfig,
        fees: &FeeConfig,
        config: CampaignConfig,
    ) -> VoterResult<Self> {
        let builder = TransactionBuilder::from_config(account.address(), vote)?;
        info!(
            "Vote target {} on chain {}, call data 0x{}",
            vote.contract_address,
            vote.chain_id,
            hex::encode(builder.call_data())
        );
        let fees = FeePolicy::new(client.clone(), builder.estimate_call(), fees)
            .map_err(|e| VoterError::Config(format!("Invalid fee configuration: {}", e)))?;

        Ok(Self {
            nonces: NonceSequencer::new(account.address(), client.clone()),
            fees,
            builder,
            submitter: Submitter::new(account, client.clone()),
            poller: ConfirmationPoller::new(
                client,
                config.poll_interval(),
                config.suppressed_error_alert_threshold,
            ),
            config,
        })
    }

    pub fn from_settings(
        settings: &Settings,
        account: Account,
        client: Arc<dyn ChainClient>,
    ) -> VoterResult<Self> {
        Self::new(
            account,
            client,
            &settings.vote,
            &settings.fees,
            settings.campaign.clone(),
        )
    }

    /// Run every configured attempt and return their outcomes in order
    pub async fn run(&self) -> CampaignReport {
        let total = self.config.attempts;
        let mut report = CampaignReport::new();
        let mut last_submitted: Option<u64> = None;

        for attempt in 1..=total {
            info!("Voting {} of {}...", attempt, total);

            let record = self.run_attempt(attempt, last_submitted).await;
            if record.outcome.tx_hash().is_some() {
                last_submitted = record.nonce;
            }

            if record.outcome.is_success() {
                info!("Vote {} succeeded: {}", record.attempt, record.outcome);
            } else {
                warn!("Vote {} failed: {}", record.attempt, record.outcome);
            }
            crate::metrics::record_attempt(record.outcome.label());
            report.push(record);

            if attempt < total {
                tokio::time::sleep(self.config.attempt_delay()).await;
            }
        }

        info!(
            "Voting process completed: {} confirmed, {} reverted, {} timed out, {} not submitted",
            report.confirmed(),
            report.reverted(),
            report.timed_out(),
            report.submission_failed()
        );

        report
    }

    /// nonce -> fees -> build -> submit -> await confirmation
    async fn run_attempt(&self, attempt: u32, last_submitted: Option<u64>) -> AttemptRecord {
        let nonce = match self.nonces.next().await {
            Ok(nonce) => nonce,
            Err(e) => return Self::not_submitted(attempt, None, e),
        };

        if let Some(last) = last_submitted {
            if nonce <= last {
                // The previous transaction is still pending or was dropped,
                // or another sender is using this account.
                warn!(
                    "Nonce {} is not above last submitted nonce {}; is another sender using this account?",
                    nonce, last
                );
            }
        }

        let quote = match self.fees.quote().await {
            Ok(quote) => quote,
            Err(e) => return Self::not_submitted(attempt, Some(nonce), e),
        };
        debug!(
            "Attempt {}: nonce {}, gas limit {}, max cost {} wei",
            attempt,
            nonce,
            quote.gas_limit,
            FeePolicy::max_cost(&quote)
        );

        let tx = self.builder.build(nonce, &quote);

        let tx_hash = match self.submitter.submit(&tx).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => return Self::not_submitted(attempt, Some(nonce), e),
        };
        crate::metrics::record_nonce(nonce);

        let outcome = self
            .poller
            .await_outcome(tx_hash, self.config.confirmation_timeout())
            .await;

        AttemptRecord {
            attempt,
            nonce: Some(nonce),
            outcome,
        }
    }

    fn not_submitted(attempt: u32, nonce: Option<u64>, e: VoterError) -> AttemptRecord {
        if e.is_attempt_scoped() {
            error!("Attempt {} not submitted: {}", attempt, e);
        } else {
            error!("Attempt {} hit a non-attempt error, recording it anyway: {}", attempt, e);
        }
        AttemptRecord {
            attempt,
            nonce,
            outcome: TransactionOutcome::SubmissionFailed {
                reason: e.to_string(),
            },
        }
    }
}
