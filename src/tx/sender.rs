//! Signing and broadcast of vote transactions

use crate::account::Account;
use crate::chain::ChainClient;
use crate::error::{VoterError, VoterResult};

use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::H256;
use std::sync::Arc;
use tracing::{error, info};

/// Signs and broadcasts exactly once per call. Retrying is the campaign's job.
pub struct Submitter {
    account: Account,
    client: Arc<dyn ChainClient>,
}

impl Submitter {
    pub fn new(account: Account, client: Arc<dyn ChainClient>) -> Self {
        Self { account, client }
    }

    /// Sign `tx` with the account key and broadcast the wire bytes.
    ///
    /// Any failure, signing included, comes back as `SubmissionFailed`
    /// carrying the underlying message.
    pub async fn submit(&self, tx: &TypedTransaction) -> VoterResult<H256> {
        let signature = self
            .account
            .wallet()
            .sign_transaction(tx)
            .await
            .map_err(|e| VoterError::SubmissionFailed(format!("signing failed: {}", e)))?;

        let raw = tx.rlp_signed(&signature);

        match self.client.send_raw_transaction(raw).await {
            Ok(tx_hash) => {
                info!("Vote transaction sent: {:?}", tx_hash);
                crate::metrics::record_tx_submitted();
                Ok(tx_hash)
            }
            Err(e) => {
                error!("Error while sending vote transaction: {}", e);
                Err(match e {
                    VoterError::SubmissionFailed(_) => e,
                    other => VoterError::SubmissionFailed(other.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::test_utils::dev_account;
    use crate::chain::mock::MockChainClient;
    use crate::tx::{FeeQuote, TransactionBuilder, VOTE_SELECTOR};
    use ethers::types::{Address, Bytes, U256};
    use std::sync::Mutex;

    const CHAIN_ID: u64 = 167000;

    fn vote_tx(account: &Account) -> TypedTransaction {
        let builder = TransactionBuilder::new(
            account.address(),
            Address::repeat_byte(0x42),
            CHAIN_ID,
            Bytes::from(VOTE_SELECTOR.to_vec()),
        );
        builder.build(
            3,
            &FeeQuote {
                gas_limit: U256::from(30_000),
                max_fee_per_gas: U256::from(234_000_000u64),
                max_priority_fee_per_gas: U256::from(234_000_000u64),
            },
        )
    }

    #[tokio::test]
    async fn test_broadcasts_signed_type2_bytes_once() {
        let account = dev_account(CHAIN_ID);
        let tx = vote_tx(&account);
        let expected_raw = tx.rlp_signed(&account.wallet().sign_transaction_sync(&tx).unwrap());

        let sent = Arc::new(Mutex::new(Vec::new()));
        let captured = sent.clone();
        let mut client = MockChainClient::new();
        client
            .expect_send_raw_transaction()
            .times(1)
            .returning(move |raw| {
                captured.lock().unwrap().push(raw);
                Ok(H256::repeat_byte(0x77))
            });

        let submitter = Submitter::new(account, Arc::new(client));
        let tx_hash = submitter.submit(&tx).await.unwrap();

        assert_eq!(tx_hash, H256::repeat_byte(0x77));
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].as_ref()[0], 0x02);
        assert_eq!(sent[0], expected_raw);
    }

    #[tokio::test]
    async fn test_transport_error_becomes_submission_failed() {
        let mut client = MockChainClient::new();
        client.expect_send_raw_transaction().times(1).returning(|_| {
            Err(VoterError::SubmissionFailed(
                "(code: -32000, message: insufficient funds for gas * price + value)".into(),
            ))
        });

        let account = dev_account(CHAIN_ID);
        let tx = vote_tx(&account);
        let submitter = Submitter::new(account, Arc::new(client));

        let err = submitter.submit(&tx).await.unwrap_err();
        assert_eq!(
            err,
            VoterError::SubmissionFailed(
                "(code: -32000, message: insufficient funds for gas * price + value)".into()
            )
        );
    }

    #[tokio::test]
    async fn test_other_adapter_errors_are_rewrapped() {
        let mut client = MockChainClient::new();
        client
            .expect_send_raw_transaction()
            .returning(|_| Err(VoterError::AdapterUnreachable("connection refused".into())));

        let account = dev_account(CHAIN_ID);
        let tx = vote_tx(&account);
        let submitter = Submitter::new(account, Arc::new(client));

        match submitter.submit(&tx).await {
            Err(VoterError::SubmissionFailed(reason)) => {
                assert!(reason.contains("connection refused"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
