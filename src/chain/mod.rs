//! Chain module - the RPC boundary and confirmation tracking
//!
//! This module provides:
//! - The `ChainClient` trait the transaction engine talks through
//! - An HTTP JSON-RPC implementation with per-request timeouts
//! - Receipt polling with a bounded confirmation deadline

pub mod confirmation;
pub mod provider;

pub use confirmation::ConfirmationPoller;
pub use provider::ChainProvider;

use crate::error::VoterResult;

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};

/// The four RPC calls a vote attempt needs, plus a chain id probe
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id reported by the endpoint; used as the startup connectivity check
    async fn chain_id(&self) -> VoterResult<u64>;

    /// Transactions sent so far by `address` (its next nonce)
    async fn transaction_count(&self, address: Address) -> VoterResult<u64>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> VoterResult<U256>;

    /// Broadcast signed wire bytes, returning the transaction hash
    async fn send_raw_transaction(&self, raw: Bytes) -> VoterResult<H256>;

    /// `None` while the transaction is not yet mined
    async fn transaction_receipt(&self, tx_hash: H256) -> VoterResult<Option<TransactionReceipt>>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    mockall::mock! {
        pub ChainClient {}

        #[async_trait]
        impl ChainClient for ChainClient {
            async fn chain_id(&self) -> VoterResult<u64>;
            async fn transaction_count(&self, address: Address) -> VoterResult<u64>;
            async fn estimate_gas(&self, tx: &TypedTransaction) -> VoterResult<U256>;
            async fn send_raw_transaction(&self, raw: Bytes) -> VoterResult<H256>;
            async fn transaction_receipt(&self, tx_hash: H256) -> VoterResult<Option<TransactionReceipt>>;
        }
    }

    /// Receipt carrying only a status bit
    pub fn receipt_with_status(tx_hash: H256, status: u64) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(status.into()),
            block_number: Some(1u64.into()),
            ..Default::default()
        }
    }
}
