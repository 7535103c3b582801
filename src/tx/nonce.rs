//! Nonce sequencing for the voting account
//!
//! The nonce is re-read from the chain for every attempt. Nothing is cached,
//! so gaps caused by other senders are picked up on the next attempt.
//! Two processes voting from the same account at once will still race.

use crate::chain::ChainClient;
use crate::error::VoterResult;

use ethers::types::Address;
use std::sync::Arc;
use tracing::debug;

pub struct NonceSequencer {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl NonceSequencer {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    /// Next nonce for the account, straight from the chain
    pub async fn next(&self) -> VoterResult<u64> {
        let nonce = self.client.transaction_count(self.address).await?;
        debug!("Next nonce for {:?}: {}", self.address, nonce);
        Ok(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChainClient;
    use crate::error::VoterError;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_requeries_chain_every_call() {
        let address = Address::repeat_byte(0x11);
        let mut client = MockChainClient::new();
        let mut count = 6;
        client
            .expect_transaction_count()
            .with(eq(address))
            .times(2)
            .returning(move |_| {
                count += 1;
                Ok(count)
            });

        let sequencer = NonceSequencer::new(address, Arc::new(client));
        assert_eq!(assert_ok!(sequencer.next().await), 7);
        assert_eq!(assert_ok!(sequencer.next().await), 8);
    }

    #[tokio::test]
    async fn test_propagates_query_failure() {
        let mut client = MockChainClient::new();
        client
            .expect_transaction_count()
            .returning(|_| Err(VoterError::NonceQueryFailed("timeout".into())));

        let sequencer = NonceSequencer::new(Address::zero(), Arc::new(client));
        let err = assert_err!(sequencer.next().await);
        assert_eq!(err, VoterError::NonceQueryFailed("timeout".into()));
    }
}
