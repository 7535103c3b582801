//! Gas limit and fee construction for vote transactions
//!
//! Fees are a static configured rate, not a market estimate. By default the
//! fee cap equals the priority fee, which leaves no room for base fee growth;
//! `max_fee_gwei` raises the cap when the target chain needs headroom.

use crate::chain::ChainClient;
use crate::config::FeeConfig;
use crate::error::VoterResult;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::U256;
use ethers::utils::{parse_units, ParseUnits};
use std::sync::Arc;
use tracing::debug;

/// Convert a decimal gwei string to wei
pub fn gwei_to_wei(amount: &str) -> Result<U256, String> {
    match parse_units(amount.trim(), "gwei").map_err(|e| e.to_string())? {
        ParseUnits::U256(wei) => Ok(wei),
        ParseUnits::I256(_) => Err("fee must not be negative".to_string()),
    }
}

/// Gas and fee fields for one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

pub struct FeePolicy {
    client: Arc<dyn ChainClient>,
    /// The vote call, used for gas estimation
    call: TypedTransaction,
    priority_fee_wei: U256,
    max_fee_wei: U256,
}

impl FeePolicy {
    pub fn new(
        client: Arc<dyn ChainClient>,
        call: TypedTransaction,
        config: &FeeConfig,
    ) -> Result<Self, String> {
        let priority_fee_wei = gwei_to_wei(&config.rate_gwei)?;
        let max_fee_wei = match config.max_fee_gwei {
            Some(ref cap) => gwei_to_wei(cap)?.max(priority_fee_wei),
            None => priority_fee_wei,
        };

        Ok(Self {
            client,
            call,
            priority_fee_wei,
            max_fee_wei,
        })
    }

    /// Estimate the gas limit for the vote call and attach the fee rate.
    ///
    /// Estimation failures propagate; there is no fallback gas limit.
    pub async fn quote(&self) -> VoterResult<FeeQuote> {
        let gas_limit = self.client.estimate_gas(&self.call).await?;

        let quote = FeeQuote {
            gas_limit,
            max_fee_per_gas: self.max_fee_wei,
            max_priority_fee_per_gas: self.priority_fee_wei,
        };

        debug!("Fee quote: {:?}", quote);
        Ok(quote)
    }

    /// Upper bound on what one attempt can cost
    pub fn max_cost(quote: &FeeQuote) -> U256 {
        quote.gas_limit * quote.max_fee_per_gas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChainClient;
    use crate::error::VoterError;
    use ethers::types::Eip1559TransactionRequest;

    fn config(rate: &str, cap: Option<&str>) -> FeeConfig {
        FeeConfig {
            rate_gwei: rate.to_string(),
            max_fee_gwei: cap.map(str::to_string),
        }
    }

    fn estimating(gas: u64) -> Arc<dyn ChainClient> {
        let mut client = MockChainClient::new();
        client
            .expect_estimate_gas()
            .returning(move |_| Ok(U256::from(gas)));
        Arc::new(client)
    }

    fn call() -> TypedTransaction {
        Eip1559TransactionRequest::new().into()
    }

    #[test]
    fn test_gwei_conversion() {
        assert_eq!(gwei_to_wei("0.234").unwrap(), U256::from(234_000_000u64));
        assert_eq!(gwei_to_wei("1").unwrap(), U256::from(1_000_000_000u64));
        assert!(gwei_to_wei("-1").is_err());
        assert!(gwei_to_wei("abc").is_err());
    }

    #[tokio::test]
    async fn test_max_fee_equals_priority_fee_for_any_rate() {
        for rate in ["0", "0.000000001", "0.234", "1.5", "250"] {
            let policy = FeePolicy::new(estimating(21_000), call(), &config(rate, None)).unwrap();
            let quote = policy.quote().await.unwrap();
            assert_eq!(quote.max_fee_per_gas, quote.max_priority_fee_per_gas, "rate {}", rate);
            assert_eq!(quote.max_priority_fee_per_gas, gwei_to_wei(rate).unwrap());
        }
    }

    #[tokio::test]
    async fn test_gas_limit_comes_from_estimate() {
        let policy = FeePolicy::new(estimating(43_512), call(), &config("0.234", None)).unwrap();
        let quote = policy.quote().await.unwrap();
        assert_eq!(quote.gas_limit, U256::from(43_512));
        assert_eq!(
            FeePolicy::max_cost(&quote),
            U256::from(43_512u64) * U256::from(234_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_configured_cap_adds_headroom() {
        let policy =
            FeePolicy::new(estimating(21_000), call(), &config("0.234", Some("1"))).unwrap();
        let quote = policy.quote().await.unwrap();
        assert_eq!(quote.max_fee_per_gas, U256::from(1_000_000_000u64));
        assert_eq!(quote.max_priority_fee_per_gas, U256::from(234_000_000u64));
    }

    #[tokio::test]
    async fn test_estimation_failure_propagates() {
        let mut client = MockChainClient::new();
        client
            .expect_estimate_gas()
            .returning(|_| Err(VoterError::GasEstimationFailed("execution reverted".into())));

        let policy = FeePolicy::new(Arc::new(client), call(), &config("0.234", None)).unwrap();
        let err = policy.quote().await.unwrap_err();
        assert!(matches!(err, VoterError::GasEstimationFailed(_)));
    }
}
