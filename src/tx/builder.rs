//! Vote transaction assembly

use super::gas::FeeQuote;
use crate::config::VoteConfig;
use crate::error::{VoterError, VoterResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest};

/// Selector of the target contract's `vote()` function,
/// i.e. `keccak256("vote()")[..4]`. The call takes no arguments, so the
/// selector is the whole call data. Update it if the contract interface changes.
pub const VOTE_SELECTOR: [u8; 4] = [0x63, 0x2a, 0x9a, 0x52];

/// Assembles fee-market (type 2) vote transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    from: Address,
    contract: Address,
    chain_id: u64,
    call_data: Bytes,
}

impl TransactionBuilder {
    pub fn new(from: Address, contract: Address, chain_id: u64, call_data: Bytes) -> Self {
        Self {
            from,
            contract,
            chain_id,
            call_data,
        }
    }

    /// Builder for the configured vote contract, defaulting to `vote()` call data
    pub fn from_config(from: Address, config: &VoteConfig) -> VoterResult<Self> {
        let contract: Address = config
            .contract_address
            .parse()
            .map_err(|e| VoterError::Config(format!("Invalid contract address: {}", e)))?;

        let call_data = match config.call_data {
            Some(ref data) => hex::decode(data.trim_start_matches("0x"))
                .map_err(|e| VoterError::Config(format!("Invalid call data: {}", e)))?
                .into(),
            None => Bytes::from(VOTE_SELECTOR.to_vec()),
        };

        Ok(Self::new(from, contract, config.chain_id, call_data))
    }

    pub fn call_data(&self) -> &Bytes {
        &self.call_data
    }

    fn base(&self) -> Eip1559TransactionRequest {
        Eip1559TransactionRequest::new()
            .from(self.from)
            .to(self.contract)
            .data(self.call_data.clone())
            .chain_id(self.chain_id)
    }

    /// The bare call, without nonce or fees, for gas estimation
    pub fn estimate_call(&self) -> TypedTransaction {
        TypedTransaction::Eip1559(self.base())
    }

    /// Complete unsigned transaction. Values are taken as given.
    pub fn build(&self, nonce: u64, fees: &FeeQuote) -> TypedTransaction {
        let tx = self
            .base()
            .nonce(nonce)
            .gas(fees.gas_limit)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);

        TypedTransaction::Eip1559(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::gas::gwei_to_wei;
    use ethers::types::{NameOrAddress, U256, U64};

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            167000,
            Bytes::from(VOTE_SELECTOR.to_vec()),
        )
    }

    #[test]
    fn test_selector_encodes_vote() {
        assert_eq!(ethers::utils::id("vote()"), VOTE_SELECTOR);
    }

    #[test]
    fn test_build_carries_all_fields() {
        let rate = gwei_to_wei("0.234").unwrap();
        let fees = FeeQuote {
            gas_limit: U256::from(50_000),
            max_fee_per_gas: rate,
            max_priority_fee_per_gas: rate,
        };

        let tx = builder().build(12, &fees);
        let TypedTransaction::Eip1559(inner) = &tx else {
            panic!("expected a fee-market transaction, got {:?}", tx);
        };

        assert_eq!(
            inner.to,
            Some(NameOrAddress::Address(Address::repeat_byte(0x02)))
        );
        assert_eq!(inner.chain_id, Some(U64::from(167000u64)));
        assert_eq!(inner.nonce, Some(U256::from(12)));
        assert_eq!(inner.gas, Some(U256::from(50_000)));
        assert_eq!(inner.max_fee_per_gas, Some(U256::from(234_000_000u64)));
        assert_eq!(inner.max_priority_fee_per_gas, Some(U256::from(234_000_000u64)));
        assert_eq!(inner.data.as_ref().map(|d| d.to_vec()), Some(VOTE_SELECTOR.to_vec()));
    }

    #[test]
    fn test_estimate_call_has_no_nonce_or_fees() {
        let tx = builder().estimate_call();
        assert_eq!(tx.from(), Some(&Address::repeat_byte(0x01)));
        assert!(tx.nonce().is_none());
        assert!(tx.gas().is_none());
    }

    #[test]
    fn test_config_call_data_override() {
        let config = VoteConfig {
            contract_address: "0x4D1E2145082d0AB0fDa4a973dC4887C7295e21aB".to_string(),
            chain_id: 167000,
            call_data: Some("0xdeadbeef".to_string()),
        };
        let builder = TransactionBuilder::from_config(Address::zero(), &config).unwrap();
        assert_eq!(builder.call_data().to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_config_defaults_to_vote_selector() {
        let config = VoteConfig {
            contract_address: "0x4D1E2145082d0AB0fDa4a973dC4887C7295e21aB".to_string(),
            chain_id: 167000,
            call_data: None,
        };
        let builder = TransactionBuilder::from_config(Address::zero(), &config).unwrap();
        assert_eq!(builder.call_data().to_vec(), VOTE_SELECTOR.to_vec());
    }
}
