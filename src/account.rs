//! The single voting account: address plus signing key

use crate::config::AccountConfig;
use crate::error::{VoterError, VoterResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;

/// Owns the key material for the process lifetime
#[derive(Debug, Clone)]
pub struct Account {
    wallet: LocalWallet,
}

impl Account {
    /// Load the wallet from config, bound to `chain_id`.
    ///
    /// The configured address must be the one the key derives, otherwise
    /// nonce queries and signatures would disagree about the sender.
    pub fn from_config(config: &AccountConfig, chain_id: u64) -> VoterResult<Self> {
        let wallet = config
            .private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| VoterError::Wallet(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain_id);

        let expected: Address = config
            .address
            .parse()
            .map_err(|e| VoterError::Config(format!("Invalid account address: {}", e)))?;

        if wallet.address() != expected {
            return Err(VoterError::Config(format!(
                "Private key belongs to {:?}, not the configured address {:?}",
                wallet.address(),
                expected
            )));
        }

        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}
