//! HTTP JSON-RPC chain provider

use super::ChainClient;
use crate::config::RpcConfig;
use crate::error::{VoterError, VoterResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// JSON-RPC provider bounded by a per-request timeout
pub struct ChainProvider {
    http: Provider<Http>,
    url: String,
    request_timeout: Duration,
}

impl ChainProvider {
    /// Create a provider for the configured endpoint. No request is made here.
    pub fn new(config: &RpcConfig) -> VoterResult<Self> {
        let http = Provider::<Http>::try_from(config.url.as_str())
            .map_err(|e| VoterError::Config(format!("Invalid RPC URL {}: {}", config.url, e)))?;

        debug!("Created HTTP provider for {}", config.url);

        Ok(Self {
            http,
            url: config.url.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Verify the endpoint answers and serves the expected chain
    pub async fn connect(config: &RpcConfig, expected_chain_id: u64) -> VoterResult<Self> {
        let provider = Self::new(config)?;

        let actual = verify_chain(&provider, expected_chain_id).await?;

        info!("Connected to chain {} via {}", actual, provider.url);
        Ok(provider)
    }

    /// Run an RPC future under the request timeout, mapping both failure
    /// modes through `map_err`.
    async fn call<T, F>(
        &self,
        operation: &str,
        fut: F,
        map_err: fn(String) -> VoterError,
    ) -> VoterResult<T>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match timeout(self.request_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_err(e.to_string())),
            Err(_) => Err(map_err(format!(
                "{} timed out after {:?}",
                operation, self.request_timeout
            ))),
        }
    }
}

/// Fail unless `client` answers and reports `expected` as its chain id
pub async fn verify_chain(client: &dyn ChainClient, expected: u64) -> VoterResult<u64> {
    let actual = client.chain_id().await?;
    if actual != expected {
        return Err(VoterError::ChainMismatch { expected, actual });
    }
    Ok(actual)
}

#[async_trait]
impl ChainClient for ChainProvider {
    async fn chain_id(&self) -> VoterResult<u64> {
        let id = self
            .call(
                "eth_chainId",
                self.http.get_chainid(),
                VoterError::AdapterUnreachable,
            )
            .await?;
        Ok(id.as_u64())
    }

    async fn transaction_count(&self, address: Address) -> VoterResult<u64> {
        let count = self
            .call(
                "eth_getTransactionCount",
                self.http.get_transaction_count(address, None),
                VoterError::NonceQueryFailed,
            )
            .await?;
        Ok(count.as_u64())
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> VoterResult<U256> {
        self.call(
            "eth_estimateGas",
            self.http.estimate_gas(tx, None),
            VoterError::GasEstimationFailed,
        )
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> VoterResult<H256> {
        let send = async {
            self.http
                .send_raw_transaction(raw)
                .await
                .map(|pending| pending.tx_hash())
        };
        self.call(
            "eth_sendRawTransaction",
            send,
            VoterError::SubmissionFailed,
        )
        .await
    }

    async fn transaction_receipt(&self, tx_hash: H256) -> VoterResult<Option<TransactionReceipt>> {
        self.call(
            "eth_getTransactionReceipt",
            self.http.get_transaction_receipt(tx_hash),
            VoterError::ReceiptLookup,
        )
        .await
    }
}
