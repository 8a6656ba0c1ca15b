use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

use super::{ChainBackend, FeeData, KeySlot, ProviderError, ProviderErrorCode, TxReceipt};
use crate::config::Config;
use crate::error::{Result, SomniaError};

/// RPC client for Somnia (or any EVM) interactions.
///
/// Signing uses whatever signer currently sits in the shared [`KeySlot`].
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<RpcClientInner>,
}

struct RpcClientInner {
    provider_url: url::Url,
    key_slot: KeySlot,
    /// Chain id stamped on outgoing transactions; `None` lets the node decide.
    chain_id: Option<u64>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcClient {
    /// Create a new RPC client
    pub fn new(rpc_url: &str, key_slot: KeySlot) -> Result<Self> {
        let provider_url = rpc_url
            .parse::<url::Url>()
            .map_err(|_| SomniaError::ConfigError("Invalid RPC URL format".to_string()))?;

        debug!("Using RPC endpoint: {}", provider_url);

        Ok(RpcClient {
            inner: Arc::new(RpcClientInner {
                provider_url,
                key_slot,
                chain_id: None,
                receipt_timeout: Duration::from_secs(120),
                poll_interval: Duration::from_secs(1),
            }),
        })
    }

    pub fn from_config(config: &Config, key_slot: KeySlot) -> Result<Self> {
        Ok(Self::new(&config.rpc_url, key_slot)?
            .with_chain_id(config.chain_id)
            .with_receipt_timeout(config.receipt_timeout, config.receipt_poll_interval))
    }

    /// Sign every transaction for `chain_id`. A node on another chain will
    /// reject them.
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        RpcClient {
            inner: Arc::new(RpcClientInner {
                provider_url: self.inner.provider_url.clone(),
                key_slot: self.inner.key_slot.clone(),
                chain_id: Some(chain_id),
                receipt_timeout: self.inner.receipt_timeout,
                poll_interval: self.inner.poll_interval,
            }),
        }
    }

    /// Override how long [`ChainBackend::wait_for_receipt`] polls.
    pub fn with_receipt_timeout(self, timeout: Duration, poll_interval: Duration) -> Self {
        RpcClient {
            inner: Arc::new(RpcClientInner {
                provider_url: self.inner.provider_url.clone(),
                key_slot: self.inner.key_slot.clone(),
                chain_id: self.inner.chain_id,
                receipt_timeout: timeout,
                poll_interval,
            }),
        }
    }

    /// Read-only provider for each operation
    fn provider(&self) -> impl Provider<Http<Client>> {
        ProviderBuilder::new().on_http(self.inner.provider_url.clone())
    }

    /// Provider that fills nonce, gas and chain id and signs with the current key.
    async fn signing_provider(&self) -> Result<impl Provider<Http<Client>>> {
        let signer = self.inner.key_slot.signer().await?;

        Ok(ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_http(self.inner.provider_url.clone()))
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.inner.chain_id
    }

    /// Stamp the configured chain id unless the caller set one.
    fn prepare_transaction(&self, tx: TransactionRequest) -> TransactionRequest {
        match self.inner.chain_id {
            Some(chain_id) if tx.chain_id.is_none() => tx.with_chain_id(chain_id),
            _ => tx,
        }
    }

    pub fn key_slot(&self) -> &KeySlot {
        &self.inner.key_slot
    }

    /// Get RPC URL
    pub fn rpc_url(&self) -> &str {
        self.inner.provider_url.as_str()
    }
}

#[async_trait]
impl ChainBackend for RpcClient {
    async fn signer_address(&self) -> Result<Address> {
        self.inner.key_slot.address().await
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        debug!("Getting native balance for: {:?}", address);

        self.provider().get_balance(address).await.map_err(|e| {
            error!("Failed to get balance: {}", e);
            ProviderError::from(e).into()
        })
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        debug!("Estimating gas for transaction to {:?}", tx.to);

        self.provider().estimate_gas(tx).await.map_err(|e| {
            error!("Failed to estimate gas: {}", e);
            ProviderError::from(e).into()
        })
    }

    async fn fee_data(&self) -> Result<FeeData> {
        debug!("Getting current fee data");

        let provider = self.provider();
        let gas_price = provider.get_gas_price().await.map_err(|e| {
            error!("Failed to get gas price: {}", e);
            SomniaError::from(ProviderError::from(e))
        })?;

        // Legacy-only chains reject the 1559 fee history call.
        let eip1559 = match provider.estimate_eip1559_fees(None).await {
            Ok(fees) => Some(fees),
            Err(e) => {
                debug!("EIP-1559 fee estimate unavailable: {}", e);
                None
            }
        };

        Ok(FeeData {
            gas_price: (gas_price > 0).then_some(gas_price),
            max_fee_per_gas: eip1559.as_ref().map(|f| f.max_fee_per_gas),
            max_priority_fee_per_gas: eip1559.as_ref().map(|f| f.max_priority_fee_per_gas),
        })
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        debug!("Calling contract function on {:?}", tx.to);

        self.provider().call(tx).await.map_err(|e| {
            error!("Failed to call contract: {}", e);
            ProviderError::from(e).into()
        })
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let provider = self.signing_provider().await?;

        let tx = self.prepare_transaction(tx);

        let pending = provider.send_transaction(tx).await.map_err(|e| {
            error!("Failed to send transaction: {}", e);
            SomniaError::from(ProviderError::from(e))
        })?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>> {
        let provider = self.provider();
        let deadline = Instant::now() + self.inner.receipt_timeout;

        loop {
            let receipt = provider
                .get_transaction_receipt(hash)
                .await
                .map_err(ProviderError::from)?;

            if let Some(receipt) = receipt {
                debug!("Receipt for {} in block {:?}", hash, receipt.block_number);
                return Ok(Some(TxReceipt {
                    transaction_hash: receipt.transaction_hash,
                    success: receipt.status(),
                    block_number: receipt.block_number,
                    contract_address: receipt.contract_address,
                }));
            }

            if Instant::now() >= deadline {
                // An unknown transaction only counts as dropped at the deadline.
                let known = provider
                    .get_transaction_by_hash(hash)
                    .await
                    .map_err(ProviderError::from)?;
                if known.is_none() {
                    warn!("Transaction {} was dropped by the node", hash);
                    return Ok(None);
                }

                return Err(ProviderError::new(
                    ProviderErrorCode::Timeout,
                    format!("timed out waiting for receipt of {}", hash),
                )
                .into());
            }

            sleep(self.inner.poll_interval).await;
        }
    }
}
