pub mod client;
pub mod key_slot;
pub mod provider_error;

pub use client::RpcClient;
pub use key_slot::KeySlot;
pub use provider_error::{ProviderError, ProviderErrorCode};

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Current fee quote, as reported by the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeData {
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

/// The parts of a mined receipt the tools look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
}

/// Chain access used by the tools.
///
/// Provider failures come back as [`crate::SomniaError::Provider`] so callers
/// can classify them; signer problems use their own variants.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Address of the signer currently held in the key slot.
    async fn signer_address(&self) -> Result<Address>;

    async fn balance(&self, address: Address) -> Result<U256>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

    async fn fee_data(&self) -> Result<FeeData>;

    /// Read-only `eth_call`.
    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes>;

    /// Sign with the current signer and broadcast.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Wait until `hash` is mined. `Ok(None)` means the node no longer knows
    /// the transaction.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>>;
}
