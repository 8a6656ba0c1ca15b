pub mod credentials;
pub mod deploy;
pub mod erc20;
pub mod native;

pub use credentials::{CredentialSource, Credentials, WithPrivateKey};
pub use deploy::DeployContractTool;
pub use erc20::{BurnErc20Tool, GetErc20BalanceTool, TransferErc20Tool};
pub use native::{GetSomiBalanceTool, TransferSomiTool};

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, SomniaError};
use crate::rpc::{ChainBackend, KeySlot, TxReceipt};

/// Tool definition advertised to the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A named operation the agent can invoke with JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, arguments: Value) -> Result<Value>;

    fn name(&self) -> String {
        self.definition().name
    }
}

/// Build all tools, each wrapped so the agent's private key is injected into
/// `key_slot` before the call runs.
pub fn create_tools(
    backend: Arc<dyn ChainBackend>,
    key_slot: KeySlot,
    credentials: Arc<dyn CredentialSource>,
    native_symbol: &str,
) -> Vec<Arc<dyn Tool>> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(TransferSomiTool::new(Arc::clone(&backend), native_symbol)),
        Arc::new(TransferErc20Tool::new(Arc::clone(&backend), native_symbol)),
        Arc::new(BurnErc20Tool::new(Arc::clone(&backend), native_symbol)),
        Arc::new(GetSomiBalanceTool::new(Arc::clone(&backend), native_symbol)),
        Arc::new(GetErc20BalanceTool::new(Arc::clone(&backend))),
        Arc::new(DeployContractTool::new(backend, native_symbol)),
    ];

    tools
        .into_iter()
        .map(|tool| {
            Arc::new(WithPrivateKey::new(
                tool,
                Arc::clone(&credentials),
                key_slot.clone(),
            )) as Arc<dyn Tool>
        })
        .collect()
}

/// Amount argument: agents send either `"1.5"` or `1.5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountArg {
    Text(String),
    Number(serde_json::Number),
}

impl AmountArg {
    pub fn as_string(&self) -> String {
        match self {
            AmountArg::Text(s) => s.trim().to_string(),
            AmountArg::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| SomniaError::InvalidArguments(e.to_string()))
}

/// 验证地址格式（空字符串和格式错误分别报告）
///
/// 大小写混合的地址必须符合 EIP-55 校验和；全小写或全大写不做校验。
pub(crate) fn validate_address(addr_str: &str, role: &str) -> Result<Address> {
    let trimmed = addr_str.trim();
    if trimmed.is_empty() {
        return Err(SomniaError::InvalidAddress(format!("{} address is required", role)));
    }

    let invalid =
        || SomniaError::InvalidAddress(format!("Invalid {} address format", role.to_lowercase()));

    let address = trimmed.parse::<Address>().map_err(|_| invalid())?;

    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let mixed_case = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case && address.to_checksum(None) != format!("0x{}", hex) {
        return Err(invalid());
    }

    Ok(address)
}

/// Resolve an optional wallet argument, defaulting to the current signer.
pub(crate) async fn resolve_wallet(
    backend: &dyn ChainBackend,
    wallet_address: Option<&str>,
) -> Result<Address> {
    match wallet_address.map(str::trim).filter(|s| !s.is_empty()) {
        Some(addr) => validate_address(addr, "Wallet"),
        None => backend.signer_address().await,
    }
}

/// Broadcast `tx`, wait for it to be mined and require a successful receipt.
pub(crate) async fn submit_and_confirm(
    backend: &dyn ChainBackend,
    tx: TransactionRequest,
) -> Result<(TxHash, TxReceipt)> {
    let hash = backend.send_transaction(tx).await?;
    info!("Transaction sent: {}", hash);

    let receipt = backend
        .wait_for_receipt(hash)
        .await?
        .ok_or(SomniaError::ReceiptUnavailable)?;

    if !receipt.success {
        return Err(SomniaError::TransactionFailed(hash));
    }

    Ok((hash, receipt))
}
