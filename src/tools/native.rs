use alloy::network::TransactionBuilder;
use alloy::primitives::{TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::{parse_args, resolve_wallet, submit_and_confirm, validate_address, AmountArg};
use super::{Tool, ToolDefinition};
use crate::error::{Result, SomniaError};
use crate::failure::{self, FailureContext};
use crate::precision::{self, NATIVE_DECIMALS};
use crate::rpc::ChainBackend;

/// Used when the node reports no gas price: 1 gwei.
pub const FALLBACK_GAS_PRICE: u128 = 1_000_000_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSomiRequest {
    pub to_address: String,
    pub amount: AmountArg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSomiBalanceRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: String,
    pub decimals: u8,
    pub raw: String,
    pub token_type: String,
}

/// Transfer `amount` of the native token to `to_address` after checking the
/// signer can cover amount plus gas.
///
/// Address and amount are validated before any network call. When the
/// balance is short, nothing is submitted. Provider failures are reworded
/// through [`failure::classify`].
pub async fn transfer_native(
    backend: &dyn ChainBackend,
    symbol: &str,
    to_address: &str,
    amount: &str,
) -> Result<TxHash> {
    let operation = format!("{} transfer", symbol);
    let ctx = FailureContext {
        operation: &operation,
        action: "transfer",
        symbol,
    };

    transfer_native_inner(backend, symbol, to_address, amount)
        .await
        .map_err(|e| failure::classify(e, &ctx))
}

async fn transfer_native_inner(
    backend: &dyn ChainBackend,
    symbol: &str,
    to_address: &str,
    amount: &str,
) -> Result<TxHash> {
    let to = validate_address(to_address, "Recipient")?;
    let value = precision::parse_amount(amount, NATIVE_DECIMALS)?;

    let from = backend.signer_address().await?;
    let current_balance = backend.balance(from).await?;

    let tx = TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_value(value);

    let gas_estimate = backend.estimate_gas(&tx).await?;
    let fee_data = backend.fee_data().await?;
    let gas_price = fee_data.gas_price.unwrap_or(FALLBACK_GAS_PRICE);

    let gas_cost = U256::from(gas_estimate) * U256::from(gas_price);
    let total_required = value.saturating_add(gas_cost);

    debug!(
        "Balance {} wei, required {} wei (gas {} @ {} wei)",
        current_balance, total_required, gas_estimate, gas_price
    );

    if current_balance < total_required {
        return Err(SomniaError::InsufficientBalance {
            symbol: symbol.to_string(),
            current: precision::format_amount(current_balance, NATIVE_DECIMALS),
            required: precision::format_amount(total_required, NATIVE_DECIMALS),
            amount: amount.to_string(),
            gas_cost: precision::format_amount(gas_cost, NATIVE_DECIMALS),
        });
    }

    info!("Transferring {} {} to {}...", amount, symbol, to);

    let (hash, _) = submit_and_confirm(backend, tx.with_gas_limit(gas_estimate)).await?;

    info!(
        "{} transfer completed successfully. Transaction hash: {}",
        symbol, hash
    );
    Ok(hash)
}

/// `transfer_somi`: send the native token to another wallet.
pub struct TransferSomiTool {
    backend: Arc<dyn ChainBackend>,
    symbol: String,
}

impl TransferSomiTool {
    pub fn new(backend: Arc<dyn ChainBackend>, symbol: &str) -> Self {
        TransferSomiTool {
            backend,
            symbol: symbol.to_string(),
        }
    }
}

#[async_trait]
impl Tool for TransferSomiTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "transfer_somi".to_string(),
            description: format!(
                "Transfer {} (native token) to another wallet",
                self.symbol
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "toAddress": {
                        "type": "string",
                        "description": format!("The wallet address to transfer {} to", self.symbol)
                    },
                    "amount": {
                        "type": "string",
                        "description": format!("The amount of {} to transfer", self.symbol)
                    }
                },
                "required": ["toAddress", "amount"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let request: TransferSomiRequest = parse_args(arguments)?;
        let hash = transfer_native(
            self.backend.as_ref(),
            &self.symbol,
            &request.to_address,
            &request.amount.as_string(),
        )
        .await?;

        Ok(json!(hash.to_string()))
    }
}

/// `get_somi_balance`: native balance of a wallet (the signer by default).
pub struct GetSomiBalanceTool {
    backend: Arc<dyn ChainBackend>,
    symbol: String,
}

impl GetSomiBalanceTool {
    pub fn new(backend: Arc<dyn ChainBackend>, symbol: &str) -> Self {
        GetSomiBalanceTool {
            backend,
            symbol: symbol.to_string(),
        }
    }

    pub async fn get_balance(&self, request: GetSomiBalanceRequest) -> Result<BalanceResponse> {
        let address =
            resolve_wallet(self.backend.as_ref(), request.wallet_address.as_deref()).await?;
        info!("Getting {} balance: {:?}", self.symbol, address);

        let raw_balance = self.backend.balance(address).await?;

        Ok(BalanceResponse {
            address: address.to_string(),
            balance: precision::format_amount(raw_balance, NATIVE_DECIMALS),
            decimals: NATIVE_DECIMALS,
            raw: raw_balance.to_string(),
            token_type: self.symbol.clone(),
        })
    }
}

#[async_trait]
impl Tool for GetSomiBalanceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_somi_balance".to_string(),
            description: format!("Get {} balance of a wallet", self.symbol),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "walletAddress": {
                        "type": ["string", "null"],
                        "description": format!(
                            "The wallet address to check {} balance (optional, uses agent wallet if not provided)",
                            self.symbol
                        )
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let request: GetSomiBalanceRequest = if arguments.is_null() {
            GetSomiBalanceRequest::default()
        } else {
            parse_args(arguments)?
        };

        let response = self.get_balance(request).await?;
        Ok(serde_json::to_value(&response)?)
    }
}
