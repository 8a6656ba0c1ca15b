use alloy::network::TransactionBuilder;
use alloy::primitives::{address, Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{parse_args, resolve_wallet, submit_and_confirm, validate_address, AmountArg};
use super::{Tool, ToolDefinition};
use crate::error::{Result, SomniaError};
use crate::failure::{self, FailureContext};
use crate::precision;
use crate::rpc::{ChainBackend, ProviderErrorCode};

/// Tokens "burned" by the burn tool are sent here.
pub const BURN_ADDRESS: Address = address!("000000000000000000000000000000000000dEaD");

sol! {
    #[allow(missing_docs)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferErc20Request {
    pub token_address: String,
    pub to_address: String,
    pub amount: AmountArg,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnErc20Request {
    pub token_address: String,
    pub amount: AmountArg,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetErc20BalanceRequest {
    pub token_address: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc20BalanceResponse {
    pub address: String,
    pub token_address: String,
    pub balance: String,
    pub decimals: u8,
    pub raw: String,
    pub token_type: String,
}

async fn read_call<C: SolCall>(
    backend: &dyn ChainBackend,
    token: Address,
    call: C,
) -> Result<C::Return> {
    let tx = TransactionRequest::default()
        .with_to(token)
        .with_input(call.abi_encode());
    let data = backend.call(&tx).await?;

    C::abi_decode_returns(&data, true).map_err(|e| {
        SomniaError::InvalidERC20(format!("{}: undecodable {} result: {}", token, C::SIGNATURE, e))
    })
}

/// 获取代币小数位数；合约不响应时视为无效 ERC20
pub async fn token_decimals(backend: &dyn ChainBackend, token: Address) -> Result<u8> {
    match read_call(backend, token, IERC20::decimalsCall {}).await {
        Ok(r) => Ok(r._0),
        // transport trouble is not the contract's fault
        Err(SomniaError::Provider(e))
            if matches!(
                e.code,
                ProviderErrorCode::NetworkError | ProviderErrorCode::Timeout
            ) =>
        {
            Err(SomniaError::Provider(e))
        }
        Err(e @ SomniaError::InvalidERC20(_)) => Err(e),
        Err(e) => Err(SomniaError::InvalidERC20(format!("{}: {}", token, e))),
    }
}

pub async fn token_symbol(backend: &dyn ChainBackend, token: Address) -> String {
    match read_call(backend, token, IERC20::symbolCall {}).await {
        Ok(r) => r._0,
        Err(e) => {
            debug!("symbol() unavailable on {}: {}", token, e);
            "UNKNOWN".to_string()
        }
    }
}

pub async fn token_balance(
    backend: &dyn ChainBackend,
    token: Address,
    account: Address,
) -> Result<U256> {
    read_call(backend, token, IERC20::balanceOfCall { account })
        .await
        .map(|r| r._0)
}

/// Send `amount` (human units) of `token` from the signer to `to`.
///
/// Validation happens before any network call; a short token balance fails
/// without submitting.
async fn send_tokens(
    backend: &dyn ChainBackend,
    token: Address,
    to: Address,
    amount: &str,
) -> Result<TxHash> {
    // Reject bad amounts before touching the network.
    precision::parse_positive_decimal(amount)?;

    let from = backend.signer_address().await?;
    let decimals = token_decimals(backend, token).await?;
    let raw_amount = precision::parse_amount(amount, decimals)?;

    let balance = token_balance(backend, token, from).await?;
    if balance < raw_amount {
        let symbol = token_symbol(backend, token).await;
        return Err(SomniaError::InsufficientTokenBalance {
            symbol,
            current: precision::format_amount(balance, decimals),
            required: precision::format_amount(raw_amount, decimals),
        });
    }

    let calldata = IERC20::transferCall {
        to,
        amount: raw_amount,
    }
    .abi_encode();

    let tx = TransactionRequest::default()
        .with_from(from)
        .with_to(token)
        .with_input(calldata);

    let gas_estimate = backend.estimate_gas(&tx).await?;

    info!("Sending {} of token {} to {}...", amount, token, to);
    let (hash, _) = submit_and_confirm(backend, tx.with_gas_limit(gas_estimate)).await?;

    Ok(hash)
}

/// `transfer_erc20`
pub struct TransferErc20Tool {
    backend: Arc<dyn ChainBackend>,
    native_symbol: String,
}

impl TransferErc20Tool {
    pub fn new(backend: Arc<dyn ChainBackend>, native_symbol: &str) -> Self {
        TransferErc20Tool {
            backend,
            native_symbol: native_symbol.to_string(),
        }
    }

    pub async fn transfer(&self, request: TransferErc20Request) -> Result<TxHash> {
        let ctx = FailureContext {
            operation: "ERC20 transfer",
            action: "ERC20 transfer",
            symbol: &self.native_symbol,
        };

        let result: Result<TxHash> = async {
            let token = validate_address(&request.token_address, "Token")?;
            let to = validate_address(&request.to_address, "Recipient")?;
            send_tokens(self.backend.as_ref(), token, to, &request.amount.as_string()).await
        }
        .await;

        let hash = result.map_err(|e| failure::classify(e, &ctx))?;
        info!("ERC20 transfer completed. Transaction hash: {}", hash);
        Ok(hash)
    }
}

#[async_trait]
impl Tool for TransferErc20Tool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "transfer_erc20".to_string(),
            description: "Transfer ERC20 tokens to another wallet".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tokenAddress": {
                        "type": "string",
                        "description": "The ERC20 token contract address"
                    },
                    "toAddress": {
                        "type": "string",
                        "description": "The wallet address to transfer tokens to"
                    },
                    "amount": {
                        "type": "string",
                        "description": "The amount of tokens to transfer"
                    }
                },
                "required": ["tokenAddress", "toAddress", "amount"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let request: TransferErc20Request = parse_args(arguments)?;
        let hash = self.transfer(request).await?;
        Ok(json!(hash.to_string()))
    }
}

/// `burn_erc20`: a transfer to [`BURN_ADDRESS`].
pub struct BurnErc20Tool {
    backend: Arc<dyn ChainBackend>,
    native_symbol: String,
}

impl BurnErc20Tool {
    pub fn new(backend: Arc<dyn ChainBackend>, native_symbol: &str) -> Self {
        BurnErc20Tool {
            backend,
            native_symbol: native_symbol.to_string(),
        }
    }

    pub async fn burn(&self, request: BurnErc20Request) -> Result<TxHash> {
        let ctx = FailureContext {
            operation: "ERC20 burn",
            action: "burn",
            symbol: &self.native_symbol,
        };

        let result: Result<TxHash> = async {
            let token = validate_address(&request.token_address, "Token")?;
            send_tokens(
                self.backend.as_ref(),
                token,
                BURN_ADDRESS,
                &request.amount.as_string(),
            )
            .await
        }
        .await;

        let hash = result.map_err(|e| failure::classify(e, &ctx))?;
        info!("ERC20 burn completed. Transaction hash: {}", hash);
        Ok(hash)
    }
}

#[async_trait]
impl Tool for BurnErc20Tool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "burn_erc20".to_string(),
            description: "Burn ERC20 tokens (send to burn address)".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tokenAddress": {
                        "type": "string",
                        "description": "The ERC20 token contract address"
                    },
                    "amount": {
                        "type": "string",
                        "description": "The amount of tokens to burn"
                    }
                },
                "required": ["tokenAddress", "amount"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let request: BurnErc20Request = parse_args(arguments)?;
        let hash = self.burn(request).await?;
        Ok(json!(hash.to_string()))
    }
}

/// `get_erc20_balance`
pub struct GetErc20BalanceTool {
    backend: Arc<dyn ChainBackend>,
}

impl GetErc20BalanceTool {
    pub fn new(backend: Arc<dyn ChainBackend>) -> Self {
        GetErc20BalanceTool { backend }
    }

    /// 获取 ERC20 代币余额
    pub async fn get_balance(&self, request: GetErc20BalanceRequest) -> Result<Erc20BalanceResponse> {
        let token = validate_address(&request.token_address, "Token")?;
        let wallet =
            resolve_wallet(self.backend.as_ref(), request.wallet_address.as_deref()).await?;

        info!("Getting ERC20 balance: {:?} on token: {:?}", wallet, token);

        let decimals = token_decimals(self.backend.as_ref(), token).await?;
        let symbol = token_symbol(self.backend.as_ref(), token).await;
        let raw_balance = token_balance(self.backend.as_ref(), token, wallet)
            .await
            .map_err(|e| {
                warn!("balanceOf failed on {}: {}", token, e);
                e
            })?;

        Ok(Erc20BalanceResponse {
            address: wallet.to_string(),
            token_address: token.to_string(),
            balance: precision::format_amount(raw_balance, decimals),
            decimals,
            raw: raw_balance.to_string(),
            token_type: symbol,
        })
    }
}

#[async_trait]
impl Tool for GetErc20BalanceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_erc20_balance".to_string(),
            description: "Get ERC20 token balance of a wallet".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tokenAddress": {
                        "type": "string",
                        "description": "The ERC20 token contract address"
                    },
                    "walletAddress": {
                        "type": ["string", "null"],
                        "description": "The wallet address to check balance (optional, uses agent wallet if not provided)"
                    }
                },
                "required": ["tokenAddress"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let request: GetErc20BalanceRequest = parse_args(arguments)?;
        let response = self.get_balance(request).await?;
        Ok(serde_json::to_value(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_calldata_selector() {
        let calldata = IERC20::transferCall {
            to: BURN_ADDRESS,
            amount: U256::from(1u64),
        }
        .abi_encode();

        // transfer(address,uint256)
        assert_eq!(&calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(calldata.len(), 4 + 32 * 2);
    }

    #[test]
    fn test_burn_address() {
        assert_eq!(
            BURN_ADDRESS.to_string(),
            "0x000000000000000000000000000000000000dEaD"
        );
    }
}
