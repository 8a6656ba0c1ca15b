use alloy::primitives::TxHash;
use thiserror::Error;

use crate::rpc::ProviderError;

#[derive(Error, Debug)]
pub enum SomniaError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signer not initialized")]
    SignerNotInitialized,

    #[error(
        "Insufficient {symbol} balance. Current: {current} {symbol}, \
         Required: {required} {symbol} ({amount} {symbol} + {gas_cost} {symbol} gas)"
    )]
    InsufficientBalance {
        symbol: String,
        current: String,
        required: String,
        amount: String,
        gas_cost: String,
    },

    #[error("Insufficient {symbol} balance. Current: {current} {symbol}, Required: {required} {symbol}")]
    InsufficientTokenBalance {
        symbol: String,
        current: String,
        required: String,
    },

    #[error("Insufficient funds for gas fees")]
    InsufficientFundsForGas,

    #[error("Insufficient {0} balance for transfer and gas fees")]
    InsufficientFundsForTransfer(String),

    #[error("Network error during {0}")]
    Network(String),

    #[error("{0} transaction timed out")]
    Timeout(String),

    #[error("Gas estimation failed or gas limit exceeded")]
    GasFailure,

    #[error("Transaction receipt not available")]
    ReceiptUnavailable,

    #[error("Transaction failed: {0}")]
    TransactionFailed(TxHash),

    #[error("{operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("RPC error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid ERC20 contract: {0}")]
    InvalidERC20(String),

    #[error("Invalid contract ABI: {0}")]
    InvalidAbi(String),

    #[error("Contract deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Precision error: {0}")]
    PrecisionError(String),
}

pub type Result<T> = std::result::Result<T, SomniaError>;
