use alloy::transports::{RpcError, TransportError, TransportErrorKind};
use thiserror::Error;

/// Coarse category of a provider failure, mirroring the error codes a
/// JSON-RPC signing library reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    InsufficientFunds,
    NetworkError,
    Timeout,
    Server,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        ProviderError {
            code,
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Server, message)
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        let code = match &err {
            RpcError::ErrorResp(payload) => {
                if payload
                    .message
                    .to_lowercase()
                    .contains("insufficient funds for gas")
                {
                    ProviderErrorCode::InsufficientFunds
                } else {
                    ProviderErrorCode::Server
                }
            }
            RpcError::Transport(TransportErrorKind::Custom(inner)) => {
                match inner.downcast_ref::<reqwest::Error>() {
                    Some(e) if e.is_timeout() => ProviderErrorCode::Timeout,
                    _ => ProviderErrorCode::NetworkError,
                }
            }
            RpcError::Transport(_) => ProviderErrorCode::NetworkError,
            _ => ProviderErrorCode::Server,
        };

        let message = match &err {
            RpcError::ErrorResp(payload) => payload.message.to_string(),
            other => other.to_string(),
        };

        ProviderError { code, message }
    }
}
