//! Maps provider failures raised during a state-changing operation onto the
//! short, user-readable messages the agent sees.

use tracing::error;

use crate::error::SomniaError;
use crate::rpc::ProviderErrorCode;

/// Labels used when rewording a failure.
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    /// Generic wrapper prefix, e.g. `"SOMI transfer"`.
    pub operation: &'a str,
    /// Short verb phrase, e.g. `"transfer"`.
    pub action: &'a str,
    /// Symbol quoted in the funds-related message.
    pub symbol: &'a str,
}

/// Reword a provider failure.
///
/// Errors the operation raised itself (validation, balance checks, receipt
/// checks) are returned untouched.
pub fn classify(err: SomniaError, ctx: &FailureContext<'_>) -> SomniaError {
    let provider = match err {
        SomniaError::Provider(provider) => provider,
        other => return other,
    };

    error!("{} failed: {}", ctx.operation, provider.message);

    match provider.code {
        ProviderErrorCode::InsufficientFunds => return SomniaError::InsufficientFundsForGas,
        ProviderErrorCode::NetworkError => return SomniaError::Network(ctx.action.to_string()),
        ProviderErrorCode::Timeout => return SomniaError::Timeout(capitalize(ctx.action)),
        ProviderErrorCode::Server => {}
    }

    let message = provider.message.to_lowercase();
    if message.contains("insufficient funds") {
        SomniaError::InsufficientFundsForTransfer(ctx.symbol.to_string())
    } else if message.contains("gas") {
        SomniaError::GasFailure
    } else {
        SomniaError::OperationFailed {
            operation: ctx.operation.to_string(),
            message: provider.message,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
