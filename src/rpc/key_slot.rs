use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, SomniaError};

/// Process-wide "current private key" cell.
///
/// The credential wrapper writes it immediately before each delegated tool
/// call and the RPC client reads it when it needs to sign. Concurrent calls
/// with different keys race on this slot.
#[derive(Clone, Default)]
pub struct KeySlot {
    current: Arc<RwLock<Option<PrivateKeySigner>>>,
}

impl KeySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `private_key` (hex, with or without `0x`) and make it current.
    pub async fn set_private_key(&self, private_key: &str) -> Result<Address> {
        let signer = parse_private_key(private_key)?;
        let address = signer.address();

        *self.current.write().await = Some(signer);
        debug!("Current signer set to {}", address);

        Ok(address)
    }

    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    pub async fn signer(&self) -> Result<PrivateKeySigner> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(SomniaError::SignerNotInitialized)
    }

    pub async fn address(&self) -> Result<Address> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.address())
            .ok_or(SomniaError::SignerNotInitialized)
    }
}

pub fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    let key = private_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    key.parse::<PrivateKeySigner>()
        .map_err(|e| SomniaError::InvalidPrivateKey(e.to_string()))
}

impl std::fmt::Debug for KeySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySlot").finish_non_exhaustive()
    }
}
