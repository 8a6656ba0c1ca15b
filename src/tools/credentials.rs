use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{Tool, ToolDefinition};
use crate::error::Result;
use crate::rpc::KeySlot;

/// Secrets an agent signs with.
#[derive(Clone)]
pub struct Credentials {
    pub private_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Anything that can hand out credentials at call time (usually the agent).
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Credentials;
}

/// Wraps a tool so the source's private key becomes the current signer
/// right before every call.
pub struct WithPrivateKey<T: ?Sized> {
    source: Arc<dyn CredentialSource>,
    key_slot: KeySlot,
    inner: Arc<T>,
}

impl<T: Tool + ?Sized> WithPrivateKey<T> {
    pub fn new(inner: Arc<T>, source: Arc<dyn CredentialSource>, key_slot: KeySlot) -> Self {
        WithPrivateKey {
            source,
            key_slot,
            inner,
        }
    }
}

#[async_trait]
impl<T: Tool + ?Sized> Tool for WithPrivateKey<T> {
    fn definition(&self) -> ToolDefinition {
        self.inner.definition()
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let credentials = self.source.credentials();
        let address = self.key_slot.set_private_key(&credentials.private_key).await?;
        debug!("Calling {} as {}", self.inner.name(), address);

        self.inner.call(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SomniaError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    struct StaticKey(&'static str);

    impl CredentialSource for StaticKey {
        fn credentials(&self) -> Credentials {
            Credentials {
                private_key: self.0.to_string(),
            }
        }
    }

    /// Reports which address was current when it ran.
    struct WhoAmI {
        slot: KeySlot,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tool for WhoAmI {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "who_am_i".to_string(),
                description: "test".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn call(&self, _arguments: Value) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let address = self.slot.address().await?;
            Ok(json!(address.to_string()))
        }
    }

    #[test]
    fn test_key_injected_before_call() {
        futures::executor::block_on(async {
            let slot = KeySlot::new();
            let inner = Arc::new(WhoAmI {
                slot: slot.clone(),
                calls: AtomicUsize::new(0),
            });
            let tool = WithPrivateKey::new(Arc::clone(&inner), Arc::new(StaticKey(KEY)), slot);

            let result = tool.call(json!({})).await.unwrap();
            assert_eq!(result, json!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
            assert_eq!(tool.definition().name, "who_am_i");
            assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn test_bad_key_stops_before_delegating() {
        futures::executor::block_on(async {
            let slot = KeySlot::new();
            let inner = Arc::new(WhoAmI {
                slot: slot.clone(),
                calls: AtomicUsize::new(0),
            });
            let tool = WithPrivateKey::new(Arc::clone(&inner), Arc::new(StaticKey("0x12")), slot);

            let result = tool.call(json!({})).await;
            assert!(matches!(result, Err(SomniaError::InvalidPrivateKey(_))));
            assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
        });
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            private_key: KEY.to_string(),
        };
        assert!(!format!("{:?}", creds).contains("ac0974"));
    }
}
