//! The agent: owns the credentials, the shared key slot and the chain
//! backend, and hands out its tool set.
//!
//! The language-model loop that decides which tool to call lives outside this
//! crate; only its configuration (model name, API keys, personality) is kept
//! here so a host can pick it up.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, DEFAULT_CHAIN_ID, DEFAULT_NATIVE_SYMBOL, DEFAULT_RPC_URL};
use crate::error::{Result, SomniaError};
use crate::rpc::key_slot::parse_private_key;
use crate::rpc::{ChainBackend, KeySlot, RpcClient};
use crate::tools::{create_tools, CredentialSource, Credentials, Tool};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(skip_serializing)]
    pub private_key: String,
    pub rpc_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
    pub personality_prompt: Option<String>,
    pub chain_id: u64,
    pub native_symbol: String,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("rpc_url", &self.rpc_url)
            .field("model", &self.model)
            .field("personality_prompt", &self.personality_prompt)
            .field("chain_id", &self.chain_id)
            .field("native_symbol", &self.native_symbol)
            .finish_non_exhaustive()
    }
}

/// Agent configuration where every field may be left out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAgentConfig {
    pub private_key: Option<String>,
    pub rpc_url: Option<String>,
    pub model: Option<String>,
    pub open_ai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub personality_prompt: Option<String>,
    pub chain_id: Option<u64>,
    pub native_symbol: Option<String>,
}

impl AgentConfig {
    /// Fill defaults for everything but the private key, which is required.
    pub fn from_partial(partial: PartialAgentConfig) -> Result<Self> {
        let private_key = partial
            .private_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SomniaError::ConfigError("privateKey is required in config".to_string()))?;

        Ok(AgentConfig {
            private_key,
            rpc_url: partial.rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            model: partial.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_api_key: partial.open_ai_api_key,
            anthropic_api_key: partial.anthropic_api_key,
            personality_prompt: partial.personality_prompt,
            chain_id: partial.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
            native_symbol: partial
                .native_symbol
                .unwrap_or_else(|| DEFAULT_NATIVE_SYMBOL.to_string()),
        })
    }

    /// Build from server configuration; `PRIVATE_KEY` must be set.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_partial(PartialAgentConfig {
            private_key: config.private_key.clone(),
            rpc_url: Some(config.rpc_url.clone()),
            open_ai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            chain_id: Some(config.chain_id),
            native_symbol: Some(config.native_symbol.clone()),
            ..Default::default()
        })
    }
}

pub struct SomniaAgent {
    config: AgentConfig,
    address: Address,
    key_slot: KeySlot,
    backend: Arc<dyn ChainBackend>,
}

impl SomniaAgent {
    /// Agent talking to `config.rpc_url` through alloy.
    pub fn new(config: AgentConfig) -> Result<Self> {
        let key_slot = KeySlot::new();
        let client = RpcClient::new(&config.rpc_url, key_slot.clone())?;
        Self::with_backend(config, key_slot, Arc::new(client))
    }

    /// Agent over an arbitrary backend sharing `key_slot`.
    pub fn with_backend(
        config: AgentConfig,
        key_slot: KeySlot,
        backend: Arc<dyn ChainBackend>,
    ) -> Result<Self> {
        // Fail fast on a malformed key instead of at the first tool call.
        let address = parse_private_key(&config.private_key)?.address();
        info!(
            address = %address,
            chain_id = config.chain_id,
            model = %config.model,
            "Somnia agent initialized",
        );

        Ok(SomniaAgent {
            config,
            address,
            key_slot,
            backend,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The agent's own wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn key_slot(&self) -> &KeySlot {
        &self.key_slot
    }

    /// All tools, each injecting this agent's key before it runs.
    pub fn tools(self: &Arc<Self>) -> Vec<Arc<dyn Tool>> {
        create_tools(
            Arc::clone(&self.backend),
            self.key_slot.clone(),
            Arc::clone(self) as Arc<dyn CredentialSource>,
            &self.config.native_symbol,
        )
    }
}

/// Agent for test harnesses: defaults for everything but the key.
pub fn create_test_agent(partial: PartialAgentConfig) -> Result<SomniaAgent> {
    SomniaAgent::new(AgentConfig::from_partial(partial)?)
}

impl CredentialSource for SomniaAgent {
    fn credentials(&self) -> Credentials {
        Credentials {
            private_key: self.config.private_key.clone(),
        }
    }
}
